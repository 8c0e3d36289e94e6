use crate::{Direction, UeId};
use capture::{FirstVisit, FrameHistory, FrameNum};
use security::{CipheringAlgorithm, IntegrityAlgorithm};
use slog::{Logger, debug, info};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Algorithms {
    pub ciphering: CipheringAlgorithm,
    pub integrity: IntegrityAlgorithm,
}

/// The security configuration signalled for a UE in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecuritySnapshot {
    pub configuration_frame: FrameNum,
    pub algorithms: Algorithms,

    // First uplink PDU after the configuration.  That PDU completes the
    // reconfiguration handshake; ciphering takes effect after it.
    pub first_uplink_pdu: Option<FrameNum>,

    // Frame of the configuration failure that withdrew this snapshot.
    pub withdrawn_in: Option<FrameNum>,
}

impl SecuritySnapshot {
    fn in_force_at(&self, frame: FrameNum) -> bool {
        self.configuration_frame <= frame && self.withdrawn_in.is_none_or(|w| w > frame)
    }
}

/// The security configuration that applies to one PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSecurity {
    pub algorithms: Algorithms,

    // None when no configuration was signalled and the defaults apply.
    pub configuration_frame: Option<FrameNum>,

    pub seen_next_uplink_pdu: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityContexts {
    defaults: Algorithms,
    snapshots: HashMap<UeId, FrameHistory<SecuritySnapshot>>,
    per_frame: HashMap<(FrameNum, UeId), ResolvedSecurity>,
}

impl SecurityContexts {
    pub fn new(defaults: Algorithms) -> Self {
        SecurityContexts {
            defaults,
            ..Default::default()
        }
    }

    pub fn defaults(&self) -> Algorithms {
        self.defaults
    }

    pub fn configure(
        &mut self,
        visit: &FirstVisit,
        ue_id: UeId,
        algorithms: Algorithms,
        logger: &Logger,
    ) {
        let frame = visit.frame();
        debug!(
            logger,
            "UE {ue_id} security configured in frame {frame}: {:?}", algorithms
        );
        self.snapshots.entry(ue_id).or_default().insert(
            frame,
            SecuritySnapshot {
                configuration_frame: frame,
                algorithms,
                first_uplink_pdu: None,
                withdrawn_in: None,
            },
        );
    }

    /// The configuration in force is withdrawn, and the one before it comes
    /// back into force.  The withdrawn snapshot is kept.
    pub fn configuration_failed(&mut self, visit: &FirstVisit, ue_id: UeId, logger: &Logger) -> bool {
        let frame = visit.frame();
        let Some(current) = self
            .snapshot_as_of(ue_id, frame)
            .map(|s| s.configuration_frame)
        else {
            info!(
                logger,
                "UE {ue_id} security configuration failure in frame {frame} with no configuration in force"
            );
            return false;
        };
        if let Some(snapshot) = self
            .snapshots
            .get_mut(&ue_id)
            .and_then(|h| h.get_mut(current))
        {
            snapshot.withdrawn_in = Some(frame);
        }
        debug!(
            logger,
            "UE {ue_id} security configuration of frame {current} withdrawn in frame {frame}"
        );
        true
    }

    pub fn snapshot_as_of(&self, ue_id: UeId, frame: FrameNum) -> Option<&SecuritySnapshot> {
        self.snapshots
            .get(&ue_id)?
            .newest_at_or_before(frame)
            .map(|(_, s)| s)
            .find(|s| s.in_force_at(frame))
    }

    pub fn as_of(&self, ue_id: UeId, frame: FrameNum) -> ResolvedSecurity {
        match self.snapshot_as_of(ue_id, frame) {
            Some(s) => ResolvedSecurity {
                algorithms: s.algorithms,
                configuration_frame: Some(s.configuration_frame),
                seen_next_uplink_pdu: s.first_uplink_pdu.is_some_and(|f| f < frame),
            },
            None => ResolvedSecurity {
                algorithms: self.defaults,
                configuration_frame: None,
                seen_next_uplink_pdu: true,
            },
        }
    }

    /// Resolve and store the configuration for a PDU in this frame.  An uplink
    /// PDU may complete a reconfiguration handshake.
    pub fn resolve_for_pdu(
        &mut self,
        visit: &FirstVisit,
        ue_id: UeId,
        direction: Direction,
        logger: &Logger,
    ) -> ResolvedSecurity {
        let frame = visit.frame();
        if let Some(resolved) = self.per_frame.get(&(frame, ue_id)) {
            return *resolved;
        }
        let resolved = self.as_of(ue_id, frame);

        if let (Direction::Uplink, Some(configuration_frame)) =
            (direction, resolved.configuration_frame)
        {
            if let Some(snapshot) = self
                .snapshots
                .get_mut(&ue_id)
                .and_then(|h| h.get_mut(configuration_frame))
                .filter(|s| s.first_uplink_pdu.is_none() && s.configuration_frame < frame)
            {
                snapshot.first_uplink_pdu = Some(frame);
                debug!(
                    logger,
                    "UE {ue_id} first uplink PDU after security configuration in frame {frame}"
                );
            }
        }

        self.per_frame.insert((frame, ue_id), resolved);
        resolved
    }

    /// The configuration stored for a PDU on its first visit.
    pub fn resolved(&self, ue_id: UeId, frame: FrameNum) -> Option<ResolvedSecurity> {
        self.per_frame.get(&(frame, ue_id)).copied()
    }
}
