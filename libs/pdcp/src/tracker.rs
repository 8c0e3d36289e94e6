use crate::header::{PdcpHeader, parse_header};
use crate::keys::{KeyStore, KeyType};
use crate::pipeline::{ProtectedPdu, SecurityOutcome, Skipped, unprotect};
use crate::security_context::{Algorithms, ResolvedSecurity, SecurityContexts};
use crate::sequence::{SequenceReport, SequenceTracker};
use crate::{Direction, IntegrityVerdict, Plane, SequenceChannelKey, SnLength, UeId};
use anyhow::Result;
use capture::Frame;
use security::{AlgorithmRegistry, KEY_LEN};
use slog::{Logger, debug, info, warn};

/// What the driver knows about a PDU before handing it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduContext {
    pub ue_id: UeId,
    pub plane: Plane,
    pub channel_id: u8,
    pub direction: Direction,
    pub sn_length: SnLength,
}

impl PduContext {
    pub fn channel(&self) -> SequenceChannelKey {
        SequenceChannelKey {
            ue_id: self.ue_id,
            plane: self.plane,
            channel_id: self.channel_id,
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdcpAnnotations {
    pub header: PdcpHeader,
    pub sequence: Option<SequenceReport>,
    pub security: Option<ResolvedSecurity>,
    pub outcome: SecurityOutcome,
}

/// Sequence and security tracking for all UEs of a capture.
#[derive(Debug)]
pub struct PdcpTracker {
    sequences: SequenceTracker,
    security: SecurityContexts,
    keys: KeyStore,
    registry: AlgorithmRegistry,
    logger: Logger,
}

impl PdcpTracker {
    pub fn new(defaults: Algorithms, logger: Logger) -> Self {
        Self::with_registry(defaults, AlgorithmRegistry::with_builtin(), logger)
    }

    pub fn with_registry(defaults: Algorithms, registry: AlgorithmRegistry, logger: Logger) -> Self {
        PdcpTracker {
            sequences: SequenceTracker::new(),
            security: SecurityContexts::new(defaults),
            keys: KeyStore::new(),
            registry,
            logger,
        }
    }

    pub fn sequences(&self) -> &SequenceTracker {
        &self.sequences
    }

    pub fn security(&self) -> &SecurityContexts {
        &self.security
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut KeyStore {
        &mut self.keys
    }

    pub fn security_configured(&mut self, frame: &Frame, ue_id: UeId, algorithms: Algorithms) {
        if let Some(visit) = frame.first_visit() {
            self.security
                .configure(&visit, ue_id, algorithms, &self.logger);
        }
    }

    pub fn security_configuration_failed(&mut self, frame: &Frame, ue_id: UeId) {
        if let Some(visit) = frame.first_visit() {
            self.security
                .configuration_failed(&visit, ue_id, &self.logger);
        }
    }

    pub fn key_signalled(
        &mut self,
        frame: &Frame,
        ue_id: UeId,
        key_type: KeyType,
        key: [u8; KEY_LEN],
    ) {
        if let Some(visit) = frame.first_visit() {
            self.keys.record(&visit, ue_id, key_type, key, &self.logger);
        }
    }

    /// Analyze one PDU.  State only moves on the first visit to the frame.
    /// An error means the header could not be parsed.
    pub fn analyze_pdu(
        &mut self,
        frame: &Frame,
        context: &PduContext,
        pdu: &[u8],
    ) -> Result<PdcpAnnotations> {
        let header = parse_header(context.plane, context.sn_length, pdu)?;
        let PdcpHeader::Data { sn, header_len } = header else {
            return Ok(PdcpAnnotations {
                header,
                sequence: None,
                security: None,
                outcome: SecurityOutcome::default(),
            });
        };
        let channel = context.channel();
        let first_visit = frame.first_visit();

        if let Some(visit) = &first_visit {
            self.sequences
                .analyze(visit, channel, context.sn_length, sn, &self.logger);
            self.security
                .resolve_for_pdu(visit, context.ue_id, context.direction, &self.logger);
        }

        let sequence = self.sequences.report(&channel, sn, frame.num).cloned();
        let resolved = self
            .security
            .resolved(context.ue_id, frame.num)
            .unwrap_or_else(|| self.security.as_of(context.ue_id, frame.num));

        let count = match &sequence {
            Some(report) => report.count(context.sn_length),
            None => self
                .sequences
                .hfn(&channel)
                .unwrap_or(0)
                .wrapping_mul(context.sn_length.modulo())
                .wrapping_add(sn),
        };

        let keys = self
            .keys
            .resolve(context.ue_id, frame.num, resolved.algorithms);
        let (outcome, skipped) = unprotect(
            &self.registry,
            &resolved,
            &keys,
            &ProtectedPdu {
                plane: context.plane,
                channel_id: context.channel_id,
                direction: context.direction,
                count,
                header: &pdu[..header_len],
                body: &pdu[header_len..],
            },
        );

        if first_visit.is_some() {
            self.log_outcome(frame, context, &outcome, skipped);
        }

        Ok(PdcpAnnotations {
            header,
            sequence,
            security: Some(resolved),
            outcome,
        })
    }

    fn log_outcome(
        &self,
        frame: &Frame,
        context: &PduContext,
        outcome: &SecurityOutcome,
        skipped: Option<Skipped>,
    ) {
        let ue_id = context.ue_id;
        match skipped {
            Some(Skipped::AwaitingHandshake) => debug!(
                self.logger,
                "UE {ue_id} frame {} not deciphered, awaiting first uplink PDU after reconfiguration",
                frame.num
            ),
            Some(Skipped::MissingKey(key_type)) => info!(
                self.logger,
                "UE {ue_id} frame {} not deciphered, no {:?} key", frame.num, key_type
            ),
            Some(Skipped::Algorithm(e)) => info!(
                self.logger,
                "UE {ue_id} frame {} not deciphered - {e}", frame.num
            ),
            None => (),
        }
        if let Some(IntegrityVerdict::Mismatch { computed, received }) = outcome.integrity {
            warn!(
                self.logger,
                "UE {ue_id} frame {} MAC-I mismatch, computed {:02x?} received {:02x?}",
                frame.num,
                computed,
                received
            );
        }
    }
}
