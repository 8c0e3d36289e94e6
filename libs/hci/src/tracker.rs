use crate::{
    Adapter, ChannelKey, ChannelTable, CommandCorrelator, Correlation, EVENT_LE_META, LinkType,
    OpcodeKey, OpcodeStatus, PacketTypeView, STATUS_SUCCESS, implied_opcode, packet_type_view,
};
use capture::{FirstVisit, Frame};
use serde::Deserialize;
use slog::{Logger, debug};

/// What the driver's leaf decoders extracted from an HCI packet.  Only the
/// fields that drive connection tracking and correlation are carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HciEvent {
    /// Host to controller command packet.
    Command { opcode: u16 },
    CommandStatus { opcode: u16, status: u8 },
    CommandComplete { opcode: u16 },
    ConnectionComplete { status: u8, handle: u16, link_type: u8 },
    DisconnectionComplete { status: u8, handle: u16 },
    ConnectionPacketTypeChanged { status: u8, handle: u16, packet_type: u16 },
    SynchronousConnectionComplete { status: u8, handle: u16, link_type: u8 },
    LeConnectionComplete { status: u8, handle: u16 },
    LeEnhancedConnectionComplete { status: u8, handle: u16 },
    CisEstablished { status: u8, handle: u16 },
    Other { code: u8, le_subevent: Option<u8> },
}

impl HciEvent {
    /// Event code and LE subevent code.  None for command packets.
    pub fn event_code(&self) -> Option<(u8, Option<u8>)> {
        Some(match *self {
            HciEvent::Command { .. } => return None,
            HciEvent::CommandStatus { .. } => (0x0f, None),
            HciEvent::CommandComplete { .. } => (0x0e, None),
            HciEvent::ConnectionComplete { .. } => (0x03, None),
            HciEvent::DisconnectionComplete { .. } => (0x05, None),
            HciEvent::ConnectionPacketTypeChanged { .. } => (0x1d, None),
            HciEvent::SynchronousConnectionComplete { .. } => (0x2c, None),
            HciEvent::LeConnectionComplete { .. } => (EVENT_LE_META, Some(0x01)),
            HciEvent::LeEnhancedConnectionComplete { .. } => (EVENT_LE_META, Some(0x0a)),
            HciEvent::CisEstablished { .. } => (EVENT_LE_META, Some(0x19)),
            HciEvent::Other { code, le_subevent } => (code, le_subevent),
        })
    }

    fn handle(&self) -> Option<u16> {
        match *self {
            HciEvent::ConnectionComplete { handle, .. }
            | HciEvent::DisconnectionComplete { handle, .. }
            | HciEvent::ConnectionPacketTypeChanged { handle, .. }
            | HciEvent::SynchronousConnectionComplete { handle, .. }
            | HciEvent::LeConnectionComplete { handle, .. }
            | HciEvent::LeEnhancedConnectionComplete { handle, .. }
            | HciEvent::CisEstablished { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// The opcode occurrences this packet records for correlation.
    fn occurrences(&self) -> Vec<(u16, OpcodeStatus)> {
        match *self {
            HciEvent::Command { .. } => vec![],
            // Opcode 0x0000 only returns command credits to the host.
            HciEvent::CommandStatus { opcode: 0, .. } | HciEvent::CommandComplete { opcode: 0 } => {
                vec![]
            }
            HciEvent::CommandStatus { opcode, status } => {
                let status = if status == STATUS_SUCCESS {
                    OpcodeStatus::Pending
                } else {
                    OpcodeStatus::Result
                };
                vec![(opcode, status)]
            }
            HciEvent::CommandComplete { opcode } => vec![(opcode, OpcodeStatus::Result)],
            _ => self
                .event_code()
                .and_then(|(code, sub)| implied_opcode(code, sub))
                .map(|opcode| (opcode, OpcodeStatus::Normal))
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HciAnnotations {
    pub correlations: Vec<Correlation>,

    // Link type of the connection the packet refers to, as of this frame.
    pub link_type: Option<(u16, LinkType)>,

    pub packet_type: Option<PacketTypeView>,
}

/// Connection lifecycle and command correlation state for every adapter in
/// one capture.
pub struct HciTracker {
    channels: ChannelTable,
    correlator: CommandCorrelator,
    logger: Logger,
}

impl HciTracker {
    pub fn new(logger: Logger) -> Self {
        HciTracker {
            channels: ChannelTable::new(),
            correlator: CommandCorrelator::new(),
            logger,
        }
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn correlator(&self) -> &CommandCorrelator {
        &self.correlator
    }

    /// Track one HCI packet.  State is updated only on the frame's first
    /// visit; the returned annotations are read back from that state.
    pub fn process(&mut self, frame: &Frame, adapter: Adapter, event: &HciEvent) -> HciAnnotations {
        if let Some(visit) = frame.first_visit() {
            self.record(&visit, adapter, event);
        }
        self.annotate(frame, adapter, event)
    }

    fn record(&mut self, visit: &FirstVisit, adapter: Adapter, event: &HciEvent) {
        let logger = &self.logger;
        match *event {
            HciEvent::Command { opcode } => {
                self.correlator
                    .record_command(visit, OpcodeKey::new(adapter, opcode), logger);
            }
            HciEvent::ConnectionComplete {
                status: STATUS_SUCCESS,
                handle,
                link_type,
            }
            | HciEvent::SynchronousConnectionComplete {
                status: STATUS_SUCCESS,
                handle,
                link_type,
            } => self.channels.record_open(
                visit,
                ChannelKey::new(adapter, handle),
                LinkType::from_br_edr(link_type),
                logger,
            ),
            HciEvent::LeConnectionComplete {
                status: STATUS_SUCCESS,
                handle,
            }
            | HciEvent::LeEnhancedConnectionComplete {
                status: STATUS_SUCCESS,
                handle,
            } => self.channels.record_open(
                visit,
                ChannelKey::new(adapter, handle),
                LinkType::Le,
                logger,
            ),
            HciEvent::CisEstablished {
                status: STATUS_SUCCESS,
                handle,
            } => self.channels.record_open(
                visit,
                ChannelKey::new(adapter, handle),
                LinkType::Iso,
                logger,
            ),
            HciEvent::DisconnectionComplete {
                status: STATUS_SUCCESS,
                handle,
            } => {
                self.channels
                    .record_close(visit, ChannelKey::new(adapter, handle), logger);
            }
            _ => (),
        }

        for (opcode, status) in event.occurrences() {
            self.correlator
                .record_status(visit, OpcodeKey::new(adapter, opcode), status, logger);
        }
    }

    fn annotate(&self, frame: &Frame, adapter: Adapter, event: &HciEvent) -> HciAnnotations {
        let opcodes = match *event {
            HciEvent::Command { opcode } => vec![opcode],
            _ => event.occurrences().into_iter().map(|(op, _)| op).collect(),
        };
        let correlations = opcodes
            .into_iter()
            .filter_map(|opcode| {
                self.correlator
                    .lookup(OpcodeKey::new(adapter, opcode), frame.num)
            })
            .collect();

        let link_type = event.handle().map(|handle| {
            let key = ChannelKey::new(adapter, handle);
            (key.handle, self.channels.link_type_as_of(&key, frame.num))
        });

        let packet_type = match (*event, link_type) {
            (HciEvent::ConnectionPacketTypeChanged { packet_type, .. }, Some((handle, link))) => {
                let view = packet_type_view(packet_type, link);
                if view.is_ambiguous() {
                    debug!(
                        self.logger,
                        "Frame {}: link type of handle {handle:#05x} unknown, packet type ambiguous",
                        frame.num
                    );
                }
                Some(view)
            }
            _ => None,
        };

        HciAnnotations {
            correlations,
            link_type,
            packet_type,
        }
    }
}
