//! hci - connection lifecycle tracking and command/response correlation for
//! Bluetooth HCI captures

mod channel;
mod correlator;
mod implied;
mod packet_type;
mod tracker;

pub use channel::{BrEdrLinkType, ChannelKey, ChannelSession, ChannelTable, LinkType};
pub use correlator::{
    CommandCorrelator, CommandTransaction, Correlation, OpcodeKey, OpcodeStatus, TransactionRole,
};
pub use implied::{EVENT_LE_META, implied_opcode, ocf, ogf};
pub use packet_type::{PacketTypeView, packet_type_view};
pub use tracker::{HciAnnotations, HciEvent, HciTracker};

use serde::Deserialize;

/// One HCI controller as seen by the capture: the capture interface plus the
/// adapter index on that interface.  Handles and opcodes are scoped to this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
pub struct Adapter {
    pub interface_id: u32,
    pub adapter_id: u32,
}

impl Adapter {
    pub fn new(interface_id: u32, adapter_id: u32) -> Self {
        Adapter {
            interface_id,
            adapter_id,
        }
    }
}

/// HCI status code 0x00 (Success).  In a Command Status event it means the
/// command is pending.
pub const STATUS_SUCCESS: u8 = 0x00;
