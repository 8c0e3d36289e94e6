//! lib - PDCP sequence number analysis, security configuration tracking and
//! deciphering / integrity verification of captured PDUs

mod header;
mod keys;
mod pipeline;
mod security_context;
mod sequence;
mod tracker;
mod tx;

pub use header::{PdcpHeader, encode_data_header, parse_header};
pub use keys::{ConfiguredKeys, KeyStore, KeyType, SessionKeys};
pub use pipeline::{IntegrityVerdict, SecurityOutcome};
pub use security_context::{Algorithms, ResolvedSecurity, SecurityContexts, SecuritySnapshot};
pub use sequence::{REPEAT_WINDOW, SequenceClassification, SequenceReport, SequenceTracker};
pub use tracker::{PdcpAnnotations, PdcpTracker, PduContext};
pub use tx::{PdcpPdu, PdcpTx};

use anyhow::{Result, bail};
use serde::Deserialize;

/// Identifies the UE (or other session endpoint) whose traffic is tracked.
pub type UeId = u16;

const MAC_I_LEN: usize = security::MAC_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// SRBs
    Signalling,
    /// DRBs
    User,
}

/// Values as used for the DIRECTION input of the security algorithms (TS33.401, B.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Uplink = 0,
    Downlink = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnLength {
    Bits5,
    Bits7,
    Bits12,
    Bits15,
    Bits18,
}

impl SnLength {
    pub fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            5 => SnLength::Bits5,
            7 => SnLength::Bits7,
            12 => SnLength::Bits12,
            15 => SnLength::Bits15,
            18 => SnLength::Bits18,
            _ => bail!("Unsupported PDCP SN length {bits}"),
        })
    }

    pub fn bits(self) -> u8 {
        match self {
            SnLength::Bits5 => 5,
            SnLength::Bits7 => 7,
            SnLength::Bits12 => 12,
            SnLength::Bits15 => 15,
            SnLength::Bits18 => 18,
        }
    }

    /// Size of the sequence number space.
    pub fn modulo(self) -> u32 {
        1 << self.bits()
    }
}

/// One direction of one radio bearer of one UE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceChannelKey {
    pub ue_id: UeId,
    pub plane: Plane,
    pub channel_id: u8,
    pub direction: Direction,
}
