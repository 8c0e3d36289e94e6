//! trace - frames already classified by a dissection driver, in capture order

use anyhow::{Context, Result, ensure};
use capture::{Frame, FrameNum};
use hci::{Adapter, HciEvent};
use pdcp::{Direction, KeyType, Plane, UeId};
use security::{CipheringAlgorithm, IntegrityAlgorithm, KEY_LEN};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use slog::{Logger, error, info};
use std::fs;
use std::time::Duration;

/// One thing the driver found in a frame.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FrameInput {
    Hci {
        #[serde(default)]
        adapter: Adapter,
        event: HciEvent,
    },
    Pdcp {
        ue: UeId,
        plane: Plane,
        channel: u8,
        direction: Direction,
        // Falls back to the configured default for the plane.
        sn_length: Option<u8>,
        #[serde(with = "hex")]
        pdu: Vec<u8>,
    },
    SecurityConfigured {
        ue: UeId,
        #[serde(deserialize_with = "ciphering_algorithm")]
        ciphering: CipheringAlgorithm,
        #[serde(deserialize_with = "integrity_algorithm")]
        integrity: IntegrityAlgorithm,
    },
    SecurityConfigurationFailed {
        ue: UeId,
    },
    KeySignalled {
        ue: UeId,
        key_type: KeyType,
        #[serde(with = "hex")]
        key: [u8; KEY_LEN],
    },
}

/// An algorithm given by name ("nea2") or by the identifier as signalled (2).
#[derive(Deserialize)]
#[serde(untagged)]
enum AlgorithmField<T> {
    Name(T),
    Id(u8),
}

fn ciphering_algorithm<'de, D: Deserializer<'de>>(d: D) -> Result<CipheringAlgorithm, D::Error> {
    match AlgorithmField::deserialize(d)? {
        AlgorithmField::Name(algorithm) => Ok(algorithm),
        AlgorithmField::Id(id) => CipheringAlgorithm::from_id(id).map_err(D::Error::custom),
    }
}

fn integrity_algorithm<'de, D: Deserializer<'de>>(d: D) -> Result<IntegrityAlgorithm, D::Error> {
    match AlgorithmField::deserialize(d)? {
        AlgorithmField::Name(algorithm) => Ok(algorithm),
        AlgorithmField::Id(id) => IntegrityAlgorithm::from_id(id).map_err(D::Error::custom),
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub num: FrameNum,
    #[serde(default)]
    pub time_us: u64,
    #[serde(rename = "input", default)]
    pub inputs: Vec<FrameInput>,
}

impl TraceFrame {
    pub fn frame(&self, visited: bool) -> Frame {
        Frame::new(self.num, Duration::from_micros(self.time_us), visited)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    #[serde(rename = "frame", default)]
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn load(filename: &str, logger: &Logger) -> Result<Self> {
        let contents = fs::read_to_string(filename).inspect_err(|e| {
            error!(logger, "Failed to load trace file {filename} with error code {e}")
        })?;
        let trace = Self::parse(&contents).with_context(|| format!("Bad trace file {filename}"))?;
        info!(
            logger,
            "Loaded {} frames from {filename}",
            trace.frames.len()
        );
        Ok(trace)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let trace: Trace = toml::from_str(contents)?;
        ensure!(
            trace.frames.windows(2).all(|w| w[0].num < w[1].num),
            "Frame numbers must increase"
        );
        Ok(trace)
    }
}
