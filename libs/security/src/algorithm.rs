use crate::{KEY_LEN, MAC_LEN};
use serde::Deserialize;

/// Ciphering algorithm identifier.  The 128-NEA algorithms are the same
/// functions as the LTE 128-EEA algorithms (TS33.501, D.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum CipheringAlgorithm {
    #[default]
    Nea0 = 0,
    Nea1 = 1,
    Nea2 = 2,
    Nea3 = 3,
}

/// Integrity algorithm identifier.  The 128-NIA algorithms are the same
/// functions as the LTE 128-EIA algorithms (TS33.501, D.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityAlgorithm {
    #[default]
    Nia0 = 0,
    Nia1 = 1,
    Nia2 = 2,
    Nia3 = 3,
}

impl CipheringAlgorithm {
    /// From the 4 bit algorithm identifier carried in signalling (TS33.501, 5.11.1.1).
    pub fn from_id(id: u8) -> Result<Self, SecurityError> {
        Ok(match id {
            0 => CipheringAlgorithm::Nea0,
            1 => CipheringAlgorithm::Nea1,
            2 => CipheringAlgorithm::Nea2,
            3 => CipheringAlgorithm::Nea3,
            _ => return Err(SecurityError::InvalidAlgorithmId(id)),
        })
    }
}

impl IntegrityAlgorithm {
    pub fn from_id(id: u8) -> Result<Self, SecurityError> {
        Ok(match id {
            0 => IntegrityAlgorithm::Nia0,
            1 => IntegrityAlgorithm::Nia1,
            2 => IntegrityAlgorithm::Nia2,
            3 => IntegrityAlgorithm::Nia3,
            _ => return Err(SecurityError::InvalidAlgorithmId(id)),
        })
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Ciphering algorithm {0:?} not available")]
    UnsupportedCipher(CipheringAlgorithm),
    #[error("Integrity algorithm {0:?} not available")]
    UnsupportedIntegrity(IntegrityAlgorithm),
    #[error("Invalid key length {0}")]
    InvalidKeyLength(usize),
    #[error("Unknown algorithm identifier {0}")]
    InvalidAlgorithmId(u8),
}

/// The per-message inputs common to the ciphering and integrity algorithms
/// (TS33.401, B.1.1 and B.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmInput {
    pub count: u32,
    pub bearer: u8,
    pub direction: u8,
}

/// A stream cipher.  Ciphering and deciphering both XOR in the keystream.
pub trait Cipher: Send + Sync {
    fn apply_keystream(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        data: &mut [u8],
    ) -> Result<(), SecurityError>;

    fn encrypt(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        data: &mut [u8],
    ) -> Result<(), SecurityError> {
        self.apply_keystream(key, input, data)
    }

    fn decrypt(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        data: &mut [u8],
    ) -> Result<(), SecurityError> {
        self.apply_keystream(key, input, data)
    }
}

pub trait Mac: Send + Sync {
    fn compute(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        message: &[u8],
    ) -> Result<[u8; MAC_LEN], SecurityError>;
}

/// NEA0, null ciphering.
pub struct Nea0;

impl Cipher for Nea0 {
    fn apply_keystream(
        &self,
        _key: &[u8; KEY_LEN],
        _input: AlgorithmInput,
        _data: &mut [u8],
    ) -> Result<(), SecurityError> {
        Ok(())
    }
}

/// NIA0, null integrity.  The MAC is 32 zero bits (TS33.401, 5.1.4.1).
pub struct Nia0;

impl Mac for Nia0 {
    fn compute(
        &self,
        _key: &[u8; KEY_LEN],
        _input: AlgorithmInput,
        _message: &[u8],
    ) -> Result<[u8; MAC_LEN], SecurityError> {
        Ok([0u8; MAC_LEN])
    }
}
