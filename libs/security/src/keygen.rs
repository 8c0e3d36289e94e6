//! keygen - derivation of the access stratum keys from KeNB / KgNB

use crate::{CipheringAlgorithm, IntegrityAlgorithm, KEY_LEN};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Which key hierarchy the base key belongs to.  It selects the FC value of
/// the algorithm key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHierarchy {
    /// KeNB, TS33.401 A.7
    Eps,
    /// KgNB, TS33.501 A.8
    FiveG,
}

impl KeyHierarchy {
    fn fc(self) -> u8 {
        match self {
            KeyHierarchy::Eps => 0x15,
            KeyHierarchy::FiveG => 0x69,
        }
    }
}

// Algorithm type distinguishers, TS33.401 table A.7-1 / TS33.501 table A.8-1.
const RRC_ENC_ALG: u8 = 0x03;
const RRC_INT_ALG: u8 = 0x04;
const UP_ENC_ALG: u8 = 0x05;

/// The access stratum keys derived from one base key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsKeys {
    pub rrc_enc: [u8; KEY_LEN],
    pub rrc_int: [u8; KEY_LEN],
    pub up_enc: [u8; KEY_LEN],
}

pub fn derive_as_keys(
    hierarchy: KeyHierarchy,
    base_key: &[u8; 32],
    ciphering: CipheringAlgorithm,
    integrity: IntegrityAlgorithm,
) -> AsKeys {
    AsKeys {
        rrc_enc: derive_algorithm_key(hierarchy, base_key, RRC_ENC_ALG, ciphering as u8),
        rrc_int: derive_algorithm_key(hierarchy, base_key, RRC_INT_ALG, integrity as u8),
        up_enc: derive_algorithm_key(hierarchy, base_key, UP_ENC_ALG, ciphering as u8),
    }
}

fn derive_algorithm_key(
    hierarchy: KeyHierarchy,
    input_key: &[u8; 32],
    algorithm_type_distinguisher: u8,
    algorithm_identity: u8,
) -> [u8; KEY_LEN] {
    // HMAC-SHA-256 accepts keys of any length.
    let mut k = HmacSha256::new_from_slice(input_key).expect("Can't fail");
    k.update(&[hierarchy.fc()]); // FC
    k.update(&[algorithm_type_distinguisher]); // P0 = algorithm type distinguisher
    k.update(&[0x00, 0x01]); // L0 = length of algorithm type distinguisher = 0x00 0x01
    k.update(&[algorithm_identity]); // P1 = algorithm identity
    k.update(&[0x00, 0x01]); // L1 = length of algorithm identity

    // TS33.220, B.2.0: "For an algorithm key of length n bits, where n is less or equal to 256, the n least significant bits
    // of the 256 bits of the KDF output shall be used as the algorithm key."
    let output = k.finalize().into_bytes();
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&output[16..32]);
    key
}
