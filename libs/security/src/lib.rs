//! security - AS ciphering and integrity algorithms and key derivation

mod algorithm;
pub mod keygen;
pub mod nea2;
pub mod nia2;
mod registry;

pub use algorithm::{
    AlgorithmInput, Cipher, CipheringAlgorithm, IntegrityAlgorithm, Mac, Nea0, Nia0,
    SecurityError,
};
pub use registry::AlgorithmRegistry;

pub const KEY_LEN: usize = 16;
pub const MAC_LEN: usize = 4;
