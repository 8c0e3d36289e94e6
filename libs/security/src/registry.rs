use crate::nea2::Nea2;
use crate::nia2::Nia2;
use crate::{Cipher, CipheringAlgorithm, IntegrityAlgorithm, Mac, Nea0, Nia0, SecurityError};
use std::collections::HashMap;
use std::fmt;

/// The algorithm implementations available to the analyzer.  An algorithm
/// that is not registered is a normal condition: its traffic is left as is.
pub struct AlgorithmRegistry {
    ciphers: HashMap<CipheringAlgorithm, Box<dyn Cipher>>,
    macs: HashMap<IntegrityAlgorithm, Box<dyn Mac>>,
}

impl AlgorithmRegistry {
    pub fn empty() -> Self {
        AlgorithmRegistry {
            ciphers: HashMap::new(),
            macs: HashMap::new(),
        }
    }

    /// The null algorithms and the AES based ones.  SNOW 3G (NEA1/NIA1) and
    /// ZUC (NEA3/NIA3) are not built in.
    pub fn with_builtin() -> Self {
        let mut r = Self::empty();
        r.register_cipher(CipheringAlgorithm::Nea0, Box::new(Nea0));
        r.register_cipher(CipheringAlgorithm::Nea2, Box::new(Nea2));
        r.register_mac(IntegrityAlgorithm::Nia0, Box::new(Nia0));
        r.register_mac(IntegrityAlgorithm::Nia2, Box::new(Nia2));
        r
    }

    pub fn register_cipher(&mut self, algorithm: CipheringAlgorithm, cipher: Box<dyn Cipher>) {
        self.ciphers.insert(algorithm, cipher);
    }

    pub fn register_mac(&mut self, algorithm: IntegrityAlgorithm, mac: Box<dyn Mac>) {
        self.macs.insert(algorithm, mac);
    }

    pub fn cipher(&self, algorithm: CipheringAlgorithm) -> Result<&dyn Cipher, SecurityError> {
        self.ciphers
            .get(&algorithm)
            .map(Box::as_ref)
            .ok_or(SecurityError::UnsupportedCipher(algorithm))
    }

    pub fn mac(&self, algorithm: IntegrityAlgorithm) -> Result<&dyn Mac, SecurityError> {
        self.macs
            .get(&algorithm)
            .map(Box::as_ref)
            .ok_or(SecurityError::UnsupportedIntegrity(algorithm))
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("ciphers", &self.ciphers.keys().collect::<Vec<_>>())
            .field("macs", &self.macs.keys().collect::<Vec<_>>())
            .finish()
    }
}
