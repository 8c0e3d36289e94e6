use crate::UeId;
use crate::security_context::Algorithms;
use capture::{FirstVisit, FrameNum};
use security::KEY_LEN;
use security::keygen::{KeyHierarchy, derive_as_keys};
use serde::Deserialize;
use slog::{Logger, debug};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyType {
    SignallingCipher,
    SignallingIntegrity,
    UserCipher,
}

/// The keys in effect for a UE.  Any of them may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionKeys {
    pub signalling_cipher: Option<[u8; KEY_LEN]>,
    pub signalling_integrity: Option<[u8; KEY_LEN]>,
    pub user_cipher: Option<[u8; KEY_LEN]>,
}

impl SessionKeys {
    pub fn get(&self, key_type: KeyType) -> Option<&[u8; KEY_LEN]> {
        match key_type {
            KeyType::SignallingCipher => self.signalling_cipher.as_ref(),
            KeyType::SignallingIntegrity => self.signalling_integrity.as_ref(),
            KeyType::UserCipher => self.user_cipher.as_ref(),
        }
    }

    fn slot_mut(&mut self, key_type: KeyType) -> &mut Option<[u8; KEY_LEN]> {
        match key_type {
            KeyType::SignallingCipher => &mut self.signalling_cipher,
            KeyType::SignallingIntegrity => &mut self.signalling_integrity,
            KeyType::UserCipher => &mut self.user_cipher,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.signalling_cipher.is_some()
            && self.signalling_integrity.is_some()
            && self.user_cipher.is_some()
    }

    // Fill the unknown keys from `other`.
    fn or(self, other: SessionKeys) -> SessionKeys {
        SessionKeys {
            signalling_cipher: self.signalling_cipher.or(other.signalling_cipher),
            signalling_integrity: self.signalling_integrity.or(other.signalling_integrity),
            user_cipher: self.user_cipher.or(other.user_cipher),
        }
    }
}

/// Keys supplied by configuration rather than learned from the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfiguredKeys {
    pub explicit: SessionKeys,

    /// KeNB or KgNB from which missing keys are derived for the algorithms in
    /// force.
    pub base_key: Option<([u8; 32], KeyHierarchy)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyEntry {
    key_type: KeyType,
    key: [u8; KEY_LEN],
    setup_frame: FrameNum,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyStore {
    // In capture order.
    signalled: HashMap<UeId, Vec<KeyEntry>>,
    configured: HashMap<UeId, ConfiguredKeys>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_configured(&mut self, ue_id: UeId, keys: ConfiguredKeys) {
        self.configured.insert(ue_id, keys);
    }

    pub fn configured(&self, ue_id: UeId) -> Option<&ConfiguredKeys> {
        self.configured.get(&ue_id)
    }

    /// Record a key learned from signalling.  It applies to frames after this one.
    pub fn record(
        &mut self,
        visit: &FirstVisit,
        ue_id: UeId,
        key_type: KeyType,
        key: [u8; KEY_LEN],
        logger: &Logger,
    ) {
        debug!(
            logger,
            "UE {ue_id} {:?} key set up in frame {}",
            key_type,
            visit.frame()
        );
        self.signalled.entry(ue_id).or_default().push(KeyEntry {
            key_type,
            key,
            setup_frame: visit.frame(),
        });
    }

    /// Signalled keys in effect at `frame`: the newest of each type set up
    /// strictly before it.
    pub fn signalled_as_of(&self, ue_id: UeId, frame: FrameNum) -> SessionKeys {
        let mut keys = SessionKeys::default();
        let Some(entries) = self.signalled.get(&ue_id) else {
            return keys;
        };
        for entry in entries.iter().rev().filter(|e| e.setup_frame < frame) {
            let slot = keys.slot_mut(entry.key_type);
            if slot.is_none() {
                *slot = Some(entry.key);
            }
            if keys.is_complete() {
                break;
            }
        }
        keys
    }

    /// Keys in effect at `frame`.  Signalled keys take precedence over
    /// configured ones, which take precedence over derived ones.
    pub fn resolve(&self, ue_id: UeId, frame: FrameNum, algorithms: Algorithms) -> SessionKeys {
        let keys = self.signalled_as_of(ue_id, frame);
        if keys.is_complete() {
            return keys;
        }
        let Some(configured) = self.configured.get(&ue_id) else {
            return keys;
        };
        let keys = keys.or(configured.explicit);
        match configured.base_key {
            Some((base_key, hierarchy)) if !keys.is_complete() => {
                let derived = derive_as_keys(
                    hierarchy,
                    &base_key,
                    algorithms.ciphering,
                    algorithms.integrity,
                );
                keys.or(SessionKeys {
                    signalling_cipher: Some(derived.rrc_enc),
                    signalling_integrity: Some(derived.rrc_int),
                    user_cipher: Some(derived.up_enc),
                })
            }
            _ => keys,
        }
    }
}
