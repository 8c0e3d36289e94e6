//! pipeline - deciphering and integrity verification of one PDCP data PDU

use crate::keys::{KeyType, SessionKeys};
use crate::security_context::ResolvedSecurity;
use crate::{Direction, MAC_I_LEN, Plane};
use security::{
    AlgorithmInput, AlgorithmRegistry, CipheringAlgorithm, IntegrityAlgorithm, SecurityError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityVerdict {
    Verified {
        mac: [u8; MAC_I_LEN],
    },
    Mismatch {
        computed: [u8; MAC_I_LEN],
        received: [u8; MAC_I_LEN],
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityOutcome {
    /// Deciphered payload, without the MAC-I.  None when the PDU was not
    /// deciphered, including when it was sent in the clear.
    pub deciphered: Option<Vec<u8>>,
    pub integrity: Option<IntegrityVerdict>,
}

/// Why the payload was left as it is on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Skipped {
    AwaitingHandshake,
    MissingKey(KeyType),
    Algorithm(SecurityError),
}

/// The per-PDU inputs.
pub(crate) struct ProtectedPdu<'a> {
    pub plane: Plane,
    pub channel_id: u8,
    pub direction: Direction,
    pub count: u32,
    pub header: &'a [u8],
    /// Everything after the header, including any MAC-I.
    pub body: &'a [u8],
}

impl ProtectedPdu<'_> {
    fn algorithm_input(&self) -> AlgorithmInput {
        // TS 38.323, 5.8: BEARER is the radio bearer identity minus one.
        AlgorithmInput {
            count: self.count,
            bearer: self.channel_id.saturating_sub(1),
            direction: self.direction as u8,
        }
    }
}

/// Decipher and check a PDU.  Nothing here fails: a missing key or algorithm
/// leaves the payload alone and omits the integrity check.
pub(crate) fn unprotect(
    registry: &AlgorithmRegistry,
    resolved: &ResolvedSecurity,
    keys: &SessionKeys,
    pdu: &ProtectedPdu,
) -> (SecurityOutcome, Option<Skipped>) {
    let mut outcome = SecurityOutcome::default();
    let input = pdu.algorithm_input();
    let ciphering = resolved.algorithms.ciphering;

    let cipher_key_type = match pdu.plane {
        Plane::Signalling => KeyType::SignallingCipher,
        Plane::User => KeyType::UserCipher,
    };

    let skipped = if ciphering == CipheringAlgorithm::Nea0 {
        None
    } else if !resolved.seen_next_uplink_pdu {
        // The handshake PDU still goes out under the old configuration.
        Some(Skipped::AwaitingHandshake)
    } else {
        let Some(key) = keys.get(cipher_key_type) else {
            return (outcome, Some(Skipped::MissingKey(cipher_key_type)));
        };
        let mut data = pdu.body.to_vec();
        if let Err(e) = registry
            .cipher(ciphering)
            .and_then(|cipher| cipher.decrypt(key, input, &mut data))
        {
            return (outcome, Some(Skipped::Algorithm(e)));
        }
        outcome.deciphered = Some(data);
        None
    };

    let plaintext = outcome.deciphered.as_deref().unwrap_or(pdu.body);
    outcome.integrity = check_integrity(registry, resolved, keys, pdu, input, plaintext);
    if let (Plane::Signalling, Some(data)) = (pdu.plane, outcome.deciphered.as_mut()) {
        data.truncate(data.len().saturating_sub(MAC_I_LEN));
    }
    (outcome, skipped)
}

// TS 33.401, B.2: the MAC covers the header and the plaintext data part.
fn check_integrity(
    registry: &AlgorithmRegistry,
    resolved: &ResolvedSecurity,
    keys: &SessionKeys,
    pdu: &ProtectedPdu,
    input: AlgorithmInput,
    plaintext: &[u8],
) -> Option<IntegrityVerdict> {
    let integrity = resolved.algorithms.integrity;
    if pdu.plane != Plane::Signalling || integrity == IntegrityAlgorithm::Nia0 {
        return None;
    }
    let key = keys.get(KeyType::SignallingIntegrity)?;
    let split = plaintext.len().checked_sub(MAC_I_LEN)?;
    let (data, mac_i) = plaintext.split_at(split);
    let mut received = [0u8; MAC_I_LEN];
    received.copy_from_slice(mac_i);

    let mut message = pdu.header.to_vec();
    message.extend_from_slice(data);
    let computed = registry
        .mac(integrity)
        .and_then(|mac| mac.compute(key, input, &message))
        .ok()?;

    Some(if computed == received {
        IntegrityVerdict::Verified { mac: computed }
    } else {
        IntegrityVerdict::Mismatch { computed, received }
    })
}
