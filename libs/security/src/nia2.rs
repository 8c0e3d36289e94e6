use crate::{AlgorithmInput, KEY_LEN, MAC_LEN, Mac, SecurityError};
use aes::Aes128;
use cmac::{Cmac, Mac as _};

/// 128-NIA2, AES in CMAC mode.
pub struct Nia2;

impl Mac for Nia2 {
    fn compute(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        message: &[u8],
    ) -> Result<[u8; MAC_LEN], SecurityError> {
        calculate_nia2_mac(
            key,
            input.count.to_be_bytes(),
            input.bearer,
            input.direction,
            message,
        )
    }
}

// TS33.401, B.2.3
pub fn calculate_nia2_mac(
    integrity_key: &[u8; KEY_LEN],
    count: [u8; 4],
    bearer_identity_5bit: u8,
    direction_1bit: u8,
    message: &[u8],
) -> Result<[u8; MAC_LEN], SecurityError> {
    /*
    The input to CMAC mode is a bit string M of length Mlen (see [17, clause 5.5]). M is constructed as follows:
    M0 .. M31 = COUNT[0] .. COUNT[31]
    M32 .. M36 = BEARER[0] .. BEARER[4]
    M37 = DIRECTION
    M38 .. M63 = 026  (i.e. 26 zero bits)
    M64 .. MBLENGTH+63 = MESSAGE[0]  .. MESSAGE[BLENGTH-1]
    and so Mlen = BLENGTH + 64.

    AES in CMAC mode is used with these inputs to produce a Message Authentication Code T (MACT) of length Tlen = 32.
    T is used directly as the 128-EIA2 output MACT[0]  .. MACT[31], with MACT[0] being the most significant bit of T.
    */
    let mut mac = Cmac::<Aes128>::new_from_slice(integrity_key)
        .map_err(|_| SecurityError::InvalidKeyLength(integrity_key.len()))?;
    mac.update(&count);
    mac.update(&[((bearer_identity_5bit & 0x1f) << 3) | ((direction_1bit & 0x01) << 2)]);
    mac.update(&[0u8; 3]);
    mac.update(message);
    let output = mac.finalize().into_bytes();
    let mut t = [0u8; MAC_LEN];
    t.copy_from_slice(&output[0..MAC_LEN]);
    Ok(t)
}

#[cfg(test)]
use hex_literal::hex;

#[test]
fn test_nia2_mac_test_set_2() {
    let count = hex!("398a59b4");
    let bearer = 0b11010;
    let direction = 0b1;
    // so bearer, direction is 0b11010100
    let ik = hex!("d3 c5 d5 92 32 7f b1 1c 40 35 c6 68 0a f8 c6 d1");
    let message = hex!("48 45 83 d5 af e0 82 ae");
    let expected_cmac = hex!("b93787e6");
    let cmac = calculate_nia2_mac(&ik, count, bearer, direction, &message).unwrap();
    assert_eq!(cmac, expected_cmac);
}

#[test]
fn test_nia2_through_trait() {
    let ik = hex!("d3 c5 d5 92 32 7f b1 1c 40 35 c6 68 0a f8 c6 d1");
    let input = AlgorithmInput {
        count: 0x398a59b4,
        bearer: 0x1a,
        direction: 1,
    };
    let mac = Nia2
        .compute(&ik, input, &hex!("48 45 83 d5 af e0 82 ae"))
        .unwrap();
    assert_eq!(mac, hex!("b93787e6"));
}
