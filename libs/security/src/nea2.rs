use crate::{AlgorithmInput, Cipher, KEY_LEN, SecurityError};
use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher, generic_array::GenericArray};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// 128-NEA2, AES in CTR mode.
pub struct Nea2;

impl Cipher for Nea2 {
    fn apply_keystream(
        &self,
        key: &[u8; KEY_LEN],
        input: AlgorithmInput,
        data: &mut [u8],
    ) -> Result<(), SecurityError> {
        apply_nea2_keystream(
            key,
            input.count.to_be_bytes(),
            input.bearer,
            input.direction,
            data,
        );
        Ok(())
    }
}

// TS33.401, B.1.3
pub fn apply_nea2_keystream(
    ciphering_key: &[u8; KEY_LEN],
    count: [u8; 4],
    bearer_identity_5bit: u8,
    direction_1bit: u8,
    data: &mut [u8],
) {
    /*
    The 128-bit counter block T1 is constructed as follows:
    T1[0] .. T1[31] = COUNT[0] .. COUNT[31]
    T1[32] .. T1[36] = BEARER[0] .. BEARER[4]
    T1[37] = DIRECTION
    T1[38] .. T1[127] = 0 (i.e. 90 zero bits)
    Subsequent counter blocks are obtained by applying the standard integer
    incrementing function mod 2^128 to the previous block.
    */
    let mut t1 = [0u8; 16];
    t1[0..4].copy_from_slice(&count);
    t1[4] = ((bearer_identity_5bit & 0x1f) << 3) | ((direction_1bit & 0x01) << 2);
    let mut cipher = Aes128Ctr::new(
        GenericArray::from_slice(ciphering_key),
        GenericArray::from_slice(&t1),
    );
    cipher.apply_keystream(data);
}

#[cfg(test)]
use hex_literal::hex;

#[test]
fn test_nea2_test_set_1() {
    // TS33.401, C.1, 128-EEA2 test set 1.  LENGTH is 253 bits, so only the top
    // 5 bits of the final byte are defined.
    let key = hex!("d3 c5 d5 92 32 7f b1 1c 40 35 c6 68 0a f8 c6 d1");
    let mut data = hex!(
        "98 1b a6 82 4c 1b fb 1a b4 85 47 20 29 b7 1d 80
         8c e3 3e 2c c3 c0 b5 fc 1f 3d e8 a6 dc 66 b1 f0"
    );
    let expected = hex!(
        "e9 fe d8 a6 3d 15 53 04 d7 1d f2 0b f3 e8 22 14
         b2 0e d7 da d2 f2 33 dc 3c 22 d7 bd ee ed 8e 78"
    );
    apply_nea2_keystream(&key, hex!("398a59b4"), 0x15, 1, &mut data);
    assert_eq!(data[..31], expected[..31]);
    assert_eq!(data[31] & 0xf8, expected[31] & 0xf8);
}

#[test]
fn test_nea2_is_an_involution() {
    let key = [0x42u8; KEY_LEN];
    let input = AlgorithmInput {
        count: 0x0102_0304,
        bearer: 3,
        direction: 0,
    };
    let plain = b"an rrc message spanning more than one aes block".to_vec();
    let mut data = plain.clone();
    Nea2.encrypt(&key, input, &mut data).unwrap();
    assert_ne!(data, plain);
    Nea2.decrypt(&key, input, &mut data).unwrap();
    assert_eq!(data, plain);
}
