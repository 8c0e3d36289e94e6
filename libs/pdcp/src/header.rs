use crate::{MAC_I_LEN, Plane, SnLength};
use anyhow::{Result, bail, ensure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdcpHeader {
    Data { sn: u32, header_len: usize },

    /// User plane control PDU (status report, ROHC feedback...).  Never
    /// sequence checked or deciphered.
    Control { pdu_type: u8 },
}

/// Parse the header of a PDCP PDU.
///
/// Signalling plane data PDUs have no D/C bit and must be long enough to carry
/// the trailing MAC-I.  User plane PDUs start with the D/C bit (TS38.323, 6.3.7 /
/// TS36.323, 6.3.7).
pub fn parse_header(plane: Plane, sn_length: SnLength, pdu: &[u8]) -> Result<PdcpHeader> {
    ensure!(!pdu.is_empty(), "Empty PDCP PDU");
    let byte = |i: usize| -> Result<u32> {
        pdu.get(i)
            .map(|b| *b as u32)
            .ok_or_else(|| anyhow::anyhow!("PDCP PDU too short for {:?} header", sn_length))
    };

    let (sn, header_len) = match (plane, sn_length) {
        (Plane::Signalling, SnLength::Bits5) => (byte(0)? & 0x1f, 1),
        (Plane::Signalling, SnLength::Bits12) => (((byte(0)? & 0x0f) << 8) | byte(1)?, 2),
        (Plane::Signalling, _) => bail!("{:?} not valid for signalling plane", sn_length),
        (Plane::User, _) if pdu[0] & 0x80 == 0 => {
            return Ok(PdcpHeader::Control {
                pdu_type: (pdu[0] >> 4) & 0x07,
            });
        }
        (Plane::User, SnLength::Bits7) => (byte(0)? & 0x7f, 1),
        (Plane::User, SnLength::Bits12) => (((byte(0)? & 0x0f) << 8) | byte(1)?, 2),
        (Plane::User, SnLength::Bits15) => (((byte(0)? & 0x7f) << 8) | byte(1)?, 2),
        (Plane::User, SnLength::Bits18) => {
            (((byte(0)? & 0x03) << 16) | (byte(1)? << 8) | byte(2)?, 3)
        }
        (Plane::User, SnLength::Bits5) => bail!("5 bit SN not valid for user plane"),
    };

    if plane == Plane::Signalling {
        ensure!(
            pdu.len() >= header_len + MAC_I_LEN,
            "Signalling PDU of length {} too short for MAC-I",
            pdu.len()
        );
    }
    Ok(PdcpHeader::Data { sn, header_len })
}

/// Build a data PDU header carrying `sn`.
pub fn encode_data_header(plane: Plane, sn_length: SnLength, sn: u32) -> Result<Vec<u8>> {
    ensure!(sn < sn_length.modulo(), "SN {sn} does not fit {:?}", sn_length);
    let dc = match plane {
        Plane::Signalling => 0x00,
        Plane::User => 0x80,
    };
    Ok(match (plane, sn_length) {
        (Plane::Signalling, SnLength::Bits5) | (Plane::User, SnLength::Bits7) => {
            vec![dc | sn as u8]
        }
        (Plane::Signalling, SnLength::Bits12)
        | (Plane::User, SnLength::Bits12)
        | (Plane::User, SnLength::Bits15) => vec![dc | (sn >> 8) as u8, sn as u8],
        (Plane::User, SnLength::Bits18) => vec![dc | (sn >> 16) as u8, (sn >> 8) as u8, sn as u8],
        _ => bail!("{:?} not valid for {:?} plane", sn_length, plane),
    })
}
