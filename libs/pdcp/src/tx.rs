//! tx - build protected PDCP PDUs

use crate::header::{PdcpHeader, encode_data_header, parse_header};
use crate::{Direction, MAC_I_LEN, Plane, SnLength};
use anyhow::{Result, bail, ensure};
use security::{KEY_LEN, nea2, nia2};

/// Transmit side of one PDCP entity.  Protects with 128-NIA2 and 128-NEA2
/// once keys are enabled.
#[derive(Debug, Clone)]
pub struct PdcpTx {
    pub tx_next: u32,
    pub plane: Plane,
    pub sn_length: SnLength,
    pub channel_id: u8,
    pub direction: Direction,
    pub integrity_key: Option<[u8; KEY_LEN]>,
    pub ciphering_key: Option<[u8; KEY_LEN]>,
}

pub struct PdcpPdu(pub Vec<u8>);

impl PdcpPdu {
    /// View the inner packet in a PDCP packet, which must have been sent in the clear.
    pub fn view_inner(&self, plane: Plane, sn_length: SnLength) -> Result<&[u8]> {
        let PdcpHeader::Data { header_len, .. } = parse_header(plane, sn_length, &self.0)? else {
            bail!("Control PDU has no inner packet");
        };
        let trailer = match plane {
            Plane::Signalling => MAC_I_LEN,
            Plane::User => 0,
        };
        ensure!(self.0.len() >= header_len + trailer, "Too short for PDCP PDU");
        Ok(&self.0[header_len..self.0.len() - trailer])
    }
}

impl PdcpTx {
    pub fn new(plane: Plane, sn_length: SnLength, channel_id: u8, direction: Direction) -> Self {
        PdcpTx {
            tx_next: 0,
            plane,
            sn_length,
            channel_id,
            direction,
            integrity_key: None,
            ciphering_key: None,
        }
    }

    pub fn enable_integrity(&mut self, ik: [u8; KEY_LEN]) {
        self.integrity_key = Some(ik);
    }

    pub fn enable_ciphering(&mut self, ck: [u8; KEY_LEN]) {
        self.ciphering_key = Some(ck);
    }

    /// Encapsulate an inner packet in an outer PDCP packet.
    pub fn encode(&mut self, inner: &[u8]) -> Result<PdcpPdu> {
        // TS38.323, 5.2.1: associate the COUNT value corresponding to TX_NEXT to this PDCP SDU
        let count = self.tx_next;
        let sn = count % self.sn_length.modulo();
        let mut pdcp_pdu = encode_data_header(self.plane, self.sn_length, sn)?;
        let header_len = pdcp_pdu.len();
        pdcp_pdu.extend_from_slice(inner);

        // BEARER is the RB identity - 1 (TS 38.323, 5.8).
        let bearer = self.channel_id.saturating_sub(1);
        let direction = self.direction as u8;

        if self.plane == Plane::Signalling {
            let mut mac = [0u8; MAC_I_LEN];
            if let Some(ik) = self.integrity_key {
                mac = nia2::calculate_nia2_mac(
                    &ik,
                    count.to_be_bytes(),
                    bearer,
                    direction,
                    &pdcp_pdu,
                )?;
            }
            pdcp_pdu.extend(mac);
        }

        // The MAC-I is ciphered along with the data part.
        if let Some(ck) = self.ciphering_key {
            nea2::apply_nea2_keystream(
                &ck,
                count.to_be_bytes(),
                bearer,
                direction,
                &mut pdcp_pdu[header_len..],
            );
        }

        self.tx_next = self.tx_next.wrapping_add(1);
        Ok(PdcpPdu(pdcp_pdu))
    }
}

impl From<PdcpPdu> for Vec<u8> {
    fn from(p: PdcpPdu) -> Self {
        p.0
    }
}
