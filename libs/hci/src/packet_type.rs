use crate::LinkType;

// Packet_Type bits of Change Connection Packet Type / Connection Packet Type
// Changed.  The same field position is read differently on ACL and SCO links.
const ACL_PACKET_TYPES: &[(u16, &str)] = &[
    (0x0002, "2-DH1 may not be used"),
    (0x0004, "3-DH1 may not be used"),
    (0x0008, "DM1"),
    (0x0010, "DH1"),
    (0x0100, "2-DH3 may not be used"),
    (0x0200, "3-DH3 may not be used"),
    (0x0400, "DM3"),
    (0x0800, "DH3"),
    (0x1000, "2-DH5 may not be used"),
    (0x2000, "3-DH5 may not be used"),
    (0x4000, "DM5"),
    (0x8000, "DH5"),
];

const SCO_PACKET_TYPES: &[(u16, &str)] = &[(0x0020, "HV1"), (0x0040, "HV2"), (0x0080, "HV3")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketTypeView {
    Acl(Vec<&'static str>),
    Sco(Vec<&'static str>),

    /// The link type at this frame is not known, so both readings are given.
    Ambiguous {
        acl: Vec<&'static str>,
        sco: Vec<&'static str>,
    },
}

impl PacketTypeView {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, PacketTypeView::Ambiguous { .. })
    }
}

fn flags(bits: u16, table: &[(u16, &'static str)]) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(mask, _)| bits & mask != 0)
        .map(|(_, name)| *name)
        .collect()
}

pub fn packet_type_view(bits: u16, link_type: LinkType) -> PacketTypeView {
    match link_type {
        LinkType::Acl => PacketTypeView::Acl(flags(bits, ACL_PACKET_TYPES)),
        LinkType::Sco => PacketTypeView::Sco(flags(bits, SCO_PACKET_TYPES)),
        LinkType::Le | LinkType::Iso | LinkType::Unknown => PacketTypeView::Ambiguous {
            acl: flags(bits, ACL_PACKET_TYPES),
            sco: flags(bits, SCO_PACKET_TYPES),
        },
    }
}
