//! Events that answer a command without carrying its opcode.

pub const EVENT_LE_META: u8 = 0x3e;

/// Opcode group field.
pub const fn ogf(opcode: u16) -> u8 {
    (opcode >> 10) as u8
}

/// Opcode command field.
pub const fn ocf(opcode: u16) -> u16 {
    opcode & 0x03ff
}

// (event code, LE subevent code, opcode of the command the event completes)
const IMPLIED_OPCODES: &[(u8, Option<u8>, u16)] = &[
    (0x03, None, 0x0405),                // Connection Complete <- Create Connection
    (0x05, None, 0x0406),                // Disconnection Complete <- Disconnect
    (0x06, None, 0x0411),                // Authentication Complete <- Authentication Requested
    (0x07, None, 0x0419),                // Remote Name Request Complete
    (0x08, None, 0x0413),                // Encryption Change <- Set Connection Encryption
    (0x09, None, 0x0415),                // Change Connection Link Key Complete
    (0x0b, None, 0x041b),                // Read Remote Supported Features Complete
    (0x0c, None, 0x041d),                // Read Remote Version Information Complete
    (0x0d, None, 0x0807),                // QoS Setup Complete
    (0x12, None, 0x080b),                // Role Change <- Switch Role
    (0x1c, None, 0x041f),                // Read Clock Offset Complete
    (0x1d, None, 0x040f),                // Connection Packet Type Changed
    (0x23, None, 0x041c),                // Read Remote Extended Features Complete
    (0x2c, None, 0x0428),                // Synchronous Connection Complete
    (EVENT_LE_META, Some(0x01), 0x200d), // LE Connection Complete <- LE Create Connection
    (EVENT_LE_META, Some(0x03), 0x2013), // LE Connection Update Complete
    (EVENT_LE_META, Some(0x04), 0x2016), // LE Read Remote Features Complete
    (EVENT_LE_META, Some(0x0a), 0x2043), // LE Enhanced Connection Complete <- LE Extended Create Connection
    (EVENT_LE_META, Some(0x0c), 0x2032), // LE PHY Update Complete <- LE Set PHY
    (EVENT_LE_META, Some(0x19), 0x2064), // LE CIS Established <- LE Create CIS
];

/// The command that an event conventionally completes, for events whose
/// wire format carries no opcode.
pub fn implied_opcode(event_code: u8, le_subevent: Option<u8>) -> Option<u16> {
    let le_subevent = if event_code == EVENT_LE_META {
        le_subevent
    } else {
        None
    };
    IMPLIED_OPCODES
        .iter()
        .find(|(code, sub, _)| *code == event_code && *sub == le_subevent)
        .map(|(_, _, opcode)| *opcode)
}

#[test]
fn test_implied_opcodes() {
    assert_eq!(implied_opcode(0x03, None), Some(0x0405));
    assert_eq!(implied_opcode(0x03, Some(0x01)), Some(0x0405));
    assert_eq!(implied_opcode(EVENT_LE_META, Some(0x01)), Some(0x200d));
    assert_eq!(implied_opcode(EVENT_LE_META, None), None);
    // Command Complete carries its own opcode.
    assert_eq!(implied_opcode(0x0e, None), None);
}

#[test]
fn test_opcode_fields() {
    assert_eq!(ogf(0x0405), 0x01);
    assert_eq!(ocf(0x0405), 0x0005);
    assert_eq!(ogf(0x200d), 0x08);
}
