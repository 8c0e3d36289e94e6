use analyzer::Config;
use analyzer_tests::framework::*;
use hci::{HciEvent, LinkType, PacketTypeView};

const HANDLE: u16 = 0x002a;

fn packet_type_changed() -> analyzer::FrameInput {
    hci(HciEvent::ConnectionPacketTypeChanged {
        status: 0x00,
        handle: HANDLE,
        packet_type: 0xcc18,
    })
}

#[test]
fn reused_handle_resolves_by_frame() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![
        frame(5, vec![hci(HciEvent::ConnectionComplete {
            status: 0x00,
            handle: HANDLE,
            link_type: 0x01,
        })]),
        frame(30, vec![packet_type_changed()]),
        frame(50, vec![hci(HciEvent::DisconnectionComplete {
            status: 0x00,
            handle: HANDLE,
        })]),
        frame(55, vec![packet_type_changed()]),
        frame(60, vec![hci(HciEvent::SynchronousConnectionComplete {
            status: 0x00,
            handle: HANDLE,
            link_type: 0x00,
        })]),
        frame(70, vec![packet_type_changed()]),
    ]);
    session.run_pass(&trace, false);
    let pass = session.run_pass(&trace, true);

    let during_acl = hci_annotation(&pass, 30)?;
    assert_eq!(during_acl.link_type, Some((HANDLE, LinkType::Acl)));
    assert!(matches!(during_acl.packet_type, Some(PacketTypeView::Acl(_))));

    let between = hci_annotation(&pass, 55)?;
    assert_eq!(between.link_type, Some((HANDLE, LinkType::Unknown)));
    assert!(between.packet_type.as_ref().unwrap().is_ambiguous());

    let during_sco = hci_annotation(&pass, 70)?;
    assert_eq!(during_sco.link_type, Some((HANDLE, LinkType::Sco)));
    assert!(matches!(during_sco.packet_type, Some(PacketTypeView::Sco(_))));

    let channels = session.hci().channels();
    assert_eq!(channels.session_count(), 2);
    Ok(())
}

#[test]
fn failed_connection_and_unmatched_disconnect_are_ignored() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![
        frame(1, vec![hci(HciEvent::DisconnectionComplete {
            status: 0x00,
            handle: HANDLE,
        })]),
        frame(2, vec![hci(HciEvent::LeConnectionComplete {
            status: 0x3e,
            handle: HANDLE,
        })]),
        frame(3, vec![hci(HciEvent::LeEnhancedConnectionComplete {
            status: 0x00,
            handle: HANDLE,
        })]),
        frame(4, vec![packet_type_changed()]),
    ]);
    let pass = session.run_pass(&trace, false);

    assert_eq!(session.hci().channels().session_count(), 1);
    let le = hci_annotation(&pass, 4)?;
    assert_eq!(le.link_type, Some((HANDLE, LinkType::Le)));
    assert!(le.packet_type.as_ref().unwrap().is_ambiguous());
    Ok(())
}
