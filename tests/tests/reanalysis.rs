use analyzer::{FrameInput, parse_config};
use analyzer_tests::framework::*;
use hci::HciEvent;
use pdcp::{Direction, PdcpTx, Plane, SnLength};
use security::{CipheringAlgorithm, IntegrityAlgorithm};

const CONFIG: &str = r#"
[ue-1]
rrc_cipher_key = "000102030405060708090a0b0c0d0e0f"
rrc_integrity_key = "f0e0d0c0b0a090807060504030201000"
"#;

fn mixed_trace() -> anyhow::Result<analyzer::Trace> {
    let ck = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    let ik = [
        0xf0, 0xe0, 0xd0, 0xc0, 0xb0, 0xa0, 0x90, 0x80, 0x70, 0x60, 0x50, 0x40, 0x30, 0x20, 0x10,
        0x00,
    ];
    let mut ul = PdcpTx::new(Plane::Signalling, SnLength::Bits12, 1, Direction::Uplink);
    ul.enable_integrity(ik);
    let mut dl = PdcpTx::new(Plane::Signalling, SnLength::Bits12, 1, Direction::Downlink);
    dl.enable_integrity(ik);
    dl.enable_ciphering(ck);
    let srb = |direction, tx: &mut PdcpTx, payload: &[u8]| -> anyhow::Result<FrameInput> {
        Ok(pdcp(
            1,
            Plane::Signalling,
            1,
            direction,
            SnLength::Bits12,
            tx.encode(payload)?.into(),
        ))
    };

    Ok(trace(vec![
        frame(1, vec![hci(HciEvent::Command { opcode: 0x0405 })]),
        frame(2, vec![hci(HciEvent::CommandStatus {
            opcode: 0x0405,
            status: 0,
        })]),
        frame(3, vec![
            hci(HciEvent::ConnectionComplete {
                status: 0,
                handle: 1,
                link_type: 1,
            }),
            FrameInput::SecurityConfigured {
                ue: 1,
                ciphering: CipheringAlgorithm::Nea2,
                integrity: IntegrityAlgorithm::Nia2,
            },
        ]),
        frame(4, vec![srb(Direction::Uplink, &mut ul, b"complete")?]),
        frame(5, vec![srb(Direction::Downlink, &mut dl, b"one")?]),
        frame(6, vec![drb_pdu(2, Direction::Uplink, 100)]),
        frame(7, vec![drb_pdu(2, Direction::Uplink, 100)]),
        frame(8, vec![drb_pdu(2, Direction::Uplink, 300)]),
        frame(9, vec![srb(Direction::Downlink, &mut dl, b"two")?]),
        frame(10, vec![hci(HciEvent::DisconnectionComplete {
            status: 0,
            handle: 1,
        })]),
        frame(11, vec![hci(HciEvent::ConnectionPacketTypeChanged {
            status: 0,
            handle: 1,
            packet_type: 0x0018,
        })]),
    ]))
}

#[test]
fn revisits_are_identical_and_read_only() -> anyhow::Result<()> {
    let logger = init();
    let config = parse_config(CONFIG, "test", &logger)?;
    let mut session = new_session(&config, &logger);
    let trace = mixed_trace()?;

    session.run_pass(&trace, false);
    let channels = session.hci().channels().clone();
    let correlator = session.hci().correlator().clone();
    let sequences = session.pdcp().sequences().clone();
    let security = session.pdcp().security().clone();
    let keys = session.pdcp().keys().clone();
    let stats = session.stats();

    let second = session.run_pass(&trace, true);
    let third = session.run_pass(&trace, true);
    assert_eq!(second, third);

    assert_eq!(session.hci().channels(), &channels);
    assert_eq!(session.hci().correlator(), &correlator);
    assert_eq!(session.pdcp().sequences(), &sequences);
    assert_eq!(session.pdcp().security(), &security);
    assert_eq!(session.pdcp().keys(), &keys);
    assert_eq!(session.stats(), stats);
    Ok(())
}

#[test]
fn random_access_revisits_match_sequential_ones() -> anyhow::Result<()> {
    let logger = init();
    let config = parse_config(CONFIG, "test", &logger)?;
    let mut session = new_session(&config, &logger);
    let trace = mixed_trace()?;

    session.run_pass(&trace, false);
    let sequential = session.run_pass(&trace, true);

    for f in trace.frames.iter().rev() {
        let annotations = session.process(&f.frame(true), &f.inputs);
        assert_eq!(Some(&annotations), sequential.iter().find(|a| a.frame == f.num));
    }
    Ok(())
}

#[test]
fn revisit_before_first_pass_changes_nothing() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Default::default(), &logger);
    let trace = trace(vec![
        frame(1, vec![hci(HciEvent::Command { opcode: 0x0c03 })]),
        frame(2, vec![drb_pdu(1, Direction::Downlink, 5)]),
    ]);

    let pass = session.run_pass(&trace, true);
    assert!(hci_annotation(&pass, 1)?.correlations.is_empty());
    assert_eq!(pdcp_annotation(&pass, 2)?.sequence, None);
    assert_eq!(session.pdcp().sequences().report_count(), 0);
    assert_eq!(session.stats().frames, 0);
    Ok(())
}
