use analyzer::{FrameInput, parse_config};
use analyzer_tests::framework::*;
use hex_literal::hex;
use pdcp::{Direction, IntegrityVerdict, KeyType, PdcpTx, Plane, SecurityOutcome, SnLength};
use security::keygen::{KeyHierarchy, derive_as_keys};
use security::{CipheringAlgorithm, IntegrityAlgorithm};

const CK: [u8; 16] = hex!("d3c5d592327fb11c4035c6680af8c6d1");
const IK: [u8; 16] = hex!("2bd6459f82c5b300952c49104881ff48");

const KEYS_CONFIG: &str = r#"
[ue-1]
rrc_cipher_key = "d3c5d592327fb11c4035c6680af8c6d1"
rrc_integrity_key = "2bd6459f82c5b300952c49104881ff48"
"#;

fn configured(ciphering: CipheringAlgorithm, integrity: IntegrityAlgorithm) -> FrameInput {
    FrameInput::SecurityConfigured {
        ue: 1,
        ciphering,
        integrity,
    }
}

fn nea2_nia2() -> FrameInput {
    configured(CipheringAlgorithm::Nea2, IntegrityAlgorithm::Nia2)
}

fn srb1(direction: Direction, tx: &mut PdcpTx, payload: &[u8]) -> anyhow::Result<FrameInput> {
    Ok(pdcp(
        1,
        Plane::Signalling,
        1,
        direction,
        SnLength::Bits12,
        tx.encode(payload)?.into(),
    ))
}

fn srb1_tx(direction: Direction) -> PdcpTx {
    let mut tx = PdcpTx::new(Plane::Signalling, SnLength::Bits12, 1, direction);
    tx.enable_integrity(IK);
    tx
}

fn verified(outcome: &SecurityOutcome) -> bool {
    matches!(outcome.integrity, Some(IntegrityVerdict::Verified { .. }))
}

#[test]
fn handshake_pdu_is_not_deciphered() -> anyhow::Result<()> {
    let logger = init();
    let config = parse_config(KEYS_CONFIG, "test", &logger)?;
    let mut session = new_session(&config, &logger);

    let mut dl = srb1_tx(Direction::Downlink);
    let mut ul = srb1_tx(Direction::Uplink);
    let command = srb1(Direction::Downlink, &mut dl, b"security mode command")?;
    let complete = srb1(Direction::Uplink, &mut ul, b"security mode complete")?;
    dl.enable_ciphering(CK);
    ul.enable_ciphering(CK);
    let ciphered_ul = srb1(Direction::Uplink, &mut ul, b"measurement report")?;
    let ciphered_dl = srb1(Direction::Downlink, &mut dl, b"reconfiguration")?;

    let trace = trace(vec![
        frame(1, vec![nea2_nia2()]),
        frame(2, vec![command]),
        frame(3, vec![complete]),
        frame(4, vec![ciphered_ul]),
        frame(5, vec![ciphered_dl]),
    ]);
    let pass = session.run_pass(&trace, false);

    let a = pdcp_annotation(&pass, 2)?;
    assert!(!a.security.unwrap().seen_next_uplink_pdu);
    assert_eq!(a.outcome.deciphered, None);
    assert!(verified(&a.outcome));

    let a = pdcp_annotation(&pass, 3)?;
    assert_eq!(a.outcome.deciphered, None);
    assert!(verified(&a.outcome));

    let a = pdcp_annotation(&pass, 4)?;
    assert!(a.security.unwrap().seen_next_uplink_pdu);
    assert_eq!(
        a.outcome.deciphered.as_deref(),
        Some(&b"measurement report"[..])
    );
    assert!(verified(&a.outcome));

    let a = pdcp_annotation(&pass, 5)?;
    assert_eq!(a.outcome.deciphered.as_deref(), Some(&b"reconfiguration"[..]));
    assert!(verified(&a.outcome));

    // A revisit leaves the deciphered payload as it was.
    let revisit = session.run_pass(&trace, true);
    assert_eq!(pdcp_annotation(&revisit, 4)?.outcome, pdcp_annotation(&pass, 4)?.outcome);
    assert_eq!(pdcp_annotation(&revisit, 3)?.outcome, pdcp_annotation(&pass, 3)?.outcome);
    Ok(())
}

#[test]
fn user_plane_keys_derived_from_kenb() -> anyhow::Result<()> {
    let logger = init();
    let kenb = [0x3c; 32];
    let config = parse_config(
        "[ue-1]\nkenb = \"3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c\"\n",
        "test",
        &logger,
    )?;
    let keys = derive_as_keys(
        KeyHierarchy::Eps,
        &kenb,
        CipheringAlgorithm::Nea2,
        IntegrityAlgorithm::Nia2,
    );
    let mut session = new_session(&config, &logger);

    let mut ul = PdcpTx::new(Plane::Signalling, SnLength::Bits12, 1, Direction::Uplink);
    ul.enable_integrity(keys.rrc_int);
    let complete = srb1(Direction::Uplink, &mut ul, b"complete")?;

    let mut drb = PdcpTx::new(Plane::User, SnLength::Bits18, 1, Direction::Downlink);
    drb.enable_ciphering(keys.up_enc);
    drb.tx_next = 0x3ffff;
    let last_before_wrap = drb.encode(b"ip packet 1")?;
    let first_after_wrap = drb.encode(b"ip packet 2")?;

    let trace = trace(vec![
        frame(1, vec![nea2_nia2()]),
        frame(2, vec![complete]),
        frame(3, vec![pdcp(
            1,
            Plane::User,
            1,
            Direction::Downlink,
            SnLength::Bits18,
            last_before_wrap.into(),
        )]),
        frame(4, vec![pdcp(
            1,
            Plane::User,
            1,
            Direction::Downlink,
            SnLength::Bits18,
            first_after_wrap.into(),
        )]),
    ]);
    let pass = session.run_pass(&trace, false);

    assert!(verified(&pdcp_annotation(&pass, 2)?.outcome));
    let a = pdcp_annotation(&pass, 3)?;
    assert_eq!(a.outcome.deciphered.as_deref(), Some(&b"ip packet 1"[..]));
    assert_eq!(a.outcome.integrity, None);

    // The receiver's COUNT picks up the hyper frame number at the wrap.
    let a = pdcp_annotation(&pass, 4)?;
    assert_eq!(a.sequence.as_ref().unwrap().hfn, 1);
    assert_eq!(a.outcome.deciphered.as_deref(), Some(&b"ip packet 2"[..]));
    Ok(())
}

#[test]
fn signalled_keys_apply_from_next_frame() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Default::default(), &logger);

    let mut ul = srb1_tx(Direction::Uplink);
    let complete = srb1(Direction::Uplink, &mut ul, b"complete")?;
    let mut dl = srb1_tx(Direction::Downlink);
    dl.enable_ciphering(CK);
    let first = srb1(Direction::Downlink, &mut dl, b"first")?;
    let second = srb1(Direction::Downlink, &mut dl, b"second")?;

    let signalled = |key_type, key| FrameInput::KeySignalled {
        ue: 1,
        key_type,
        key,
    };
    let trace = trace(vec![
        frame(1, vec![
            nea2_nia2(),
            signalled(KeyType::SignallingIntegrity, IK),
        ]),
        frame(2, vec![complete]),
        frame(3, vec![signalled(KeyType::SignallingCipher, CK), first]),
        frame(4, vec![second]),
    ]);
    let pass = session.run_pass(&trace, false);

    assert!(verified(&pdcp_annotation(&pass, 2)?.outcome));
    // The ciphering key is not in effect in its own frame.
    assert_eq!(pdcp_annotation(&pass, 3)?.outcome, SecurityOutcome::default());
    let a = pdcp_annotation(&pass, 4)?;
    assert_eq!(a.outcome.deciphered.as_deref(), Some(&b"second"[..]));
    assert!(verified(&a.outcome));
    Ok(())
}

#[test]
fn missing_key_or_algorithm_leaves_payload_alone() -> anyhow::Result<()> {
    let logger = init();
    let mut dl = srb1_tx(Direction::Downlink);
    dl.enable_ciphering(CK);
    let mut ul = srb1_tx(Direction::Uplink);
    let complete = srb1(Direction::Uplink, &mut ul, b"complete")?;
    let ciphered = srb1(Direction::Downlink, &mut dl, b"reconfiguration")?;

    // No keys at all.
    let mut session = new_session(&Default::default(), &logger);
    let pass = session.run_pass(
        &trace(vec![
            frame(1, vec![nea2_nia2()]),
            frame(2, vec![complete.clone()]),
            frame(3, vec![ciphered.clone()]),
        ]),
        false,
    );
    assert_eq!(pdcp_annotation(&pass, 3)?.outcome, SecurityOutcome::default());

    // Keys, but an algorithm that is not available.
    let config = parse_config(KEYS_CONFIG, "test", &logger)?;
    let mut session = new_session(&config, &logger);
    let pass = session.run_pass(
        &trace(vec![
            frame(1, vec![configured(
                CipheringAlgorithm::Nea3,
                IntegrityAlgorithm::Nia3,
            )]),
            frame(2, vec![complete]),
            frame(3, vec![ciphered]),
        ]),
        false,
    );
    assert_eq!(pdcp_annotation(&pass, 2)?.outcome, SecurityOutcome::default());
    assert_eq!(pdcp_annotation(&pass, 3)?.outcome, SecurityOutcome::default());
    Ok(())
}

#[test]
fn integrity_mismatch_is_reported() -> anyhow::Result<()> {
    let logger = init();
    let config = parse_config(KEYS_CONFIG, "test", &logger)?;
    let mut session = new_session(&config, &logger);

    let mut ul = PdcpTx::new(Plane::Signalling, SnLength::Bits12, 1, Direction::Uplink);
    ul.enable_integrity([0xff; 16]);
    let forged = srb1(Direction::Uplink, &mut ul, b"complete")?;

    let trace = trace(vec![frame(1, vec![nea2_nia2()]), frame(2, vec![forged])]);
    let pass = session.run_pass(&trace, false);
    let a = pdcp_annotation(&pass, 2)?;
    assert!(matches!(
        a.outcome.integrity,
        Some(IntegrityVerdict::Mismatch { .. })
    ));
    assert_eq!(session.close().integrity_mismatches, 1);
    Ok(())
}
