use analyzer::Config;
use analyzer_tests::framework::*;
use hci::{HciEvent, TransactionRole};

const CREATE_CONNECTION: u16 = 0x0405;
const RESET: u16 = 0x0c03;

#[test]
fn command_pending_response() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![
        frame(10, vec![hci(HciEvent::Command {
            opcode: CREATE_CONNECTION,
        })]),
        frame(12, vec![hci(HciEvent::CommandStatus {
            opcode: CREATE_CONNECTION,
            status: 0x00,
        })]),
        frame(20, vec![hci(HciEvent::ConnectionComplete {
            status: 0x00,
            handle: 0x0040,
            link_type: 0x01,
        })]),
    ]);

    let first = session.run_pass(&trace, false);
    let pending = correlation(&first, 12, CREATE_CONNECTION)?.unwrap();
    assert_eq!(pending.role, TransactionRole::Pending);
    assert_eq!(pending.command_frame, 10);
    assert_eq!(pending.pending_frame, Some(12));
    assert_eq!(pending.command_to_pending_ms, Some(2.0));

    let response = correlation(&first, 20, CREATE_CONNECTION)?.unwrap();
    assert_eq!(response.role, TransactionRole::Response);
    assert_eq!(response.command_frame, 10);
    assert_eq!(response.pending_frame, Some(12));
    assert_eq!(response.response_frame, Some(20));
    assert_eq!(response.pending_to_response_ms, Some(8.0));
    assert_eq!(response.command_to_response_ms, Some(10.0));

    // On a revisit the command frame sees the whole transaction.
    let revisit = session.run_pass(&trace, true);
    let command = correlation(&revisit, 10, CREATE_CONNECTION)?.unwrap();
    assert_eq!(command.role, TransactionRole::Command);
    assert_eq!(command.response_frame, Some(20));
    Ok(())
}

#[test]
fn backward_walk_finds_older_open_command() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![
        frame(1, vec![hci(HciEvent::Command { opcode: RESET })]),
        frame(2, vec![hci(HciEvent::Command { opcode: RESET })]),
        frame(3, vec![hci(HciEvent::CommandComplete { opcode: RESET })]),
        frame(4, vec![hci(HciEvent::CommandComplete { opcode: RESET })]),
        frame(5, vec![hci(HciEvent::CommandComplete { opcode: RESET })]),
    ]);
    let pass = session.run_pass(&trace, false);

    assert_eq!(correlation(&pass, 3, RESET)?.unwrap().command_frame, 2);
    assert_eq!(correlation(&pass, 4, RESET)?.unwrap().command_frame, 1);
    // Nothing left open.
    assert!(correlation(&pass, 5, RESET)?.is_none());
    Ok(())
}

#[test]
fn failed_command_status_completes_transaction() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![
        frame(1, vec![hci(HciEvent::Command {
            opcode: CREATE_CONNECTION,
        })]),
        frame(2, vec![hci(HciEvent::CommandStatus {
            opcode: CREATE_CONNECTION,
            status: 0x0c,
        })]),
        // No credits-only status is correlated.
        frame(3, vec![hci(HciEvent::CommandStatus {
            opcode: 0x0000,
            status: 0x00,
        })]),
    ]);
    let pass = session.run_pass(&trace, false);

    let c = correlation(&pass, 2, CREATE_CONNECTION)?.unwrap();
    assert_eq!(c.role, TransactionRole::Response);
    assert_eq!(c.pending_frame, None);
    assert!(hci_annotation(&pass, 3)?.correlations.is_empty());
    Ok(())
}

#[test]
fn status_without_command_is_not_annotated() -> anyhow::Result<()> {
    let logger = init();
    let mut session = new_session(&Config::default(), &logger);
    let trace = trace(vec![frame(7, vec![hci(HciEvent::CommandComplete {
        opcode: RESET,
    })])]);
    let pass = session.run_pass(&trace, false);
    assert!(correlation(&pass, 7, RESET)?.is_none());
    assert_eq!(session.close().correlations, 0);
    Ok(())
}
