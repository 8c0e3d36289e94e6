use analyzer::{Annotation, CaptureSession, Config, FrameAnnotations, FrameInput, Trace, TraceFrame};
use anyhow::{Result, anyhow};
use capture::FrameNum;
use hci::{Adapter, Correlation, HciAnnotations, HciEvent};
use pdcp::{Direction, PdcpAnnotations, Plane, SnLength, UeId};
use slog::{Drain, Logger, o};

pub fn init() -> Logger {
    exit_on_panic();
    init_logging()
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

pub fn new_session(config: &Config, logger: &Logger) -> CaptureSession {
    CaptureSession::new(config, logger.new(o!("session" => 1)))
}

/// Frames are stamped one millisecond apart by frame number.
pub fn frame(num: FrameNum, inputs: Vec<FrameInput>) -> TraceFrame {
    TraceFrame {
        num,
        time_us: num as u64 * 1000,
        inputs,
    }
}

pub fn trace(frames: Vec<TraceFrame>) -> Trace {
    Trace { frames }
}

pub fn hci(event: HciEvent) -> FrameInput {
    FrameInput::Hci {
        adapter: Adapter::default(),
        event,
    }
}

pub fn pdcp(
    ue: UeId,
    plane: Plane,
    channel: u8,
    direction: Direction,
    sn_length: SnLength,
    pdu: Vec<u8>,
) -> FrameInput {
    FrameInput::Pdcp {
        ue,
        plane,
        channel,
        direction,
        sn_length: Some(sn_length.bits()),
        pdu,
    }
}

/// A user plane data PDU with a 12 bit SN.
pub fn drb_pdu(channel: u8, direction: Direction, sn: u32) -> FrameInput {
    pdcp(
        1,
        Plane::User,
        channel,
        direction,
        SnLength::Bits12,
        vec![0x80 | (sn >> 8) as u8, sn as u8, 0x45, 0x00],
    )
}

pub fn annotations_for(pass: &[FrameAnnotations], num: FrameNum) -> Result<&FrameAnnotations> {
    pass.iter()
        .find(|a| a.frame == num)
        .ok_or_else(|| anyhow!("No annotations for frame {num}"))
}

pub fn hci_annotation(pass: &[FrameAnnotations], num: FrameNum) -> Result<&HciAnnotations> {
    annotations_for(pass, num)?
        .annotations
        .iter()
        .find_map(|a| match a {
            Annotation::Hci(h) => Some(h),
            _ => None,
        })
        .ok_or_else(|| anyhow!("No HCI annotation for frame {num}"))
}

pub fn correlation(
    pass: &[FrameAnnotations],
    num: FrameNum,
    opcode: u16,
) -> Result<Option<&Correlation>> {
    Ok(hci_annotation(pass, num)?
        .correlations
        .iter()
        .find(|c| c.opcode == opcode))
}

pub fn pdcp_annotation(pass: &[FrameAnnotations], num: FrameNum) -> Result<&PdcpAnnotations> {
    annotations_for(pass, num)?
        .annotations
        .iter()
        .find_map(|a| match a {
            Annotation::Pdcp(p) => Some(p),
            _ => None,
        })
        .ok_or_else(|| anyhow!("No PDCP annotation for frame {num}"))
}
