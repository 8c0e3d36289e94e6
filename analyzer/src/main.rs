//! main - runs a trace through a capture session, first pass then revisits

use analyzer::{CaptureSession, Config, Trace, load_config_file};
use anyhow::{Result, ensure};
use clap::Parser;
use slog::{Drain, Logger, info, o};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file of default algorithms, SN lengths and per-UE keys.
    /// Without it, UEs default to null ciphering and integrity.
    #[arg(long)]
    config: Option<String>,

    /// TOML trace of classified frames, in capture order.
    #[arg(long)]
    trace: String,
}

fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let config = match &args.config {
        Some(filename) => load_config_file(filename, &logger)?,
        None => Config::default(),
    };
    let trace = Trace::load(&args.trace, &logger)?;

    let mut session = CaptureSession::new(&config, logger.new(o!("trace" => args.trace.clone())));
    session.run_pass(&trace, false);
    let second = session.run_pass(&trace, true);
    let third = session.run_pass(&trace, true);
    for frame in &third {
        for annotation in &frame.annotations {
            info!(&logger, "Frame {}: {:?}", frame.frame, annotation);
        }
    }
    session.close();

    ensure!(second == third, "Revisit passes produced different annotations");
    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}
