//! analyzer - a capture session over the HCI and PDCP trackers, plus the
//! configuration and trace formats used to drive it

mod config;
mod session;
mod trace;

pub use config::{Config, SnLengthDefaults, UeKeyTable, UeKeys, load_config_file, parse_config};
pub use session::{Annotation, CaptureSession, FrameAnnotations, SessionStats};
pub use trace::{FrameInput, Trace, TraceFrame};
