//! capture - frame model shared by the protocol trackers

mod frame;
mod history;

pub use frame::{FirstVisit, Frame, FrameNum, FrameStamp};
pub use history::FrameHistory;
