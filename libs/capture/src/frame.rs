use std::time::Duration;

/// Capture frame number.  Unique, and increasing in capture order.
pub type FrameNum = u32;

/// A frame as handed to the trackers by the dissection driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub num: FrameNum,

    // Capture time, relative to any fixed origin.
    pub timestamp: Duration,

    visited: bool,
}

impl Frame {
    pub fn new(num: FrameNum, timestamp: Duration, visited: bool) -> Self {
        Frame {
            num,
            timestamp,
            visited,
        }
    }

    /// A frame seen for the first time, in capture order.
    pub fn first_pass(num: FrameNum, timestamp: Duration) -> Self {
        Self::new(num, timestamp, false)
    }

    /// The same frame presented again, e.g. for redisplay.
    pub fn revisit(self) -> Self {
        Frame {
            visited: true,
            ..self
        }
    }

    pub fn visited(&self) -> bool {
        self.visited
    }

    /// The capability to mutate tracker state.  Only a frame that has not been
    /// visited before may grant it; every other visit is read-only.
    pub fn first_visit(&self) -> Option<FirstVisit> {
        (!self.visited).then_some(FirstVisit(FrameStamp {
            frame: self.num,
            timestamp: self.timestamp,
        }))
    }
}

/// Frame number and capture time of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStamp {
    pub frame: FrameNum,
    pub timestamp: Duration,
}

impl FrameStamp {
    /// Milliseconds from `self` to `later`, or 0 if `later` is not later.
    pub fn millis_until(&self, later: &FrameStamp) -> f64 {
        later.timestamp.saturating_sub(self.timestamp).as_micros() as f64 / 1000.0
    }
}

/// Proof that the current frame is on its first visit.  Required by every
/// operation that writes analysis state.
#[derive(Debug, Clone, Copy)]
pub struct FirstVisit(FrameStamp);

impl FirstVisit {
    pub fn frame(&self) -> FrameNum {
        self.0.frame
    }

    pub fn timestamp(&self) -> Duration {
        self.0.timestamp
    }

    pub fn stamp(&self) -> FrameStamp {
        self.0
    }
}
