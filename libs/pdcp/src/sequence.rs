use crate::{SequenceChannelKey, SnLength};
use capture::{FirstVisit, FrameNum};
use slog::{Logger, debug, warn};
use std::collections::HashMap;

/// An SN this far or less behind the expected one is taken to be a repeat of
/// data already seen.  Anything further away is taken to be a jump forward
/// over lost PDUs.  This is an empirical heuristic, independent of the SN
/// length.
pub const REPEAT_WINDOW: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceClassification {
    Ok,
    Repeated { sn: u32 },
    Missing { first_sn: u32, last_sn: u32 },
}

/// Sequence analysis result for one PDU.  Fixed once computed, except that
/// `next_frame` is filled in when the next in-sequence PDU arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub classification: SequenceClassification,
    pub sn: u32,
    pub expected_sn: u32,
    pub previous_frame: Option<FrameNum>,
    pub next_frame: Option<FrameNum>,
    /// HFN of the channel once this PDU has been taken into account.
    pub hfn: u32,
    /// HFN to combine with `sn` into this PDU's COUNT.  One less than `hfn`
    /// for a repeat of a PDU sent before the last wrap.
    pub count_hfn: u32,
}

impl SequenceReport {
    pub fn is_ok(&self) -> bool {
        self.classification == SequenceClassification::Ok
    }

    pub fn count(&self, sn_length: SnLength) -> u32 {
        self.count_hfn
            .wrapping_mul(sn_length.modulo())
            .wrapping_add(self.sn)
    }

    /// Number of SNs skipped over, for a Missing report.
    pub fn missing_count(&self, sn_length: SnLength) -> u32 {
        match self.classification {
            SequenceClassification::Missing { first_sn, last_sn } => {
                (sn_length.modulo() + last_sn - first_sn) % sn_length.modulo() + 1
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ChannelState {
    // SN and frame of the last PDU that advanced the channel.
    previous: Option<(u32, FrameNum)>,
    hfn: u32,
}

type ReportKey = (SequenceChannelKey, u32, FrameNum);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceTracker {
    channels: HashMap<SequenceChannelKey, ChannelState>,
    reports: HashMap<ReportKey, SequenceReport>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `sn` against the channel state and advance the state.  Runs
    /// once per (channel, SN, frame); later calls return the stored report.
    pub fn analyze(
        &mut self,
        visit: &FirstVisit,
        key: SequenceChannelKey,
        sn_length: SnLength,
        sn: u32,
        logger: &Logger,
    ) -> SequenceReport {
        let frame = visit.frame();
        let modulo = sn_length.modulo();
        let sn = sn % modulo;
        if let Some(report) = self.reports.get(&(key, sn, frame)) {
            return report.clone();
        }

        let state = self.channels.entry(key).or_default();
        let previous_frame = state.previous.map(|(_, f)| f);
        let expected_sn = match state.previous {
            Some((previous_sn, _)) => (previous_sn + 1) % modulo,
            None => sn,
        };

        let mut advanced_from = None;
        let classification = if sn == expected_sn {
            if state.previous.is_some() && sn == 0 {
                state.hfn += 1;
            }
            advanced_from = state.previous.replace((sn, frame));
            SequenceClassification::Ok
        } else if (modulo + expected_sn - sn) % modulo > REPEAT_WINDOW {
            // Treat this SN as the new baseline, so that one loss is reported once.
            state.previous = Some((sn, frame));
            SequenceClassification::Missing {
                first_sn: expected_sn,
                last_sn: (modulo + sn - 1) % modulo,
            }
        } else {
            SequenceClassification::Repeated { sn }
        };

        let count_hfn = match classification {
            SequenceClassification::Repeated { .. } if sn > expected_sn => {
                state.hfn.saturating_sub(1)
            }
            _ => state.hfn,
        };
        let report = SequenceReport {
            classification,
            sn,
            expected_sn,
            previous_frame,
            next_frame: None,
            hfn: state.hfn,
            count_hfn,
        };

        match classification {
            SequenceClassification::Ok => debug!(
                logger,
                "{:?} SN {sn} OK in frame {frame}, HFN {}", key, report.hfn
            ),
            _ => warn!(
                logger,
                "{:?} SN {sn} in frame {frame}: {:?} (expected {expected_sn})", key, classification
            ),
        }

        if let Some((previous_sn, previous_frame)) = advanced_from {
            if let Some(previous) = self.reports.get_mut(&(key, previous_sn, previous_frame)) {
                previous.next_frame = Some(frame);
            }
        }
        self.reports.insert((key, sn, frame), report.clone());
        report
    }

    pub fn report(
        &self,
        key: &SequenceChannelKey,
        sn: u32,
        frame: FrameNum,
    ) -> Option<&SequenceReport> {
        self.reports.get(&(*key, sn, frame))
    }

    /// Current HFN of a channel.
    pub fn hfn(&self, key: &SequenceChannelKey) -> Option<u32> {
        self.channels.get(key).map(|state| state.hfn)
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }
}
