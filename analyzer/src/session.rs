use crate::config::{Config, SnLengthDefaults};
use crate::trace::{FrameInput, Trace};
use anyhow::Result;
use capture::{Frame, FrameNum};
use hci::{HciAnnotations, HciTracker};
use pdcp::{
    Algorithms, IntegrityVerdict, PdcpAnnotations, PdcpTracker, PduContext, SnLength,
};
use slog::{Logger, info, o, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Hci(HciAnnotations),
    Pdcp(PdcpAnnotations),
    /// The PDU could not be analyzed.  The driver still shows its raw bytes.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameAnnotations {
    pub frame: FrameNum,
    pub annotations: Vec<Annotation>,
}

/// Counts of what the first pass found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub frames: usize,
    pub correlations: usize,
    pub sequence_anomalies: usize,
    pub integrity_mismatches: usize,
    pub malformed: usize,
}

/// All analysis state for one open capture.
pub struct CaptureSession {
    hci: HciTracker,
    pdcp: PdcpTracker,
    sn_lengths: SnLengthDefaults,
    stats: SessionStats,
    logger: Logger,
}

impl CaptureSession {
    pub fn new(config: &Config, logger: Logger) -> Self {
        info!(
            logger,
            "Capture session opened, default algorithms {:?}/{:?}",
            config.defaults.ciphering,
            config.defaults.integrity
        );
        let mut pdcp = PdcpTracker::new(config.defaults, logger.new(o!("layer" => "pdcp")));
        for (ue_id, keys) in config.ue_keys.iter() {
            pdcp.keys_mut().set_configured(*ue_id, *keys);
        }
        CaptureSession {
            hci: HciTracker::new(logger.new(o!("layer" => "hci"))),
            pdcp,
            sn_lengths: config.sn_lengths,
            stats: SessionStats::default(),
            logger,
        }
    }

    pub fn hci(&self) -> &HciTracker {
        &self.hci
    }

    pub fn pdcp(&self) -> &PdcpTracker {
        &self.pdcp
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Analyze everything the driver found in one frame.  Never fails: a
    /// problem with one input becomes a `Malformed` annotation.
    pub fn process(&mut self, frame: &Frame, inputs: &[FrameInput]) -> FrameAnnotations {
        let first_visit = !frame.visited();
        let mut annotations = Vec::new();
        for input in inputs {
            let annotation = match self.process_input(frame, input) {
                Ok(Some(a)) => a,
                Ok(None) => continue,
                Err(e) => {
                    if first_visit {
                        warn!(self.logger, "Frame {} - {e}", frame.num);
                    }
                    Annotation::Malformed(e.to_string())
                }
            };
            if first_visit {
                self.count(&annotation);
            }
            annotations.push(annotation);
        }
        if first_visit {
            self.stats.frames += 1;
        }
        FrameAnnotations {
            frame: frame.num,
            annotations,
        }
    }

    fn process_input(&mut self, frame: &Frame, input: &FrameInput) -> Result<Option<Annotation>> {
        Ok(Some(match *input {
            FrameInput::Hci { adapter, event } => {
                Annotation::Hci(self.hci.process(frame, adapter, &event))
            }
            FrameInput::Pdcp {
                ue,
                plane,
                channel,
                direction,
                sn_length,
                ref pdu,
            } => {
                let sn_length = match sn_length {
                    Some(bits) => SnLength::from_bits(bits)?,
                    None => self.sn_lengths.for_plane(plane)?,
                };
                let context = PduContext {
                    ue_id: ue,
                    plane,
                    channel_id: channel,
                    direction,
                    sn_length,
                };
                Annotation::Pdcp(self.pdcp.analyze_pdu(frame, &context, pdu)?)
            }
            FrameInput::SecurityConfigured {
                ue,
                ciphering,
                integrity,
            } => {
                self.pdcp.security_configured(
                    frame,
                    ue,
                    Algorithms {
                        ciphering,
                        integrity,
                    },
                );
                return Ok(None);
            }
            FrameInput::SecurityConfigurationFailed { ue } => {
                self.pdcp.security_configuration_failed(frame, ue);
                return Ok(None);
            }
            FrameInput::KeySignalled { ue, key_type, key } => {
                self.pdcp.key_signalled(frame, ue, key_type, key);
                return Ok(None);
            }
        }))
    }

    fn count(&mut self, annotation: &Annotation) {
        match annotation {
            Annotation::Hci(a) => self.stats.correlations += a.correlations.len(),
            Annotation::Pdcp(a) => {
                if a.sequence.as_ref().is_some_and(|s| !s.is_ok()) {
                    self.stats.sequence_anomalies += 1;
                }
                if let Some(IntegrityVerdict::Mismatch { .. }) = a.outcome.integrity {
                    self.stats.integrity_mismatches += 1;
                }
            }
            Annotation::Malformed(_) => self.stats.malformed += 1,
        }
    }

    /// Run every frame of a trace through the session, either in a first
    /// pass or as a revisit.
    pub fn run_pass(&mut self, trace: &Trace, visited: bool) -> Vec<FrameAnnotations> {
        trace
            .frames
            .iter()
            .map(|f| self.process(&f.frame(visited), &f.inputs))
            .collect()
    }

    /// Tear down the session.
    pub fn close(self) -> SessionStats {
        let stats = self.stats;
        info!(
            self.logger,
            "Capture session closed - {} frames, {} correlations, {} sequence anomalies, {} integrity mismatches, {} malformed",
            stats.frames,
            stats.correlations,
            stats.sequence_anomalies,
            stats.integrity_mismatches,
            stats.malformed
        );
        stats
    }
}
