use crate::Adapter;
use capture::{FirstVisit, FrameHistory, FrameNum, FrameStamp};
use slog::{Logger, debug, info};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpcodeKey {
    pub adapter: Adapter,
    pub opcode: u16,
}

impl OpcodeKey {
    pub fn new(adapter: Adapter, opcode: u16) -> Self {
        OpcodeKey { adapter, opcode }
    }
}

/// How an event frame relates to an earlier command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeStatus {
    /// An event conventionally paired with the command, that carries no opcode.
    Normal,
    /// Command accepted, the result follows later.
    Pending,
    /// The command's outcome.
    Result,
}

/// One command and the events that answered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTransaction {
    pub command: FrameStamp,
    pub pending: Option<FrameStamp>,
    pub response: Option<FrameStamp>,
}

impl CommandTransaction {
    pub fn is_closed(&self) -> bool {
        self.response.is_some()
    }
}

/// Which step of a transaction a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRole {
    Command,
    Pending,
    Response,
}

/// Correlation annotation for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub opcode: u16,
    pub role: TransactionRole,
    pub command_frame: FrameNum,
    pub pending_frame: Option<FrameNum>,
    pub response_frame: Option<FrameNum>,
    pub command_to_pending_ms: Option<f64>,
    pub pending_to_response_ms: Option<f64>,
    pub command_to_response_ms: Option<f64>,
}

impl Correlation {
    fn new(opcode: u16, role: TransactionRole, t: &CommandTransaction) -> Self {
        let between = |a: Option<FrameStamp>, b: Option<FrameStamp>| {
            a.zip(b).map(|(a, b)| a.millis_until(&b))
        };
        Correlation {
            opcode,
            role,
            command_frame: t.command.frame,
            pending_frame: t.pending.map(|s| s.frame),
            response_frame: t.response.map(|s| s.frame),
            command_to_pending_ms: between(Some(t.command), t.pending),
            pending_to_response_ms: between(t.pending, t.response),
            command_to_response_ms: between(Some(t.command), t.response),
        }
    }
}

/// Matches command status / completion events back to the commands that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandCorrelator {
    transactions: HashMap<OpcodeKey, FrameHistory<CommandTransaction>>,

    // Frames that applied a transition, mapped to the command frame of the transaction.
    applied: HashMap<(OpcodeKey, FrameNum), FrameNum>,
}

impl CommandCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A command frame opens a new transaction.  An earlier transaction for the
    /// same opcode that was never answered is left as it is.
    pub fn record_command(&mut self, visit: &FirstVisit, key: OpcodeKey, logger: &Logger) {
        let stamp = visit.stamp();
        let history = self.transactions.entry(key).or_default();
        if let Some((frame, _)) = history.latest().filter(|(_, t)| !t.is_closed()) {
            debug!(
                logger,
                "Opcode {:#06x} issued again before command in frame {frame} was answered",
                key.opcode
            );
        }
        history.insert(
            stamp.frame,
            CommandTransaction {
                command: stamp,
                pending: None,
                response: None,
            },
        );
        self.applied.insert((key, stamp.frame), stamp.frame);
        debug!(logger, "Opcode {:#06x} issued in frame {}", key.opcode, stamp.frame);
    }

    /// Apply a pending or completion event to the most recent transaction for
    /// this opcode that can take it.  At most one transition is applied per
    /// frame and opcode.
    pub fn record_status(
        &mut self,
        visit: &FirstVisit,
        key: OpcodeKey,
        status: OpcodeStatus,
        logger: &Logger,
    ) -> bool {
        let stamp = visit.stamp();
        if self.applied.contains_key(&(key, stamp.frame)) {
            return false;
        }

        let Some(history) = self.transactions.get_mut(&key) else {
            info!(
                logger,
                "No command seen for opcode {:#06x} {status:?} in frame {}", key.opcode, stamp.frame
            );
            return false;
        };

        // Walk back past closed transactions to the latest one still open.
        let Some((command_frame, transaction)) = history
            .newest_before_mut(stamp.frame)
            .find(|(_, t)| !t.is_closed())
        else {
            info!(
                logger,
                "No open command for opcode {:#06x} {status:?} in frame {}",
                key.opcode,
                stamp.frame
            );
            return false;
        };

        match status {
            OpcodeStatus::Pending => {
                if transaction.pending.is_some() {
                    return false;
                }
                transaction.pending = Some(stamp);
            }
            OpcodeStatus::Result | OpcodeStatus::Normal => {
                transaction.response = Some(stamp);
            }
        }
        debug!(
            logger,
            "Opcode {:#06x} command in frame {command_frame} {status:?} in frame {}",
            key.opcode,
            stamp.frame
        );
        self.applied.insert((key, stamp.frame), command_frame);
        true
    }

    /// The correlation that `frame` takes part in for this opcode.
    pub fn lookup(&self, key: OpcodeKey, frame: FrameNum) -> Option<Correlation> {
        let command_frame = *self.applied.get(&(key, frame))?;
        let transaction = self.transactions.get(&key)?.get(command_frame)?;
        let role = if transaction.command.frame == frame {
            TransactionRole::Command
        } else if transaction.pending.is_some_and(|s| s.frame == frame) {
            TransactionRole::Pending
        } else if transaction.response.is_some_and(|s| s.frame == frame) {
            TransactionRole::Response
        } else {
            return None;
        };
        Some(Correlation::new(key.opcode, role, transaction))
    }

    /// All recorded transactions for an opcode, oldest first.
    pub fn transactions(&self, key: OpcodeKey) -> impl Iterator<Item = &CommandTransaction> {
        self.transactions
            .get(&key)
            .into_iter()
            .flat_map(|history| history.iter().map(|(_, t)| t))
    }
}
