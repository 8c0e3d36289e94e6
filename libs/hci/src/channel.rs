use crate::Adapter;
use capture::{FirstVisit, FrameHistory, FrameNum};
use num_enum::TryFromPrimitive;
use slog::{Logger, debug, info};
use std::collections::HashMap;

/// A connection handle on one adapter.  Controllers reuse handles, so every
/// lookup on a key is made as of a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey {
    pub adapter: Adapter,
    pub handle: u16,
}

impl ChannelKey {
    pub fn new(adapter: Adapter, handle: u16) -> Self {
        // Only the low 12 bits of a handle are significant (Bluetooth Core Vol 4, Part E, 5.4.2).
        ChannelKey {
            adapter,
            handle: handle & 0x0fff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Acl,
    Sco,
    Le,
    Iso,
    Unknown,
}

/// Link_Type field of the BR/EDR Connection Complete and Synchronous
/// Connection Complete events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum BrEdrLinkType {
    Sco = 0x00,
    Acl = 0x01,
    Esco = 0x02,
}

impl From<BrEdrLinkType> for LinkType {
    fn from(t: BrEdrLinkType) -> Self {
        match t {
            BrEdrLinkType::Acl => LinkType::Acl,
            BrEdrLinkType::Sco | BrEdrLinkType::Esco => LinkType::Sco,
        }
    }
}

impl LinkType {
    pub fn from_br_edr(value: u8) -> Self {
        BrEdrLinkType::try_from(value)
            .map(LinkType::from)
            .unwrap_or(LinkType::Unknown)
    }
}

/// One connection on a handle, from its establishment to its disconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSession {
    pub connect_frame: FrameNum,

    // None until a disconnection is seen.
    pub disconnect_frame: Option<FrameNum>,

    pub link_type: LinkType,
}

impl ChannelSession {
    fn covers(&self, frame: FrameNum) -> bool {
        self.connect_frame <= frame && self.disconnect_frame.is_none_or(|d| d >= frame)
    }
}

/// Per handle history of connections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelTable {
    sessions: HashMap<ChannelKey, FrameHistory<ChannelSession>>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(
        &mut self,
        visit: &FirstVisit,
        key: ChannelKey,
        link_type: LinkType,
        logger: &Logger,
    ) {
        let frame = visit.frame();
        debug!(
            logger,
            "Handle {:#05x} opened as {:?} in frame {frame}", key.handle, link_type
        );
        self.sessions.entry(key).or_default().insert(
            frame,
            ChannelSession {
                connect_frame: frame,
                disconnect_frame: None,
                link_type,
            },
        );
    }

    /// Close the session that is open on `key` as of this frame.  Returns false
    /// if there is no such session, which happens routinely when the capture
    /// started after the connection was made.
    pub fn record_close(&mut self, visit: &FirstVisit, key: ChannelKey, logger: &Logger) -> bool {
        let frame = visit.frame();
        let session = self
            .sessions
            .get_mut(&key)
            .and_then(|history| history.before_mut(frame));

        match session {
            Some((_, session)) if session.disconnect_frame.is_none() => {
                session.disconnect_frame = Some(frame);
                debug!(
                    logger,
                    "Handle {:#05x} connected in frame {} closed in frame {frame}",
                    key.handle,
                    session.connect_frame
                );
                true
            }
            _ => {
                info!(
                    logger,
                    "Disconnection of handle {:#05x} in frame {frame} has no open connection",
                    key.handle
                );
                false
            }
        }
    }

    /// The session on `key` that was live at `frame`, if any.
    pub fn session_as_of(&self, key: &ChannelKey, frame: FrameNum) -> Option<&ChannelSession> {
        self.sessions
            .get(key)?
            .at_or_before(frame)
            .map(|(_, session)| session)
            .filter(|session| session.covers(frame))
    }

    pub fn link_type_as_of(&self, key: &ChannelKey, frame: FrameNum) -> LinkType {
        self.session_as_of(key, frame)
            .map_or(LinkType::Unknown, |session| session.link_type)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.values().map(FrameHistory::len).sum()
    }
}
