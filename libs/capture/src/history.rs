use crate::FrameNum;
use std::collections::BTreeMap;

/// Values indexed by the frame in which they were recorded, supporting
/// "latest entry at or before frame N" lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHistory<T>(BTreeMap<FrameNum, T>);

impl<T> Default for FrameHistory<T> {
    fn default() -> Self {
        FrameHistory(BTreeMap::new())
    }
}

impl<T> FrameHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` against `frame`, returning any value it replaces.
    pub fn insert(&mut self, frame: FrameNum, value: T) -> Option<T> {
        self.0.insert(frame, value)
    }

    pub fn get(&self, frame: FrameNum) -> Option<&T> {
        self.0.get(&frame)
    }

    pub fn get_mut(&mut self, frame: FrameNum) -> Option<&mut T> {
        self.0.get_mut(&frame)
    }

    /// Latest entry recorded at or before `frame`.
    pub fn at_or_before(&self, frame: FrameNum) -> Option<(FrameNum, &T)> {
        self.0.range(..=frame).next_back().map(|(k, v)| (*k, v))
    }

    /// Latest entry recorded strictly before `frame`.
    pub fn before_mut(&mut self, frame: FrameNum) -> Option<(FrameNum, &mut T)> {
        self.0.range_mut(..frame).next_back().map(|(k, v)| (*k, v))
    }

    /// Entries recorded at or before `frame`, newest first.
    pub fn newest_at_or_before(&self, frame: FrameNum) -> impl Iterator<Item = (FrameNum, &T)> {
        self.0.range(..=frame).rev().map(|(k, v)| (*k, v))
    }

    /// Entries recorded strictly before `frame`, newest first.
    pub fn newest_before_mut(
        &mut self,
        frame: FrameNum,
    ) -> impl Iterator<Item = (FrameNum, &mut T)> {
        self.0.range_mut(..frame).rev().map(|(k, v)| (*k, v))
    }

    pub fn latest(&self) -> Option<(FrameNum, &T)> {
        self.0.iter().next_back().map(|(k, v)| (*k, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameNum, &T)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
