//! Progress ticker: the single live loop that mirrors handle time.
//!
//! The ticker itself is just a tag: which track it reports on, and under
//! which switch generation it was started. The transport polls it once per
//! engine tick and a ticker whose tag no longer matches the live state is
//! discarded instead of applied. Starting a new ticker always replaces the
//! old one, so at most one loop is ever live.

use crate::engine::track::TrackId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTicker {
    track_id: TrackId,
    generation: u64,
}

impl ProgressTicker {
    pub fn new(track_id: TrackId, generation: u64) -> Self {
        Self {
            track_id,
            generation,
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Whether this ticker is still the live one for the given track and
    /// switch generation. A stale ticker must terminate without reporting.
    pub fn matches(&self, active: Option<TrackId>, generation: u64) -> bool {
        active == Some(self.track_id) && self.generation == generation
    }
}
