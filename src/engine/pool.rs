//! The media handle pool: one playable handle per loaded track.
//!
//! Keyed by track id, created and destroyed in lockstep with the registry.
//! Dropping a handle drops its sink and its reference to the decoded sample
//! buffer, which is what releases the memory for removed tracks.

use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::handle::MediaHandle;
use crate::engine::track::TrackId;

#[derive(Default)]
pub struct HandlePool {
    handles: HashMap<Uuid, Box<dyn MediaHandle>>,
}

impl HandlePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TrackId, handle: Box<dyn MediaHandle>) {
        self.handles.insert(id, handle);
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Box<dyn MediaHandle>> {
        self.handles.remove(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn get(&self, id: TrackId) -> Option<&dyn MediaHandle> {
        self.handles.get(&id).map(|h| h.as_ref())
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Box<dyn MediaHandle>> {
        self.handles.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.handles.keys().copied()
    }

    /// Apply a volume to every handle, active or not.
    pub fn set_volume_all(&mut self, volume: f32) {
        for handle in self.handles.values_mut() {
            handle.set_volume(volume);
        }
    }

    /// Apply a playback rate to every handle, active or not.
    pub fn set_rate_all(&mut self, rate: f32) {
        for handle in self.handles.values_mut() {
            handle.set_rate(rate);
        }
    }

    /// Number of handles currently advancing. The transport keeps this at
    /// most one; it is exposed so tests and debug assertions can check.
    pub fn running_count(&self) -> usize {
        self.handles.values().filter(|h| h.is_running()).count()
    }
}
