//! Track registry: the ordered list of loaded tracks and their markers.
//!
//! Pure data and list mutation. Nothing in here touches audio output; the
//! registry only records what has been loaded, in which order, and where the
//! user has dropped markers. Handle lifecycle is kept in lockstep by the
//! session layer.

use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::COLOR_PALETTE;
use crate::engine::error::{EngineError, EngineResult};

pub type TrackId = Uuid;
pub type MarkerId = Uuid;

/// A labeled point in time on one track. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub time: Duration,
    pub label: String,
    pub color: (u8, u8, u8),
}

/// One loaded audio file. Insertion order in the registry is display order.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub path: PathBuf,
    pub duration: Duration,
    pub color: (u8, u8, u8),
    pub markers: Vec<Marker>,
    markers_assigned: usize,
}

impl Track {
    fn next_marker_color(&mut self) -> (u8, u8, u8) {
        let color = COLOR_PALETTE[self.markers_assigned % COLOR_PALETTE.len()];
        self.markers_assigned += 1;
        color
    }
}

/// Ordered collection of tracks, bounded by a configurable maximum.
#[derive(Debug)]
pub struct TrackRegistry {
    tracks: Vec<Track>,
    max_tracks: usize,
    colors_assigned: usize,
}

impl TrackRegistry {
    pub fn new(max_tracks: usize) -> Self {
        Self {
            tracks: Vec::new(),
            max_tracks,
            colors_assigned: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tracks.len() >= self.max_tracks
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn first_id(&self) -> Option<TrackId> {
        self.tracks.first().map(|t| t.id)
    }

    /// Append a track, assigning the next palette color. The caller has
    /// already decoded the file; `duration` is the decoded length.
    pub fn add(&mut self, name: String, path: PathBuf, duration: Duration) -> EngineResult<TrackId> {
        if self.is_full() {
            return Err(EngineError::TrackLimitExceeded {
                limit: self.max_tracks,
            });
        }

        let color = COLOR_PALETTE[self.colors_assigned % COLOR_PALETTE.len()];
        self.colors_assigned += 1;

        let track = Track {
            id: Uuid::new_v4(),
            name,
            path,
            duration,
            color,
            markers: Vec::new(),
            markers_assigned: 0,
        };
        let id = track.id;
        self.tracks.push(track);
        Ok(id)
    }

    /// Remove a track, returning it so the caller can retire its handle.
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(index))
    }

    /// The adjacent track id in display order, wrapping at both ends.
    /// Returns `None` for an empty registry or an unknown id.
    pub fn neighbor(&self, id: TrackId, forward: bool) -> Option<TrackId> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        let len = self.tracks.len();
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        Some(self.tracks[next].id)
    }

    /// Drop a marker on a track. Times past the end of the track are clamped
    /// to its duration.
    pub fn add_marker(
        &mut self,
        track_id: TrackId,
        time: Duration,
        label: String,
    ) -> EngineResult<MarkerId> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or(EngineError::TrackNotFound(track_id))?;

        let color = track.next_marker_color();
        let marker = Marker {
            id: Uuid::new_v4(),
            time: time.min(track.duration),
            label,
            color,
        };
        let id = marker.id;
        track.markers.push(marker);
        Ok(id)
    }

    pub fn remove_marker(&mut self, track_id: TrackId, marker_id: MarkerId) -> EngineResult<()> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or(EngineError::TrackNotFound(track_id))?;

        track.markers.retain(|m| m.id != marker_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_named(registry: &mut TrackRegistry, name: &str, secs: u64) -> TrackId {
        registry
            .add(name.to_string(), PathBuf::from(name), Duration::from_secs(secs))
            .unwrap()
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut registry = TrackRegistry::new(10);
        add_named(&mut registry, "mix-a.wav", 120);
        add_named(&mut registry, "mix-b.wav", 95);
        add_named(&mut registry, "mix-c.wav", 60);

        let names: Vec<&str> = registry.tracks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["mix-a.wav", "mix-b.wav", "mix-c.wav"]);
    }

    #[test]
    fn test_track_limit() {
        let mut registry = TrackRegistry::new(10);
        for i in 0..10 {
            add_named(&mut registry, &format!("t{i}.wav"), 10);
        }
        assert!(registry.is_full());

        let result = registry.add(
            "t10.wav".to_string(),
            PathBuf::from("t10.wav"),
            Duration::from_secs(10),
        );
        assert!(matches!(
            result,
            Err(EngineError::TrackLimitExceeded { limit: 10 })
        ));
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_colors_cycle_without_repeating_early() {
        let mut registry = TrackRegistry::new(10);
        for i in 0..COLOR_PALETTE.len().min(8) {
            add_named(&mut registry, &format!("t{i}.wav"), 10);
        }

        let colors: Vec<_> = registry.tracks().iter().map(|t| t.color).collect();
        let mut deduped = colors.clone();
        deduped.dedup();
        assert_eq!(colors.len(), deduped.len());
    }

    #[test]
    fn test_color_counter_survives_removal() {
        let mut registry = TrackRegistry::new(10);
        let a = add_named(&mut registry, "a.wav", 10);
        let color_a = registry.get(a).unwrap().color;

        registry.remove(a);
        let b = add_named(&mut registry, "b.wav", 10);

        // The counter keeps advancing, so b does not reuse a's color
        assert_ne!(registry.get(b).unwrap().color, color_a);
    }

    #[test]
    fn test_remove_unknown_id_is_none() {
        let mut registry = TrackRegistry::new(10);
        add_named(&mut registry, "a.wav", 10);
        assert!(registry.remove(Uuid::new_v4()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_neighbor_wraps() {
        let mut registry = TrackRegistry::new(10);
        let a = add_named(&mut registry, "a.wav", 10);
        let b = add_named(&mut registry, "b.wav", 10);
        let c = add_named(&mut registry, "c.wav", 10);

        assert_eq!(registry.neighbor(a, true), Some(b));
        assert_eq!(registry.neighbor(c, true), Some(a));
        assert_eq!(registry.neighbor(a, false), Some(c));
        assert_eq!(registry.neighbor(b, false), Some(a));
    }

    #[test]
    fn test_neighbor_single_track_is_itself() {
        let mut registry = TrackRegistry::new(10);
        let a = add_named(&mut registry, "a.wav", 10);
        assert_eq!(registry.neighbor(a, true), Some(a));
        assert_eq!(registry.neighbor(a, false), Some(a));
    }

    #[test]
    fn test_add_marker_clamps_time() {
        let mut registry = TrackRegistry::new(10);
        let a = add_named(&mut registry, "a.wav", 60);

        registry
            .add_marker(a, Duration::from_secs(90), "chorus".to_string())
            .unwrap();

        let track = registry.get(a).unwrap();
        assert_eq!(track.markers.len(), 1);
        assert_eq!(track.markers[0].time, Duration::from_secs(60));
        assert_eq!(track.markers[0].label, "chorus");
    }

    #[test]
    fn test_marker_on_unknown_track() {
        let mut registry = TrackRegistry::new(10);
        let result = registry.add_marker(Uuid::new_v4(), Duration::ZERO, "x".to_string());
        assert!(matches!(result, Err(EngineError::TrackNotFound(_))));
    }

    #[test]
    fn test_remove_marker() {
        let mut registry = TrackRegistry::new(10);
        let a = add_named(&mut registry, "a.wav", 60);
        let m1 = registry
            .add_marker(a, Duration::from_secs(10), "verse".to_string())
            .unwrap();
        let m2 = registry
            .add_marker(a, Duration::from_secs(30), "chorus".to_string())
            .unwrap();

        registry.remove_marker(a, m1).unwrap();
        let track = registry.get(a).unwrap();
        assert_eq!(track.markers.len(), 1);
        assert_eq!(track.markers[0].id, m2);

        // Removing an already-removed marker is a quiet success
        registry.remove_marker(a, m1).unwrap();
        assert_eq!(registry.get(a).unwrap().markers.len(), 1);
    }
}
