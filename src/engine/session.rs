//! Session: the explicitly constructed context that owns the whole engine.
//!
//! One `Session` is created at startup and passed by reference to the UI;
//! there is no ambient global state. It wires the track registry, the media
//! handle pool, and the transport together and keeps the first two in
//! lockstep: a track and its handle are created together and destroyed
//! together, never one without the other.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::handle::{AudioOutput, HandleFactory};
use crate::engine::pool::HandlePool;
use crate::engine::source::DecodedAudio;
use crate::engine::track::{MarkerId, Track, TrackId, TrackRegistry};
use crate::engine::transport::{Transport, TransportEvent, TransportSnapshot};

pub struct Session {
    registry: TrackRegistry,
    pool: HandlePool,
    transport: Transport,
    factory: Box<dyn HandleFactory>,
    max_file_bytes: u64,
}

impl Session {
    /// Build a session against the default audio output device.
    pub fn open(config: &Config) -> EngineResult<Self> {
        let output = AudioOutput::open()?;
        Ok(Self::new(config, Box::new(output)))
    }

    pub fn new(config: &Config, factory: Box<dyn HandleFactory>) -> Self {
        Self {
            registry: TrackRegistry::new(config.max_tracks),
            pool: HandlePool::new(),
            transport: Transport::new(config.default_volume),
            factory,
            max_file_bytes: config.max_file_mib * 1024 * 1024,
        }
    }

    /// Load a file as a new track. Size and count ceilings are checked
    /// before any decoding; the registry entry and the pool handle are
    /// created together. The first track loaded becomes active.
    pub fn add_track(&mut self, path: &Path) -> EngineResult<TrackId> {
        let size = fs::metadata(path)
            .map_err(|e| EngineError::Decode(format!("{}: {e}", path.display())))?
            .len();
        if size > self.max_file_bytes {
            return Err(EngineError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        if self.registry.is_full() {
            return Err(EngineError::TrackLimitExceeded {
                limit: self.registry.tracks().len(),
            });
        }

        let audio = DecodedAudio::load(path)?;
        let handle = self.factory.create(&audio)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("untitled")
            .to_string();
        let id = self
            .registry
            .add(name, path.to_path_buf(), audio.duration())?;
        self.pool.insert(id, handle);

        // New handles pick up the session-wide volume and rate
        let snapshot = self.transport.snapshot();
        let (volume, rate) = (snapshot.volume, snapshot.playback_rate);
        if let Some(handle) = self.pool.get_mut(id) {
            handle.set_volume(volume);
            handle.set_rate(rate);
        }

        if self.registry.len() == 1 {
            self.transport
                .set_active_track(&self.registry, &mut self.pool, id);
        }

        log::info!("track added: {id}");
        Ok(id)
    }

    /// Remove a track and its handle. Removing the active track promotes
    /// the first remaining one; an unknown id is a quiet no-op.
    pub fn remove_track(&mut self, id: TrackId) {
        let was_active = self.transport.snapshot().active_track_id == Some(id);
        if self.registry.remove(id).is_none() {
            log::warn!("remove of unknown track {id} ignored");
            return;
        }
        if let Some(mut handle) = self.pool.remove(id) {
            handle.stop();
        }

        if was_active {
            self.transport
                .active_track_removed(&self.registry, &mut self.pool);
        }
        log::info!("track removed: {id}");
    }

    pub fn set_active_track(&mut self, id: TrackId) {
        self.transport
            .set_active_track(&self.registry, &mut self.pool, id);
    }

    pub fn play(&mut self) -> EngineResult<()> {
        self.transport.play(&mut self.pool)
    }

    pub fn pause(&mut self) {
        self.transport.pause(&mut self.pool);
    }

    pub fn seek(&mut self, position: Duration) {
        self.transport.seek(&mut self.pool, position);
    }

    /// Seek relative to the current position; negative steps saturate at
    /// the start of the track.
    pub fn seek_by(&mut self, step: f32) {
        let current = self.transport.snapshot().current_time;
        let target = if step >= 0.0 {
            current + Duration::from_secs_f32(step)
        } else {
            current.saturating_sub(Duration::from_secs_f32(-step))
        };
        self.seek(target);
    }

    pub fn next_track(&mut self) {
        self.transport.next_track(&self.registry, &mut self.pool);
    }

    pub fn previous_track(&mut self) {
        self.transport.previous_track(&self.registry, &mut self.pool);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.transport.set_volume(&mut self.pool, volume);
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        self.transport.set_playback_rate(&mut self.pool, rate);
    }

    pub fn toggle_mute(&mut self) {
        self.transport.toggle_mute(&mut self.pool);
    }

    pub fn toggle_loop(&mut self) {
        self.transport.toggle_loop();
    }

    pub fn add_marker(
        &mut self,
        track_id: TrackId,
        time: Duration,
        label: String,
    ) -> EngineResult<MarkerId> {
        self.registry.add_marker(track_id, time, label)
    }

    /// Drop a marker on the active track at the current playhead, with an
    /// auto-numbered label.
    pub fn add_marker_at_playhead(&mut self) -> EngineResult<Option<MarkerId>> {
        let snapshot = self.transport.snapshot();
        let Some(id) = snapshot.active_track_id else {
            return Ok(None);
        };
        let time = snapshot.current_time;
        let count = self.registry.get(id).map(|t| t.markers.len()).unwrap_or(0);
        let marker = self.registry.add_marker(id, time, format!("M{}", count + 1))?;
        Ok(Some(marker))
    }

    pub fn remove_marker(&mut self, track_id: TrackId, marker_id: MarkerId) -> EngineResult<()> {
        self.registry.remove_marker(track_id, marker_id)
    }

    /// One engine tick; call once per UI frame.
    pub fn tick(&mut self) -> Vec<TransportEvent> {
        self.transport.tick(&mut self.pool)
    }

    pub fn snapshot(&self) -> &TransportSnapshot {
        self.transport.snapshot()
    }

    pub fn tracks(&self) -> &[Track] {
        self.registry.tracks()
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.registry.get(id)
    }

    /// Ids present in the pool; used to check registry/pool lockstep.
    pub fn handle_ids(&self) -> Vec<TrackId> {
        self.pool.ids().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::handle::{MediaHandle, Readiness};
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct QuietHandle {
        running: bool,
        position: Duration,
        duration: Duration,
    }

    impl MediaHandle for QuietHandle {
        fn start(&mut self) -> EngineResult<()> {
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn seek(&mut self, position: Duration) {
            self.position = position.min(self.duration);
        }

        fn position(&self) -> Duration {
            self.position
        }

        fn set_volume(&mut self, _volume: f32) {}

        fn set_rate(&mut self, _rate: f32) {}

        fn readiness(&self) -> Readiness {
            Readiness::Ready
        }

        fn buffered_fraction(&self) -> f32 {
            1.0
        }

        fn finished(&self) -> bool {
            false
        }
    }

    struct QuietFactory;

    impl HandleFactory for QuietFactory {
        fn create(&self, audio: &DecodedAudio) -> EngineResult<Box<dyn MediaHandle>> {
            Ok(Box::new(QuietHandle {
                running: false,
                position: Duration::ZERO,
                duration: audio.duration(),
            }))
        }
    }

    fn write_wav(dir: &TempDir, name: &str, secs: u32) -> PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..(secs * 8000) {
            writer.write_sample((i % 64) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn session(max_tracks: usize, max_file_mib: u64) -> Session {
        let config = Config {
            max_tracks,
            max_file_mib,
            ..Default::default()
        };
        Session::new(&config, Box::new(QuietFactory))
    }

    fn assert_lockstep(session: &Session) {
        let registry: HashSet<TrackId> = session.tracks().iter().map(|t| t.id).collect();
        let pool: HashSet<TrackId> = session.handle_ids().into_iter().collect();
        assert_eq!(registry, pool);
    }

    #[test]
    fn test_registry_and_pool_stay_in_lockstep() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);

        let a = session.add_track(&write_wav(&dir, "a.wav", 2)).unwrap();
        assert_lockstep(&session);
        let b = session.add_track(&write_wav(&dir, "b.wav", 1)).unwrap();
        assert_lockstep(&session);

        session.remove_track(a);
        assert_lockstep(&session);
        session.remove_track(b);
        assert_lockstep(&session);
        assert!(session.tracks().is_empty());
        assert!(session.handle_ids().is_empty());
    }

    #[test]
    fn test_first_track_becomes_active() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);

        let a = session.add_track(&write_wav(&dir, "a.wav", 2)).unwrap();
        assert_eq!(session.snapshot().active_track_id, Some(a));
        assert_eq!(session.snapshot().duration, Duration::from_secs(2));

        // A second track does not steal the active slot
        session.add_track(&write_wav(&dir, "b.wav", 1)).unwrap();
        assert_eq!(session.snapshot().active_track_id, Some(a));
    }

    #[test]
    fn test_removing_active_promotes_first_remaining() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);

        let a = session.add_track(&write_wav(&dir, "a.wav", 2)).unwrap();
        let b = session.add_track(&write_wav(&dir, "b.wav", 1)).unwrap();
        session.play().unwrap();
        session.seek(Duration::from_secs(1));

        session.remove_track(a);

        assert_eq!(session.snapshot().active_track_id, Some(b));
        assert_eq!(session.snapshot().duration, Duration::from_secs(1));
        assert_eq!(session.snapshot().current_time, Duration::ZERO);
        assert!(!session.snapshot().is_playing);
    }

    #[test]
    fn test_removing_last_track_goes_idle() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);
        let a = session.add_track(&write_wav(&dir, "a.wav", 1)).unwrap();
        session.play().unwrap();

        session.remove_track(a);

        assert_eq!(session.snapshot().active_track_id, None);
        assert!(!session.snapshot().is_playing);
        assert_eq!(session.snapshot().current_time, Duration::ZERO);
        assert_eq!(session.snapshot().duration, Duration::ZERO);
    }

    #[test]
    fn test_track_limit_rejected_before_decode() {
        let dir = TempDir::new().unwrap();
        let mut session = session(2, 512);
        session.add_track(&write_wav(&dir, "a.wav", 1)).unwrap();
        session.add_track(&write_wav(&dir, "b.wav", 1)).unwrap();

        let result = session.add_track(&write_wav(&dir, "c.wav", 1));

        assert!(matches!(
            result,
            Err(EngineError::TrackLimitExceeded { .. })
        ));
        assert_eq!(session.tracks().len(), 2);
        assert_lockstep(&session);
    }

    #[test]
    fn test_oversize_file_rejected_without_handle() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 0); // ceiling of zero bytes
        let path = write_wav(&dir, "big.wav", 1);

        let result = session.add_track(&path);

        assert!(matches!(result, Err(EngineError::FileTooLarge { .. })));
        assert!(session.tracks().is_empty());
        assert!(session.handle_ids().is_empty());
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mix.ogg");
        std::fs::write(&path, b"not audio").unwrap();
        let mut session = session(10, 512);

        let result = session.add_track(&path);

        assert!(matches!(result, Err(EngineError::Decode(_))));
        assert_lockstep(&session);
    }

    #[test]
    fn test_remove_unknown_track_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);
        session.add_track(&write_wav(&dir, "a.wav", 1)).unwrap();

        session.remove_track(uuid::Uuid::new_v4());

        assert_eq!(session.tracks().len(), 1);
        assert_lockstep(&session);
    }

    #[test]
    fn test_seek_by_saturates_at_start() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);
        session.add_track(&write_wav(&dir, "a.wav", 4)).unwrap();
        session.seek(Duration::from_secs(1));

        session.seek_by(-5.0);
        assert_eq!(session.snapshot().current_time, Duration::ZERO);

        session.seek_by(2.5);
        assert_eq!(
            session.snapshot().current_time,
            Duration::from_secs_f32(2.5)
        );
    }

    #[test]
    fn test_marker_at_playhead_labels_in_sequence() {
        let dir = TempDir::new().unwrap();
        let mut session = session(10, 512);
        let a = session.add_track(&write_wav(&dir, "a.wav", 4)).unwrap();
        session.seek(Duration::from_secs(2));

        session.add_marker_at_playhead().unwrap();
        session.seek(Duration::from_secs(3));
        session.add_marker_at_playhead().unwrap();

        let track = session.track(a).unwrap();
        assert_eq!(track.markers.len(), 2);
        assert_eq!(track.markers[0].label, "M1");
        assert_eq!(track.markers[0].time, Duration::from_secs(2));
        assert_eq!(track.markers[1].label, "M2");
    }

    #[test]
    fn test_marker_with_no_tracks_is_none() {
        let mut session = session(10, 512);
        assert!(session.add_marker_at_playhead().unwrap().is_none());
    }
}
