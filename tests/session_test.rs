//! End-to-end A/B comparison flow against a silent handle factory.

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use abx_studio::config::Config;
use abx_studio::engine::handle::{HandleFactory, MediaHandle, Readiness};
use abx_studio::engine::source::DecodedAudio;
use abx_studio::engine::{EngineResult, Session};

struct SilentHandle {
    running: bool,
    position: Duration,
    duration: Duration,
    volume: f32,
    rate: f32,
}

impl MediaHandle for SilentHandle {
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

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

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

struct SilentFactory;

impl HandleFactory for SilentFactory {
    fn create(&self, audio: &DecodedAudio) -> EngineResult<Box<dyn MediaHandle>> {
        Ok(Box::new(SilentHandle {
            running: false,
            position: Duration::ZERO,
            duration: audio.duration(),
            volume: 1.0,
            rate: 1.0,
        }))
    }
}

fn write_wav(dir: &TempDir, name: &str, secs: u32) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(secs * 8000 * 2) {
        writer.write_sample((i % 128) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_ab_comparison_flow() {
    let dir = TempDir::new().unwrap();
    let config = Config::new();
    let mut session = Session::new(&config, Box::new(SilentFactory));

    // Load two takes of different length
    let take_a = session.add_track(&write_wav(&dir, "take_a.wav", 4)).unwrap();
    let take_b = session.add_track(&write_wav(&dir, "take_b.wav", 2)).unwrap();
    assert_eq!(session.snapshot().active_track_id, Some(take_a));

    // Listen into the longer take
    session.seek(Duration::from_secs(3));
    session.play().unwrap();
    assert!(session.snapshot().is_playing);

    // Flip to the shorter take: position carries over, clamped to its end
    session.set_active_track(take_b);
    assert_eq!(session.snapshot().active_track_id, Some(take_b));
    assert_eq!(session.snapshot().current_time, Duration::from_secs(2));
    assert_eq!(session.snapshot().duration, Duration::from_secs(2));

    // The ready handle resumes on the next tick, still reporting playing
    session.tick();
    assert!(session.snapshot().is_playing);

    // Flip back and forth without losing the playhead
    session.set_active_track(take_a);
    session.tick();
    assert_eq!(session.snapshot().current_time, Duration::from_secs(2));
    assert!(session.snapshot().is_playing);

    session.pause();
    assert!(!session.snapshot().is_playing);

    // Removing the active take promotes the remaining one, paused at zero
    session.remove_track(take_a);
    assert_eq!(session.snapshot().active_track_id, Some(take_b));
    assert_eq!(session.snapshot().current_time, Duration::ZERO);
    assert!(!session.snapshot().is_playing);
    assert_eq!(session.handle_ids(), vec![take_b]);
}

#[test]
fn test_cycling_preserves_play_state_and_volume() {
    let dir = TempDir::new().unwrap();
    let config = Config::new();
    let mut session = Session::new(&config, Box::new(SilentFactory));

    session.add_track(&write_wav(&dir, "a.wav", 3)).unwrap();
    session.add_track(&write_wav(&dir, "b.wav", 3)).unwrap();
    session.add_track(&write_wav(&dir, "c.wav", 3)).unwrap();

    session.set_volume(0.25);
    session.play().unwrap();

    let start = session.snapshot().active_track_id.unwrap();
    for _ in 0..3 {
        session.next_track();
        session.tick();
        assert!(session.snapshot().is_playing);
        assert_eq!(session.snapshot().volume, 0.25);
    }
    // Three steps through three tracks wraps back to the start
    assert_eq!(session.snapshot().active_track_id, Some(start));
}
