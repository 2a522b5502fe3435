//! Transport state machine: the single source of truth for playback.
//!
//! Owns which track is active, whether it is advancing, at what position and
//! rate, and whether loop/mute are engaged. Every run/stop/seek on a handle
//! goes through here, which is how the central invariant holds: at most one
//! handle is ever advancing, because the outgoing handle is stopped before
//! the incoming one is touched.
//!
//! Deferred work (the resume after a track switch, the per-tick progress
//! mirror) is tagged with a switch generation. Any tagged work whose
//! generation no longer matches is discarded on the next tick instead of
//! applied, so a second switch issued mid-resume silently abandons the first.

use std::time::{Duration, Instant};

use crate::constants::{
    FALLBACK_UNMUTE_VOLUME, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE, RESUME_READY_TIMEOUT_MS,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::handle::Readiness;
use crate::engine::pool::HandlePool;
use crate::engine::ticker::ProgressTicker;
use crate::engine::track::{TrackId, TrackRegistry};

/// Where the transport currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No active track
    Idle,
    /// Active track selected, not advancing
    Paused,
    /// Active track advancing
    Playing,
    /// Active track changed while a playing intent is carried over;
    /// resume is parked until the incoming handle reports ready
    Switching,
}

/// Readable snapshot of the transport, consumed by the UI every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSnapshot {
    pub is_playing: bool,
    pub current_time: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub active_track_id: Option<TrackId>,
    pub playback_rate: f32,
    pub loop_enabled: bool,
    pub buffered_fraction: f32,
    /// Volume stashed by mute; `Some` doubles as the muted flag
    pub muted_previous_volume: Option<f32>,
}

/// Notifications produced by [`Transport::tick`] for the UI to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    TrackEnded { track_id: TrackId },
    Looped { track_id: TrackId },
    ResumeFailed { track_id: TrackId, reason: String },
}

#[derive(Debug, Clone, Copy)]
struct PendingResume {
    track_id: TrackId,
    generation: u64,
    deadline: Instant,
}

pub struct Transport {
    snapshot: TransportSnapshot,
    phase: Phase,
    generation: u64,
    ticker: Option<ProgressTicker>,
    pending_resume: Option<PendingResume>,
    ready_timeout: Duration,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        Self {
            snapshot: TransportSnapshot {
                is_playing: false,
                current_time: Duration::ZERO,
                duration: Duration::ZERO,
                volume: volume.clamp(0.0, 1.0),
                active_track_id: None,
                playback_rate: 1.0,
                loop_enabled: false,
                buffered_fraction: 0.0,
                muted_previous_volume: None,
            },
            phase: Phase::Idle,
            generation: 0,
            ticker: None,
            pending_resume: None,
            ready_timeout: Duration::from_millis(RESUME_READY_TIMEOUT_MS),
        }
    }

    pub fn snapshot(&self) -> &TransportSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start the active track. A call with no active track is a warned
    /// no-op; a rejected start reverts to paused and surfaces the error.
    pub fn play(&mut self, pool: &mut HandlePool) -> EngineResult<()> {
        let Some(id) = self.snapshot.active_track_id else {
            log::warn!("play requested with no active track");
            return Ok(());
        };
        if self.phase == Phase::Playing || self.pending_resume.is_some() {
            return Ok(());
        }
        let Some(handle) = pool.get_mut(id) else {
            log::warn!("play requested but no handle for {id}");
            return Ok(());
        };

        // Restart from the top when the track already ran to its end
        if handle.finished() {
            handle.seek(Duration::ZERO);
            self.snapshot.current_time = Duration::ZERO;
        }

        match handle.start() {
            Ok(()) => {
                self.phase = Phase::Playing;
                self.snapshot.is_playing = true;
                self.ticker = Some(ProgressTicker::new(id, self.generation));
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Paused;
                self.snapshot.is_playing = false;
                Err(e)
            }
        }
    }

    /// Stop the active track and cancel the ticker and any parked resume.
    /// Idempotent.
    pub fn pause(&mut self, pool: &mut HandlePool) {
        if let Some(id) = self.snapshot.active_track_id {
            if let Some(handle) = pool.get_mut(id) {
                handle.stop();
            }
            self.phase = Phase::Paused;
        } else {
            self.phase = Phase::Idle;
        }
        self.ticker = None;
        self.pending_resume = None;
        self.snapshot.is_playing = false;
    }

    /// Move the playhead of the active track, clamped to its duration.
    /// The snapshot is updated immediately, not on the next tick.
    pub fn seek(&mut self, pool: &mut HandlePool, position: Duration) {
        let Some(id) = self.snapshot.active_track_id else {
            return;
        };
        let Some(handle) = pool.get_mut(id) else {
            return;
        };
        let target = position.min(self.snapshot.duration);
        handle.seek(target);
        self.snapshot.current_time = target;
    }

    /// Make another track the active one, carrying over position, volume,
    /// rate, and the playing intent.
    ///
    /// The outgoing handle is stopped before the incoming handle is touched.
    /// If the transport was playing, the resume on the incoming handle is
    /// parked until that handle reports ready, bounded by a deadline; a
    /// further switch before then abandons the parked resume.
    pub fn set_active_track(
        &mut self,
        registry: &TrackRegistry,
        pool: &mut HandlePool,
        id: TrackId,
    ) {
        if self.snapshot.active_track_id == Some(id) {
            return;
        }
        let Some(track) = registry.get(id) else {
            log::warn!("switch to unknown track {id} ignored");
            return;
        };
        if !pool.contains(id) {
            log::warn!("switch to {id} ignored: no handle");
            return;
        }

        let intent_playing = self.phase == Phase::Playing || self.pending_resume.is_some();
        let carried = self.snapshot.current_time;

        if let Some(outgoing) = self.snapshot.active_track_id
            && let Some(handle) = pool.get_mut(outgoing)
        {
            handle.stop();
        }
        self.ticker = None;
        self.pending_resume = None;
        self.generation += 1;

        let target = carried.min(track.duration);
        let duration = track.duration;
        let volume = self.snapshot.volume;
        let rate = self.snapshot.playback_rate;

        let Some(handle) = pool.get_mut(id) else {
            return;
        };
        handle.seek(target);
        handle.set_volume(volume);
        handle.set_rate(rate);

        self.snapshot.active_track_id = Some(id);
        self.snapshot.duration = duration;
        self.snapshot.current_time = target;
        self.snapshot.is_playing = false;
        self.snapshot.buffered_fraction = handle.buffered_fraction();

        if intent_playing {
            self.phase = Phase::Switching;
            self.pending_resume = Some(PendingResume {
                track_id: id,
                generation: self.generation,
                deadline: Instant::now() + self.ready_timeout,
            });
        } else {
            self.phase = Phase::Paused;
        }

        log::info!("active track switched to {id} at {target:?}");
    }

    pub fn next_track(&mut self, registry: &TrackRegistry, pool: &mut HandlePool) {
        self.step_track(registry, pool, true);
    }

    pub fn previous_track(&mut self, registry: &TrackRegistry, pool: &mut HandlePool) {
        self.step_track(registry, pool, false);
    }

    fn step_track(&mut self, registry: &TrackRegistry, pool: &mut HandlePool, forward: bool) {
        let Some(current) = self.snapshot.active_track_id else {
            return;
        };
        if let Some(next) = registry.neighbor(current, forward) {
            self.set_active_track(registry, pool, next);
        }
    }

    /// Set the global volume, applied to every handle in the pool. An
    /// explicit volume gesture also clears the mute stash.
    pub fn set_volume(&mut self, pool: &mut HandlePool, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.snapshot.volume = volume;
        self.snapshot.muted_previous_volume = None;
        pool.set_volume_all(volume);
    }

    /// Set the global playback rate, applied to every handle in the pool.
    pub fn set_playback_rate(&mut self, pool: &mut HandlePool, rate: f32) {
        let rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        self.snapshot.playback_rate = rate;
        pool.set_rate_all(rate);
    }

    /// Mute stashes the current volume and drops to zero; unmute restores
    /// the stash, falling back to a sane level if it was zero.
    pub fn toggle_mute(&mut self, pool: &mut HandlePool) {
        match self.snapshot.muted_previous_volume.take() {
            Some(previous) => {
                let restored = if previous > 0.0 {
                    previous
                } else {
                    FALLBACK_UNMUTE_VOLUME
                };
                self.snapshot.volume = restored;
                pool.set_volume_all(restored);
            }
            None => {
                self.snapshot.muted_previous_volume = Some(self.snapshot.volume);
                self.snapshot.volume = 0.0;
                pool.set_volume_all(0.0);
            }
        }
    }

    pub fn toggle_loop(&mut self) {
        self.snapshot.loop_enabled = !self.snapshot.loop_enabled;
    }

    /// Detach from the active track after its removal, then promote the
    /// first remaining track (or none). The generation bump orphans any
    /// parked resume or ticker still pointing at the removed track.
    pub fn active_track_removed(&mut self, registry: &TrackRegistry, pool: &mut HandlePool) {
        self.ticker = None;
        self.pending_resume = None;
        self.generation += 1;
        self.snapshot.active_track_id = None;
        self.snapshot.is_playing = false;
        self.snapshot.current_time = Duration::ZERO;
        self.snapshot.duration = Duration::ZERO;
        self.snapshot.buffered_fraction = 0.0;
        self.phase = Phase::Idle;

        if let Some(first) = registry.first_id() {
            self.set_active_track(registry, pool, first);
        }
    }

    /// One engine tick: land any due deferred resume, then mirror the
    /// running handle's position into the snapshot. Called from the UI
    /// event loop once per frame.
    pub fn tick(&mut self, pool: &mut HandlePool) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        self.tick_pending_resume(pool, &mut events);
        self.tick_progress(pool, &mut events);
        events
    }

    fn tick_pending_resume(&mut self, pool: &mut HandlePool, events: &mut Vec<TransportEvent>) {
        let Some(pending) = self.pending_resume else {
            return;
        };

        // A switch since the resume was parked orphans it
        if pending.generation != self.generation
            || self.snapshot.active_track_id != Some(pending.track_id)
        {
            self.pending_resume = None;
            return;
        }

        let Some(handle) = pool.get_mut(pending.track_id) else {
            self.pending_resume = None;
            self.phase = Phase::Paused;
            return;
        };

        match handle.readiness() {
            Readiness::Ready => {
                self.pending_resume = None;
                match handle.start() {
                    Ok(()) => {
                        self.phase = Phase::Playing;
                        self.snapshot.is_playing = true;
                        self.ticker = Some(ProgressTicker::new(pending.track_id, self.generation));
                    }
                    Err(e) => {
                        self.phase = Phase::Paused;
                        self.snapshot.is_playing = false;
                        events.push(TransportEvent::ResumeFailed {
                            track_id: pending.track_id,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            Readiness::Buffering => {
                if Instant::now() >= pending.deadline {
                    self.pending_resume = None;
                    self.phase = Phase::Paused;
                    events.push(TransportEvent::ResumeFailed {
                        track_id: pending.track_id,
                        reason: EngineError::PlaybackStartRejected(
                            "handle not ready within deadline".to_string(),
                        )
                        .to_string(),
                    });
                }
            }
        }
    }

    fn tick_progress(&mut self, pool: &mut HandlePool, events: &mut Vec<TransportEvent>) {
        let Some(ticker) = self.ticker else {
            return;
        };

        // A stale ticker terminates without reporting
        if !ticker.matches(self.snapshot.active_track_id, self.generation) {
            self.ticker = None;
            return;
        }

        let track_id = ticker.track_id();
        let Some(handle) = pool.get_mut(track_id) else {
            self.ticker = None;
            self.snapshot.is_playing = false;
            self.phase = Phase::Paused;
            return;
        };

        if handle.finished() {
            if self.snapshot.loop_enabled {
                handle.seek(Duration::ZERO);
                match handle.start() {
                    Ok(()) => {
                        self.snapshot.current_time = Duration::ZERO;
                        events.push(TransportEvent::Looped { track_id });
                    }
                    Err(e) => {
                        self.ticker = None;
                        self.phase = Phase::Paused;
                        self.snapshot.is_playing = false;
                        events.push(TransportEvent::ResumeFailed {
                            track_id,
                            reason: e.to_string(),
                        });
                    }
                }
            } else {
                handle.stop();
                self.ticker = None;
                self.phase = Phase::Paused;
                self.snapshot.is_playing = false;
                self.snapshot.current_time = self.snapshot.duration;
                events.push(TransportEvent::TrackEnded { track_id });
            }
        } else if handle.is_running() {
            self.snapshot.current_time = handle.position().min(self.snapshot.duration);
            self.snapshot.buffered_fraction = handle.buffered_fraction();
        } else {
            // Handle halted underneath us; fold back to paused
            self.ticker = None;
            self.phase = Phase::Paused;
            self.snapshot.is_playing = false;
        }
    }
}
