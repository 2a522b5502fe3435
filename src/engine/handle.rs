//! Media handles: independently seekable, pausable playback instances.
//!
//! A handle is the playable side of one track. The [`MediaHandle`] trait is
//! the seam between the transport state machine and the audio backend: the
//! real implementation wraps a rodio [`Sink`] on a shared output stream, and
//! tests substitute scripted fakes. Only ever one handle is running; the
//! transport enforces that, the handle just obeys start/stop.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::source::{DecodedAudio, MemorySource};

/// Whether a handle has enough data queued to start playing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Buffering,
}

/// One track's playback instance. Volume and rate are applied per handle so
/// the transport can broadcast them uniformly across the pool.
pub trait MediaHandle {
    /// Begin or resume playback. Failures are surfaced, never retried here.
    fn start(&mut self) -> EngineResult<()>;

    /// Halt playback, keeping the current position. Idempotent.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Move the playhead. Positions past the end pin to the end.
    fn seek(&mut self, position: Duration);

    fn position(&self) -> Duration;

    fn set_volume(&mut self, volume: f32);

    fn set_rate(&mut self, rate: f32);

    fn readiness(&self) -> Readiness;

    /// Fraction of the source available for playback, in `[0, 1]`.
    fn buffered_fraction(&self) -> f32;

    /// True once the source has played to its end and nothing is queued.
    fn finished(&self) -> bool;
}

/// Creates handles for newly loaded tracks. The session holds one factory
/// for its whole lifetime; tests substitute one that builds fakes.
pub trait HandleFactory {
    fn create(&self, audio: &DecodedAudio) -> EngineResult<Box<dyn MediaHandle>>;
}

/// The process-wide audio output. Keeping the [`OutputStream`] alive is what
/// keeps the device open; every sink is built against its handle.
pub struct AudioOutput {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl AudioOutput {
    pub fn open() -> EngineResult<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| EngineError::AudioDevice(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl HandleFactory for AudioOutput {
    fn create(&self, audio: &DecodedAudio) -> EngineResult<Box<dyn MediaHandle>> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| EngineError::AudioDevice(e.to_string()))?;
        sink.pause();
        sink.append(MemorySource::new(audio.clone()));
        Ok(Box::new(RodioHandle {
            sink,
            audio: audio.clone(),
        }))
    }
}

/// Rodio-backed handle: a paused sink holding a seekable in-memory source.
pub struct RodioHandle {
    sink: Sink,
    audio: DecodedAudio,
}

impl RodioHandle {
    /// A sink that has played to the end is empty; queue a fresh source
    /// (starting at zero) before any operation that needs one.
    fn ensure_source(&mut self) {
        if self.sink.empty() {
            self.sink.append(MemorySource::new(self.audio.clone()));
        }
    }
}

impl MediaHandle for RodioHandle {
    fn start(&mut self) -> EngineResult<()> {
        self.ensure_source();
        self.sink.play();
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.pause();
    }

    fn is_running(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn seek(&mut self, position: Duration) {
        self.ensure_source();
        let target = position.min(self.audio.duration());
        if let Err(e) = self.sink.try_seek(target) {
            log::warn!("seek to {target:?} failed: {e}");
        }
    }

    fn position(&self) -> Duration {
        if self.sink.empty() {
            self.audio.duration()
        } else {
            self.sink.get_pos().min(self.audio.duration())
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn set_rate(&mut self, rate: f32) {
        self.sink.set_speed(rate);
    }

    fn readiness(&self) -> Readiness {
        // Fully decoded at load time, so always playable through
        Readiness::Ready
    }

    fn buffered_fraction(&self) -> f32 {
        1.0
    }

    fn finished(&self) -> bool {
        self.sink.empty()
    }
}
