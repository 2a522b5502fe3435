//! Engine error types

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while loading tracks or controlling playback
#[derive(Error, Debug)]
pub enum EngineError {
    /// File exceeds the configured size ceiling
    #[error("file is {size} bytes, over the {limit} byte ceiling")]
    FileTooLarge { size: u64, limit: u64 },

    /// The session already holds the maximum number of tracks
    #[error("track limit of {limit} reached")]
    TrackLimitExceeded { limit: usize },

    /// The file could not be read or decoded
    #[error("decode failed: {0}")]
    Decode(String),

    /// The audio backend refused to start playback
    #[error("playback start rejected: {0}")]
    PlaybackStartRejected(String),

    /// A track id that is no longer (or never was) in the registry
    #[error("track not found: {0}")]
    TrackNotFound(Uuid),

    /// No usable audio output device
    #[error("audio device error: {0}")]
    AudioDevice(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
