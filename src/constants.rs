//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

/// Maximum number of tracks a session will hold at once
pub const MAX_TRACKS: usize = 10;

/// Per-file size ceiling in MiB, checked before any decoding happens
pub const MAX_FILE_MIB: u64 = 512;

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Playback rate bounds
pub const MIN_PLAYBACK_RATE: f32 = 0.5;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;

/// Volume applied on unmute when no pre-mute volume was stashed
pub const FALLBACK_UNMUTE_VOLUME: f32 = 0.7;

/// How long a deferred resume waits for the incoming handle to report ready
/// before giving up and settling in the paused state
pub const RESUME_READY_TIMEOUT_MS: u64 = 250;

/// Event-loop poll interval for the player UI
pub const TICK_INTERVAL_MS: u64 = 50;

/// Display palette cycled over tracks and markers, in assignment order
pub const COLOR_PALETTE: &[(u8, u8, u8)] = &[
    (86, 182, 194),  // cyan
    (224, 108, 117), // red
    (152, 195, 121), // green
    (229, 192, 123), // yellow
    (97, 175, 239),  // blue
    (198, 120, 221), // magenta
    (209, 154, 102), // orange
    (171, 178, 191), // gray
];
