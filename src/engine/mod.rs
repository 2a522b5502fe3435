//! The playback engine: registry, handle pool, and transport.
//!
//! Everything stateful about A/B comparison lives here, behind the
//! [`Session`] context. The UI layer only calls session methods and reads
//! the transport snapshot; it never touches a handle directly.

pub mod error;
pub mod handle;
pub mod pool;
pub mod session;
pub mod source;
pub mod ticker;
pub mod track;
pub mod transport;

pub use error::{EngineError, EngineResult};
pub use session::Session;
pub use track::{Marker, MarkerId, Track, TrackId};
pub use transport::{Phase, TransportEvent, TransportSnapshot};
