pub mod builder;
pub mod error;
pub mod platform;
pub mod quality;
pub mod session;
pub mod stream;
pub mod transport;

pub use builder::{AudioEncoder, DEFAULT_AUDIO_PORT, DEFAULT_VIDEO_PORT, SessionBuilder, VideoEncoder};
pub use error::{QualityKind, QualityParseError, Result, StreamError};
pub use platform::{InMemoryContext, PlatformContext, Preferences, SurfaceHandle};
pub use quality::{AudioQuality, VideoQuality};
pub use session::{SdpConfig, Session, SessionCallback};
pub use stream::{CameraFacing, MediaKind, PortPair, Stream, StreamState, Track};
