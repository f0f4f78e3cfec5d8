use crate::error::StreamError;
use crate::stream::MediaKind;

/// Lifecycle notifications from a [`Session`](super::Session).
///
/// Registered on the [`SessionBuilder`](crate::SessionBuilder) and forwarded
/// to every session it builds. Callbacks run synchronously on the thread
/// driving the session; all methods default to doing nothing.
pub trait SessionCallback: Send + Sync {
    fn on_session_configured(&self) {}

    fn on_session_started(&self) {}

    fn on_session_stopped(&self) {}

    /// A track failed to configure or start. `track` is `None` for faults
    /// not tied to a single track.
    fn on_session_error(&self, _error: &StreamError, _track: Option<MediaKind>) {}

    fn on_bitrate_update(&self, _bits_per_second: u64) {}
}
