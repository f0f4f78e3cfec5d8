//! An assembled streaming session.
//!
//! A session holds at most one audio and one video [`Track`], the
//! session-wide addressing (origin, destination, TTL) and an optional
//! [`SessionCallback`]. It drives its tracks through the shared lifecycle
//! and combines their media blocks into one SDP.
//!
//! ## Session lifecycle
//!
//! ```text
//! build()       -> tracks Unconfigured
//! configure()   -> destination/TTL pushed into tracks, each configured
//! start()       -> each track Streaming (rolled back on failure)
//! stop()        -> each track Configured
//! ```
//!
//! All calls are synchronous and block the caller while sockets open.
//! Track ids: audio is 0, video is 1.

pub mod callback;
pub mod sdp;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use crate::error::{Result, StreamError};
use crate::stream::{CameraFacing, DEFAULT_TTL, MediaKind, Stream, Track};
pub use callback::SessionCallback;
pub use sdp::SdpConfig;

/// A set of independently-lifecycled tracks sharing one destination.
pub struct Session {
    id: u64,
    origin: IpAddr,
    destination: IpAddr,
    ttl: u32,
    audio: Option<Track>,
    video: Option<Track>,
    callback: Option<Arc<dyn SessionCallback>>,
    sdp: SdpConfig,
}

impl Session {
    /// Empty session addressed to the loopback interface.
    pub fn new() -> Self {
        Self::with_sdp_config(SdpConfig::default())
    }

    pub fn with_sdp_config(sdp: SdpConfig) -> Self {
        Self {
            id: u64::from(rand::random::<u32>()),
            origin: IpAddr::V4(Ipv4Addr::LOCALHOST),
            destination: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ttl: DEFAULT_TTL,
            audio: None,
            video: None,
            callback: None,
            sdp,
        }
    }

    /// Identifier used for the SDP origin line.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_origin(&mut self, origin: IpAddr) {
        self.origin = origin;
    }

    pub fn origin(&self) -> IpAddr {
        self.origin
    }

    /// Takes effect for the tracks at the next `configure()`.
    pub fn set_destination(&mut self, destination: IpAddr) {
        self.destination = destination;
    }

    pub fn destination(&self) -> IpAddr {
        self.destination
    }

    /// Push the TTL into every track, then store it.
    ///
    /// Fails if a streaming track's socket rejects the value. The previous
    /// TTL is then restored on every track and kept by the session.
    pub fn set_time_to_live(&mut self, ttl: u32) -> Result<()> {
        let previous = self.ttl;
        let result = self
            .tracks_mut()
            .try_for_each(|track| track.set_time_to_live(ttl));

        if let Err(e) = result {
            for track in self.tracks_mut() {
                if let Err(restore) = track.set_time_to_live(previous) {
                    tracing::warn!(track = %track.kind(), error = %restore, "TTL restore failed");
                }
            }
            return Err(e);
        }
        self.ttl = ttl;
        Ok(())
    }

    /// Store the TTL without touching tracks, for sessions still being
    /// assembled. `configure()` pushes it into the tracks.
    pub(crate) fn preset_time_to_live(&mut self, ttl: u32) {
        self.ttl = ttl;
    }

    pub fn time_to_live(&self) -> u32 {
        self.ttl
    }

    pub fn set_callback(&mut self, callback: Option<Arc<dyn SessionCallback>>) {
        self.callback = callback;
    }

    pub fn callback(&self) -> Option<&Arc<dyn SessionCallback>> {
        self.callback.as_ref()
    }

    pub fn sdp_config(&self) -> &SdpConfig {
        &self.sdp
    }

    /// Attach a track in the slot for its media kind, returning the track it
    /// replaces.
    pub fn attach_track(&mut self, track: Track) -> Option<Track> {
        let kind = track.kind();
        tracing::debug!(%kind, codec = track.codec_name(), ssrc = track.ssrc(), "track attached");
        self.slot_mut(kind).replace(track)
    }

    pub fn audio_track(&self) -> Option<&Track> {
        self.audio.as_ref()
    }

    pub fn audio_track_mut(&mut self) -> Option<&mut Track> {
        self.audio.as_mut()
    }

    pub fn video_track(&self) -> Option<&Track> {
        self.video.as_ref()
    }

    pub fn video_track_mut(&mut self) -> Option<&mut Track> {
        self.video.as_mut()
    }

    /// Look a track up by id (audio 0, video 1).
    pub fn track(&self, id: u8) -> Option<&Track> {
        match MediaKind::from_track_id(id)? {
            MediaKind::Audio => self.audio.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    pub fn track_mut(&mut self, id: u8) -> Option<&mut Track> {
        let kind = MediaKind::from_track_id(id)?;
        self.slot_mut(kind).as_mut()
    }

    pub fn track_exists(&self, id: u8) -> bool {
        self.track(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }

    fn slot_mut(&mut self, kind: MediaKind) -> &mut Option<Track> {
        match kind {
            MediaKind::Audio => &mut self.audio,
            MediaKind::Video => &mut self.video,
        }
    }

    fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.audio.iter().chain(self.video.iter())
    }

    fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.audio.iter_mut().chain(self.video.iter_mut())
    }

    fn notify_error(&self, error: &StreamError, kind: Option<MediaKind>) {
        tracing::warn!(track = ?kind, %error, "session error");
        if let Some(cb) = &self.callback {
            cb.on_session_error(error, kind);
        }
    }

    /// Push destination and TTL into every track, then configure each.
    pub fn configure(&mut self) -> Result<()> {
        let destination = self.destination;
        let ttl = self.ttl;

        let mut failure = None;
        for track in self.tracks_mut() {
            track.set_destination_address(destination);
            let result = track
                .set_time_to_live(ttl)
                .and_then(|()| track.configure());
            if let Err(e) = result {
                failure = Some((track.kind(), e));
                break;
            }
        }
        if let Some((kind, e)) = failure {
            self.notify_error(&e, Some(kind));
            return Err(e);
        }

        tracing::debug!(session_id = self.id, %destination, "session configured");
        if let Some(cb) = &self.callback {
            cb.on_session_configured();
        }
        Ok(())
    }

    /// Start every track. If one fails, the tracks started by this call are
    /// stopped again and the fault is returned.
    pub fn start(&mut self) -> Result<()> {
        let mut started = Vec::new();
        let mut failure = None;
        for track in self.tracks_mut() {
            let was_streaming = track.is_streaming();
            match track.start() {
                Ok(()) if !was_streaming => started.push(track.kind()),
                Ok(()) => {}
                Err(e) => {
                    failure = Some((track.kind(), e));
                    break;
                }
            }
        }

        if let Some((kind, e)) = failure {
            for started_kind in started {
                if let Some(track) = self.slot_mut(started_kind) {
                    track.stop();
                }
            }
            self.notify_error(&e, Some(kind));
            return Err(e);
        }

        tracing::info!(session_id = self.id, destination = %self.destination, "session started");
        if let Some(cb) = &self.callback {
            cb.on_session_started();
        }
        Ok(())
    }

    /// Start a single track by id.
    pub fn start_track(&mut self, id: u8) -> Result<()> {
        let Some(track) = self.track_mut(id) else {
            return Err(StreamError::invalid_state(format!("no track with id {id}")));
        };
        let kind = track.kind();
        if let Err(e) = track.start() {
            self.notify_error(&e, Some(kind));
            return Err(e);
        }
        Ok(())
    }

    /// Stop a single track by id; unknown ids are ignored.
    pub fn stop_track(&mut self, id: u8) {
        if let Some(track) = self.track_mut(id) {
            track.stop();
        }
    }

    /// Stop every track. Never fails.
    pub fn stop(&mut self) {
        for track in self.tracks_mut() {
            track.stop();
        }
        tracing::info!(session_id = self.id, "session stopped");
        if let Some(cb) = &self.callback {
            cb.on_session_stopped();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.tracks().any(|t| t.is_streaming())
    }

    /// Combined SDP of all tracks. Fails while any track is unconfigured.
    pub fn session_description(&self) -> Result<String> {
        let rendered = self
            .tracks()
            .map(|t| Ok((t.kind().track_id(), t.session_description()?)))
            .collect::<Result<Vec<_>>>()?;

        let blocks: Vec<sdp::MediaBlock<'_>> = rendered
            .iter()
            .map(|(track_id, block)| sdp::MediaBlock {
                track_id: *track_id,
                sdp: block,
            })
            .collect();

        Ok(sdp::generate_sdp(
            &self.sdp,
            self.id,
            self.origin,
            self.destination,
            &blocks,
        ))
    }

    /// Combined outgoing bitrate of all tracks, in bits per second.
    pub fn bitrate(&self) -> u64 {
        self.tracks().map(|t| t.bitrate()).sum()
    }

    /// Compute the bitrate and hand it to the callback.
    pub fn report_bitrate(&self) -> u64 {
        let bitrate = self.bitrate();
        if let Some(cb) = &self.callback {
            cb.on_bitrate_update(bitrate);
        }
        bitrate
    }

    /// Switch the video track to the other camera.
    pub fn switch_camera(&mut self) -> Option<CameraFacing> {
        self.video
            .as_mut()
            .and_then(Track::video_mut)
            .map(|v| v.switch_camera())
    }

    pub fn toggle_flash(&mut self) -> Option<bool> {
        self.video
            .as_mut()
            .and_then(Track::video_mut)
            .map(|v| v.toggle_flash())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("ttl", &self.ttl)
            .field("audio", &self.audio)
            .field("video", &self.video)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::stream::{AmrNbStream, H263Stream, H264Stream, StreamState};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SessionCallback for Recorder {
        fn on_session_configured(&self) {
            self.events.lock().push("configured".into());
        }
        fn on_session_started(&self) {
            self.events.lock().push("started".into());
        }
        fn on_session_stopped(&self) {
            self.events.lock().push("stopped".into());
        }
        fn on_session_error(&self, error: &StreamError, track: Option<MediaKind>) {
            self.events
                .lock()
                .push(format!("error:{track:?}:{}", error.is_invalid_state()));
        }
        fn on_bitrate_update(&self, bits_per_second: u64) {
            self.events.lock().push(format!("bitrate:{bits_per_second}"));
        }
    }

    fn session_with_tracks() -> Session {
        let mut session = Session::new();
        let mut audio = Track::from(AmrNbStream::new());
        audio.set_destination_ports(5004);
        let mut video = Track::from(H263Stream::new(CameraFacing::Back));
        video.set_destination_ports(5006);
        session.attach_track(audio);
        session.attach_track(video);
        session
    }

    #[test]
    fn attach_replaces_same_kind() {
        let mut session = Session::new();
        assert!(session.attach_track(H263Stream::new(CameraFacing::Back).into()).is_none());
        let previous = session.attach_track(H264Stream::new(CameraFacing::Back).into());
        assert!(matches!(previous, Some(Track::H263(_))));
        assert!(matches!(session.video_track(), Some(Track::H264(_))));
        assert!(session.audio_track().is_none());
    }

    #[test]
    fn track_lookup_by_id() {
        let session = session_with_tracks();
        assert!(session.track_exists(0));
        assert!(session.track_exists(1));
        assert!(!session.track_exists(2));
        assert_eq!(session.track(0).map(Stream::kind), Some(MediaKind::Audio));
    }

    #[test]
    fn description_requires_configure() {
        let mut session = session_with_tracks();
        assert!(session.session_description().unwrap_err().is_invalid_state());

        session.configure().unwrap();
        let sdp = session.session_description().unwrap();
        assert!(sdp.contains("m=audio 5004 RTP/AVP 96\r\n"));
        assert!(sdp.contains("a=control:trackID=0\r\n"));
        assert!(sdp.contains("m=video 5006 RTP/AVP 96\r\n"));
        assert!(sdp.contains("a=control:trackID=1\r\n"));
        assert!(sdp.contains("c=IN IP4 127.0.0.1\r\n"));
    }

    #[test]
    fn configure_pushes_destination_and_ttl() {
        let mut session = session_with_tracks();
        let dest = IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3));
        session.set_destination(dest);
        session.set_time_to_live(12).unwrap();
        session.configure().unwrap();

        let video = session.video_track().unwrap();
        assert_eq!(video.destination_address(), Some(dest));
        assert_eq!(video.time_to_live(), 12);
    }

    #[test]
    fn rejected_ttl_keeps_previous_value() {
        let mut session = Session::new();
        let mut audio = Track::from(AmrNbStream::new());
        audio.set_destination_ports(5004);
        session.attach_track(audio);
        session.configure().unwrap();
        session.start().unwrap();

        let err = session.set_time_to_live(1000).unwrap_err();
        assert!(!err.is_invalid_state());
        assert_eq!(session.time_to_live(), DEFAULT_TTL);
        assert_eq!(session.audio_track().unwrap().time_to_live(), DEFAULT_TTL);

        session.stop();
        session.configure().unwrap();
        session.start().unwrap();
        assert!(session.is_streaming());

        session.set_time_to_live(32).unwrap();
        assert_eq!(session.time_to_live(), 32);
        assert_eq!(session.audio_track().unwrap().time_to_live(), 32);
        session.stop();
    }

    #[test]
    fn callback_sees_lifecycle() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session_with_tracks();
        session.set_callback(Some(recorder.clone()));

        session.configure().unwrap();
        session.start().unwrap();
        assert!(session.is_streaming());
        assert_eq!(session.report_bitrate(), 0);
        session.stop();
        assert!(!session.is_streaming());

        assert_eq!(
            *recorder.events.lock(),
            vec!["configured", "started", "bitrate:0", "stopped"]
        );
    }

    #[test]
    fn start_before_configure_reports_invalid_state() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session_with_tracks();
        session.set_callback(Some(recorder.clone()));

        assert!(session.start().unwrap_err().is_invalid_state());
        assert_eq!(
            *recorder.events.lock(),
            vec!["error:Some(Audio):true"]
        );
        assert!(!session.is_streaming());
    }

    #[test]
    fn failed_start_rolls_back() {
        let mut session = session_with_tracks();
        session.configure().unwrap();
        // audio starts first, then the unconfigured replacement video fails
        let mut broken = Track::from(H263Stream::new(CameraFacing::Back));
        broken.set_destination_ports(5006);
        session.attach_track(broken);

        assert!(session.start().is_err());
        assert_eq!(
            session.audio_track().map(Stream::state),
            Some(StreamState::Configured)
        );
    }

    #[test]
    fn per_track_start_and_stop() {
        let mut session = session_with_tracks();
        session.configure().unwrap();
        session.start_track(1).unwrap();
        assert!(session.video_track().unwrap().is_streaming());
        assert!(!session.audio_track().unwrap().is_streaming());
        session.stop_track(1);
        assert!(!session.is_streaming());
        assert!(session.start_track(5).unwrap_err().is_invalid_state());
    }

    #[test]
    fn empty_session_is_usable() {
        let mut session = Session::new();
        assert!(session.is_empty());
        session.configure().unwrap();
        session.start().unwrap();
        let sdp = session.session_description().unwrap();
        assert!(!sdp.contains("m="));
        session.stop();
    }

    #[test]
    fn camera_and_flash_controls() {
        let mut session = session_with_tracks();
        assert_eq!(session.switch_camera(), Some(CameraFacing::Front));
        assert_eq!(session.toggle_flash(), Some(true));

        let mut audio_only = Session::new();
        audio_only.attach_track(AmrNbStream::new().into());
        assert_eq!(audio_only.switch_camera(), None);
        assert_eq!(audio_only.toggle_flash(), None);
    }
}
