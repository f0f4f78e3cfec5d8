//! Session configuration and assembly.
//!
//! [`SessionBuilder`] accumulates session-wide and per-track settings and
//! turns them into a [`Session`] with [`build`](SessionBuilder::build).
//! Setters touch exactly one field, validate nothing and return the builder
//! for chaining:
//!
//! ```
//! use rtsp_session::{AudioEncoder, SessionBuilder, VideoEncoder};
//!
//! let mut builder = SessionBuilder::new();
//! builder
//!     .set_video_encoder(VideoEncoder::H264)
//!     .set_audio_encoder(AudioEncoder::None)
//!     .set_time_to_live(32);
//!
//! let session = builder.build();
//! assert!(session.video_track().is_some());
//! assert!(session.audio_track().is_none());
//! ```
//!
//! Builders are cheap to clone. A server typically keeps one template
//! builder and clones it per client connection before adjusting the
//! destination.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::platform::{PlatformContext, SurfaceHandle};
use crate::quality::{AudioQuality, VideoQuality};
use crate::session::{SdpConfig, Session, SessionCallback};
use crate::stream::{
    AacStream, AmrNbStream, CameraFacing, DEFAULT_TTL, H263Stream, H264Stream, Stream, Track,
};

/// Default RTP destination port of the video track (RTCP is 5007).
pub const DEFAULT_VIDEO_PORT: u16 = 5006;
/// Default RTP destination port of the audio track (RTCP is 5005).
pub const DEFAULT_AUDIO_PORT: u16 = 5004;

pub const VIDEO_NONE: u8 = 0;
pub const VIDEO_H264: u8 = 1;
pub const VIDEO_H263: u8 = 2;

pub const AUDIO_NONE: u8 = 0;
pub const AUDIO_AMRNB: u8 = 3;
pub const AUDIO_AAC: u8 = 5;

/// Video encoder selection. Discriminants are the stable integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VideoEncoder {
    None = VIDEO_NONE,
    H264 = VIDEO_H264,
    H263 = VIDEO_H263,
}

impl VideoEncoder {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Total over all codes: anything unrecognized selects no video track.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::H264,
            2 => Self::H263,
            0 => Self::None,
            other => {
                tracing::warn!(code = other, "unknown video encoder code, no video track");
                Self::None
            }
        }
    }
}

/// Audio encoder selection. Discriminants are the stable integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AudioEncoder {
    None = AUDIO_NONE,
    AmrNb = AUDIO_AMRNB,
    Aac = AUDIO_AAC,
}

impl AudioEncoder {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Total over all codes: anything unrecognized selects no audio track.
    pub fn from_code(code: i32) -> Self {
        match code {
            3 => Self::AmrNb,
            5 => Self::Aac,
            0 => Self::None,
            other => {
                tracing::warn!(code = other, "unknown audio encoder code, no audio track");
                Self::None
            }
        }
    }
}

/// Configuration accumulator and factory for [`Session`]s.
///
/// `Clone` copies every setting by value. The context, callback and surface
/// are handles to external collaborators; a clone refers to the same
/// collaborators but can replace them without affecting the original.
#[derive(Clone)]
pub struct SessionBuilder {
    video_quality: VideoQuality,
    audio_quality: AudioQuality,
    video_encoder: VideoEncoder,
    audio_encoder: AudioEncoder,
    camera: CameraFacing,
    ttl: u32,
    orientation: u16,
    flash: bool,
    surface: Option<SurfaceHandle>,
    origin: Option<IpAddr>,
    destination: Option<IpAddr>,
    context: Option<Arc<dyn PlatformContext>>,
    callback: Option<Arc<dyn SessionCallback>>,
    sdp: SdpConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            video_quality: VideoQuality::default(),
            audio_quality: AudioQuality::default(),
            video_encoder: VideoEncoder::H263,
            audio_encoder: AudioEncoder::AmrNb,
            camera: CameraFacing::Back,
            ttl: DEFAULT_TTL,
            orientation: 0,
            flash: false,
            surface: None,
            origin: None,
            destination: None,
            context: None,
            callback: None,
            sdp: SdpConfig::default(),
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide default builder, created on first access.
    ///
    /// A convenience for the outermost layer of an application; code that
    /// can take a builder as a parameter should. Clone it before mutating
    /// from more than one thread.
    pub fn global() -> &'static Mutex<SessionBuilder> {
        static GLOBAL: OnceLock<Mutex<SessionBuilder>> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            tracing::debug!("default session builder created");
            Mutex::new(SessionBuilder::new())
        })
    }

    /// Assemble a new session from the current settings.
    ///
    /// Never fails and leaves the builder untouched. Faults surface when the
    /// returned session is configured or started.
    pub fn build(&self) -> Session {
        let mut session = Session::with_sdp_config(self.sdp.clone());
        if let Some(origin) = self.origin {
            session.set_origin(origin);
        }
        if let Some(destination) = self.destination {
            session.set_destination(destination);
        }
        session.preset_time_to_live(self.ttl);
        session.set_callback(self.callback.clone());

        if let Some(mut audio) = self.audio_track() {
            audio.set_audio_quality(self.audio_quality);
            audio.set_destination_ports(DEFAULT_AUDIO_PORT);
            session.attach_track(audio);
        }

        if let Some(mut video) = self.video_track() {
            if let Some(settings) = video.video_mut() {
                settings.flash = self.flash;
                settings.quality = self.video_quality;
                settings.surface = self.surface.clone();
                settings.orientation = self.orientation;
            }
            video.set_destination_ports(DEFAULT_VIDEO_PORT);
            session.attach_track(video);
        }

        if session.is_empty() {
            tracing::debug!("built a session without tracks");
        }
        session
    }

    fn audio_track(&self) -> Option<Track> {
        let prefs = self.context.as_ref().map(|ctx| ctx.preferences());
        match self.audio_encoder {
            AudioEncoder::None => None,
            AudioEncoder::AmrNb => Some(AmrNbStream::new().into()),
            AudioEncoder::Aac => Some(
                match prefs {
                    Some(prefs) => AacStream::with_preferences(prefs),
                    None => AacStream::new(),
                }
                .into(),
            ),
        }
    }

    fn video_track(&self) -> Option<Track> {
        match self.video_encoder {
            VideoEncoder::None => None,
            VideoEncoder::H263 => Some(H263Stream::new(self.camera).into()),
            VideoEncoder::H264 => Some(
                match self.context.as_ref().map(|ctx| ctx.preferences()) {
                    Some(prefs) => H264Stream::with_preferences(self.camera, prefs),
                    None => H264Stream::new(self.camera),
                }
                .into(),
            ),
        }
    }

    pub fn set_video_quality(&mut self, quality: VideoQuality) -> &mut Self {
        self.video_quality = quality;
        self
    }

    pub fn video_quality(&self) -> VideoQuality {
        self.video_quality
    }

    pub fn set_audio_quality(&mut self, quality: AudioQuality) -> &mut Self {
        self.audio_quality = quality;
        self
    }

    pub fn audio_quality(&self) -> AudioQuality {
        self.audio_quality
    }

    pub fn set_video_encoder(&mut self, encoder: VideoEncoder) -> &mut Self {
        self.video_encoder = encoder;
        self
    }

    pub fn video_encoder(&self) -> VideoEncoder {
        self.video_encoder
    }

    pub fn set_audio_encoder(&mut self, encoder: AudioEncoder) -> &mut Self {
        self.audio_encoder = encoder;
        self
    }

    pub fn audio_encoder(&self) -> AudioEncoder {
        self.audio_encoder
    }

    pub fn set_camera(&mut self, camera: CameraFacing) -> &mut Self {
        self.camera = camera;
        self
    }

    pub fn camera(&self) -> CameraFacing {
        self.camera
    }

    pub fn set_time_to_live(&mut self, ttl: u32) -> &mut Self {
        self.ttl = ttl;
        self
    }

    pub fn time_to_live(&self) -> u32 {
        self.ttl
    }

    /// Preview rotation in degrees.
    pub fn set_preview_orientation(&mut self, degrees: u16) -> &mut Self {
        self.orientation = degrees;
        self
    }

    pub fn preview_orientation(&self) -> u16 {
        self.orientation
    }

    pub fn set_flash_enabled(&mut self, enabled: bool) -> &mut Self {
        self.flash = enabled;
        self
    }

    pub fn flash_enabled(&self) -> bool {
        self.flash
    }

    pub fn set_surface(&mut self, surface: Option<SurfaceHandle>) -> &mut Self {
        self.surface = surface;
        self
    }

    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }

    pub fn set_origin(&mut self, origin: Option<IpAddr>) -> &mut Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> Option<IpAddr> {
        self.origin
    }

    pub fn set_destination(&mut self, destination: Option<IpAddr>) -> &mut Self {
        self.destination = destination;
        self
    }

    pub fn destination(&self) -> Option<IpAddr> {
        self.destination
    }

    pub fn set_context(&mut self, context: Option<Arc<dyn PlatformContext>>) -> &mut Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> Option<&Arc<dyn PlatformContext>> {
        self.context.as_ref()
    }

    pub fn set_callback(&mut self, callback: Option<Arc<dyn SessionCallback>>) -> &mut Self {
        self.callback = callback;
        self
    }

    pub fn callback(&self) -> Option<&Arc<dyn SessionCallback>> {
        self.callback.as_ref()
    }

    pub fn set_sdp_config(&mut self, sdp: SdpConfig) -> &mut Self {
        self.sdp = sdp;
        self
    }

    pub fn sdp_config(&self) -> &SdpConfig {
        &self.sdp
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("video_quality", &self.video_quality)
            .field("audio_quality", &self.audio_quality)
            .field("video_encoder", &self.video_encoder)
            .field("audio_encoder", &self.audio_encoder)
            .field("camera", &self.camera)
            .field("ttl", &self.ttl)
            .field("orientation", &self.orientation)
            .field("flash", &self.flash)
            .field("surface", &self.surface)
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("context", &self.context.is_some())
            .field("callback", &self.callback.is_some())
            .field("sdp", &self.sdp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::thread;

    use super::*;
    use crate::platform::InMemoryContext;
    use crate::stream::PortPair;

    struct NoopCallback;
    impl SessionCallback for NoopCallback {}

    fn configured_builder() -> SessionBuilder {
        let mut b = SessionBuilder::new();
        b.set_video_quality(VideoQuality::new(640, 480, 30, 1_000_000))
            .set_audio_quality(AudioQuality::new(44100, 64_000))
            .set_video_encoder(VideoEncoder::H264)
            .set_audio_encoder(AudioEncoder::Aac)
            .set_camera(CameraFacing::Front)
            .set_time_to_live(8)
            .set_preview_orientation(90)
            .set_flash_enabled(true)
            .set_surface(Some(SurfaceHandle::new("preview")))
            .set_origin(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))))
            .set_destination(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))))
            .set_context(Some(Arc::new(InMemoryContext::new())))
            .set_callback(Some(Arc::new(NoopCallback)));
        b
    }

    #[test]
    fn defaults() {
        let b = SessionBuilder::new();
        assert_eq!(b.time_to_live(), 64);
        assert_eq!(b.camera(), CameraFacing::Back);
        assert_eq!(b.video_encoder(), VideoEncoder::H263);
        assert_eq!(b.audio_encoder(), AudioEncoder::AmrNb);
        assert_eq!(b.video_quality(), VideoQuality::default());
        assert_eq!(b.audio_quality(), AudioQuality::default());
        assert!(!b.flash_enabled());
        assert!(b.destination().is_none());
    }

    #[test]
    fn encoder_codes() {
        assert_eq!(VideoEncoder::None.code(), 0);
        assert_eq!(VideoEncoder::H264.code(), 1);
        assert_eq!(VideoEncoder::H263.code(), 2);
        assert_eq!(AudioEncoder::None.code(), 0);
        assert_eq!(AudioEncoder::AmrNb.code(), 3);
        assert_eq!(AudioEncoder::Aac.code(), 5);

        assert_eq!(VideoEncoder::from_code(1), VideoEncoder::H264);
        assert_eq!(VideoEncoder::from_code(9), VideoEncoder::None);
        assert_eq!(AudioEncoder::from_code(5), AudioEncoder::Aac);
        assert_eq!(AudioEncoder::from_code(-1), AudioEncoder::None);
    }

    #[test]
    fn clone_copies_every_field() {
        let original = configured_builder();
        let clone = original.clone();

        assert_eq!(clone.video_quality(), original.video_quality());
        assert_eq!(clone.audio_quality(), original.audio_quality());
        assert_eq!(clone.video_encoder(), original.video_encoder());
        assert_eq!(clone.audio_encoder(), original.audio_encoder());
        assert_eq!(clone.camera(), original.camera());
        assert_eq!(clone.time_to_live(), original.time_to_live());
        assert_eq!(clone.preview_orientation(), original.preview_orientation());
        assert_eq!(clone.flash_enabled(), original.flash_enabled());
        assert!(clone.surface().unwrap().same_surface(original.surface().unwrap()));
        assert_eq!(clone.origin(), original.origin());
        assert_eq!(clone.destination(), original.destination());
        assert!(clone.context().is_some());
        assert!(clone.callback().is_some());
        assert_eq!(clone.sdp_config(), original.sdp_config());
    }

    #[test]
    fn clone_is_independent_both_ways() {
        let mut original = configured_builder();
        let mut clone = original.clone();

        clone
            .set_video_quality(VideoQuality::new(1280, 720, 25, 2_000_000))
            .set_audio_encoder(AudioEncoder::None)
            .set_destination(None)
            .set_flash_enabled(false);
        assert_eq!(original.video_quality(), VideoQuality::new(640, 480, 30, 1_000_000));
        assert_eq!(original.audio_encoder(), AudioEncoder::Aac);
        assert!(original.destination().is_some());
        assert!(original.flash_enabled());

        original.set_audio_quality(AudioQuality::new(16000, 24_000)).set_time_to_live(1);
        assert_eq!(clone.audio_quality(), AudioQuality::new(44100, 64_000));
        assert_eq!(clone.time_to_live(), 8);
    }

    #[test]
    fn h264_without_audio() {
        let mut b = SessionBuilder::new();
        b.set_video_encoder(VideoEncoder::H264)
            .set_audio_encoder(AudioEncoder::None);
        let session = b.build();
        assert!(matches!(session.video_track(), Some(Track::H264(_))));
        assert!(session.audio_track().is_none());
    }

    #[test]
    fn aac_without_video() {
        let mut b = SessionBuilder::new();
        b.set_video_encoder(VideoEncoder::None)
            .set_audio_encoder(AudioEncoder::Aac)
            .set_audio_quality(AudioQuality::new(44100, 64_000))
            .set_context(Some(Arc::new(InMemoryContext::new())));
        let mut session = b.build();
        assert!(session.video_track().is_none());

        match session.audio_track() {
            Some(Track::Aac(aac)) => {
                assert!(aac.preferences().is_some());
                assert_eq!(aac.quality(), AudioQuality::new(44100, 64_000));
            }
            other => panic!("expected AAC track, got {other:?}"),
        }

        session.configure().unwrap();
        let sdp = session.session_description().unwrap();
        assert!(sdp.contains("a=rtpmap:96 mpeg4-generic/44100\r\n"));
        assert!(sdp.contains("config=1208;"));
    }

    #[test]
    fn preferences_only_for_context_aware_encoders() {
        let mut b = SessionBuilder::new();
        b.set_video_encoder(VideoEncoder::H264);
        let session = b.build();
        match session.video_track() {
            Some(Track::H264(h264)) => assert!(h264.preferences().is_none()),
            other => panic!("expected H.264 track, got {other:?}"),
        }

        b.set_context(Some(Arc::new(InMemoryContext::new())));
        let session = b.build();
        match session.video_track() {
            Some(Track::H264(h264)) => assert!(h264.preferences().is_some()),
            other => panic!("expected H.264 track, got {other:?}"),
        }
    }

    #[test]
    fn default_ports_applied() {
        let mut session = SessionBuilder::new().build();
        assert_eq!(
            session.video_track().unwrap().destination_ports(),
            Some(PortPair::new(5006, 5007))
        );
        assert_eq!(
            session.audio_track().unwrap().destination_ports(),
            Some(PortPair::new(5004, 5005))
        );

        session.video_track_mut().unwrap().set_destination_ports(6001);
        assert_eq!(
            session.video_track().unwrap().destination_ports(),
            Some(PortPair::new(6000, 6001))
        );
    }

    #[test]
    fn video_settings_pushed_into_track() {
        let session = configured_builder().build();
        let settings = session.video_track().unwrap().video().unwrap();
        assert_eq!(settings.quality, VideoQuality::new(640, 480, 30, 1_000_000));
        assert_eq!(settings.camera, CameraFacing::Front);
        assert_eq!(settings.orientation, 90);
        assert!(settings.flash);
        assert_eq!(
            settings.surface.as_ref().and_then(|s| s.downcast_ref::<&str>()),
            Some(&"preview")
        );
    }

    #[test]
    fn session_wide_settings_applied() {
        let session = configured_builder().build();
        assert_eq!(session.origin(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(session.destination(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(session.time_to_live(), 8);
        assert!(session.callback().is_some());
    }

    #[test]
    fn build_leaves_builder_reusable() {
        let b = configured_builder();
        let first = b.build();
        let second = b.build();
        assert_ne!(
            first.video_track().unwrap().ssrc(),
            second.video_track().unwrap().ssrc()
        );
        assert_eq!(b.video_encoder(), VideoEncoder::H264);
    }

    #[test]
    fn no_encoders_yields_empty_session() {
        let mut b = SessionBuilder::new();
        b.set_video_encoder(VideoEncoder::from_code(42))
            .set_audio_encoder(AudioEncoder::from_code(42));
        let session = b.build();
        assert!(session.is_empty());
    }

    #[test]
    fn global_is_a_single_instance() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| SessionBuilder::global() as *const _ as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(std::ptr::eq(SessionBuilder::global(), SessionBuilder::global()));
    }
}
