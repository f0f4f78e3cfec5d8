//! Media tracks and their lifecycle contract.
//!
//! Every track (one audio or video channel of a session) implements
//! [`Stream`]. The encoder set is fixed, so the concrete tracks form the
//! closed enum [`Track`] and dispatch by tag:
//!
//! | Variant | Kind | SDP rtpmap |
//! |---------|------|------------|
//! | [`Track::H264`] | video | `H264/90000` (RFC 6184) |
//! | [`Track::H263`] | video | `H263-1998/90000` (RFC 4629) |
//! | [`Track::Aac`] | audio | `mpeg4-generic/<rate>` (RFC 3640) |
//! | [`Track::AmrNb`] | audio | `AMR/8000` (RFC 4867) |
//!
//! ## Lifecycle
//!
//! ```text
//! Unconfigured --configure()--> Configured --start()--> Streaming
//!                                    ^                      |
//!                                    +-------stop()---------+
//! ```
//!
//! - `configure()` is allowed from `Unconfigured` and `Configured` only.
//! - `start()` needs a prior successful `configure()`.
//! - `stop()` is allowed anywhere and never fails.
//! - The session description is only available once configured.

pub mod aac;
pub mod amrnb;
pub mod base;
pub mod bitrate;
pub mod h263;
pub mod h264;
pub mod ports;
pub mod rtp;
pub mod video;

use std::fmt;
use std::net::IpAddr;

pub use aac::AacStream;
pub use amrnb::AmrNbStream;
pub use base::{DEFAULT_TTL, MediaStream};
pub use h263::H263Stream;
pub use h264::H264Stream;
pub use ports::PortPair;
pub use video::{CameraFacing, VideoSettings};

use crate::error::Result;
use crate::quality::AudioQuality;
use crate::transport::SharedOutput;

/// Lifecycle state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created but never successfully configured.
    Unconfigured,
    /// Configured and idle; session description available.
    Configured,
    /// Transport open, packets may be sent.
    Streaming,
}

/// Media kind of a track; also determines its track id within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Track id used in `a=control:trackID=<id>` (audio 0, video 1).
    pub const fn track_id(self) -> u8 {
        match self {
            Self::Audio => 0,
            Self::Video => 1,
        }
    }

    pub const fn from_track_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Audio),
            1 => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Capability interface every track implements.
///
/// Implementors provide the codec half: [`kind`](Self::kind),
/// [`codec_name`](Self::codec_name), [`clock_rate`](Self::clock_rate) and
/// [`prepare`](Self::prepare), plus access to their [`MediaStream`]. The
/// lifecycle and addressing surface is provided on top of those.
pub trait Stream: Send {
    fn kind(&self) -> MediaKind;

    /// Encoding name as it appears in `a=rtpmap`.
    fn codec_name(&self) -> &'static str;

    /// RTP clock rate in Hz.
    fn clock_rate(&self) -> u32;

    fn media(&self) -> &MediaStream;

    fn media_mut(&mut self) -> &mut MediaStream;

    /// Codec-specific part of `configure()`.
    ///
    /// Validates codec settings and returns the media-level SDP attribute
    /// lines (`a=rtpmap`, `a=fmtp`, ...) following the `m=` line.
    fn prepare(&mut self) -> Result<Vec<String>>;

    /// `Unconfigured | Configured -> Configured`.
    fn configure(&mut self) -> Result<()> {
        self.media().ensure_configurable()?;
        let attributes = self.prepare()?;
        let kind = self.kind();
        self.media_mut().mark_configured(kind, attributes);
        Ok(())
    }

    /// `Configured -> Streaming`. Opens the transport.
    fn start(&mut self) -> Result<()> {
        self.media_mut().start()
    }

    /// `* -> Configured` (or stays `Unconfigured`). Never fails.
    fn stop(&mut self) {
        self.media_mut().stop();
    }

    fn state(&self) -> StreamState {
        self.media().state()
    }

    fn is_streaming(&self) -> bool {
        self.state() == StreamState::Streaming
    }

    fn set_destination_address(&mut self, destination: IpAddr) {
        self.media_mut().set_destination_address(destination);
    }

    fn destination_address(&self) -> Option<IpAddr> {
        self.media().destination_address()
    }

    /// Derive the destination pair from one port (see [`PortPair::from_port`]).
    fn set_destination_ports(&mut self, port: u16) {
        self.media_mut()
            .set_destination_ports(PortPair::from_port(port));
    }

    /// Set RTP and RTCP destination ports independently.
    fn set_destination_port_pair(&mut self, rtp: u16, rtcp: u16) {
        self.media_mut()
            .set_destination_ports(PortPair::new(rtp, rtcp));
    }

    fn destination_ports(&self) -> Option<PortPair> {
        self.media().destination_ports()
    }

    /// Local pair bound by the current or last UDP transport.
    fn local_ports(&self) -> Option<PortPair> {
        self.media().local_ports()
    }

    fn ssrc(&self) -> u32 {
        self.media().ssrc()
    }

    /// Approximate outgoing bitrate in bits per second.
    fn bitrate(&self) -> u64 {
        self.media().bitrate()
    }

    fn session_description(&self) -> Result<String> {
        self.media().session_description()
    }

    fn set_time_to_live(&mut self, ttl: u32) -> Result<()> {
        self.media_mut().set_time_to_live(ttl)
    }

    fn time_to_live(&self) -> u32 {
        self.media().time_to_live()
    }

    /// Send RTP over an interleaved RTSP connection on `channel`.
    fn set_output_stream(&mut self, writer: SharedOutput, channel: u8) {
        self.media_mut().set_output_stream(writer, channel);
    }

    /// Hand one payloaded unit from the encoder to the transport.
    fn send_payload(&mut self, payload: &[u8], marker: bool) -> Result<usize> {
        self.media_mut().send_payload(payload, marker)
    }

    fn advance_timestamp(&mut self, increment: u32) {
        self.media_mut().advance_timestamp(increment);
    }
}

/// The closed set of track implementations, one per encoder.
#[derive(Debug)]
pub enum Track {
    H264(H264Stream),
    H263(H263Stream),
    Aac(AacStream),
    AmrNb(AmrNbStream),
}

macro_rules! dispatch {
    ($track:expr, $s:ident => $body:expr) => {
        match $track {
            Track::H264($s) => $body,
            Track::H263($s) => $body,
            Track::Aac($s) => $body,
            Track::AmrNb($s) => $body,
        }
    };
}

impl Track {
    /// Capture settings, for video tracks.
    pub fn video(&self) -> Option<&VideoSettings> {
        match self {
            Self::H264(s) => Some(s.video()),
            Self::H263(s) => Some(s.video()),
            Self::Aac(_) | Self::AmrNb(_) => None,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoSettings> {
        match self {
            Self::H264(s) => Some(s.video_mut()),
            Self::H263(s) => Some(s.video_mut()),
            Self::Aac(_) | Self::AmrNb(_) => None,
        }
    }

    /// Requested quality, for audio tracks.
    pub fn audio_quality(&self) -> Option<AudioQuality> {
        match self {
            Self::Aac(s) => Some(s.quality()),
            Self::AmrNb(s) => Some(s.quality()),
            Self::H264(_) | Self::H263(_) => None,
        }
    }

    /// Returns `false` (and does nothing) on a video track.
    pub fn set_audio_quality(&mut self, quality: AudioQuality) -> bool {
        match self {
            Self::Aac(s) => s.set_quality(quality),
            Self::AmrNb(s) => s.set_quality(quality),
            Self::H264(_) | Self::H263(_) => return false,
        }
        true
    }
}

impl Stream for Track {
    fn kind(&self) -> MediaKind {
        dispatch!(self, s => s.kind())
    }

    fn codec_name(&self) -> &'static str {
        dispatch!(self, s => s.codec_name())
    }

    fn clock_rate(&self) -> u32 {
        dispatch!(self, s => s.clock_rate())
    }

    fn media(&self) -> &MediaStream {
        dispatch!(self, s => s.media())
    }

    fn media_mut(&mut self) -> &mut MediaStream {
        dispatch!(self, s => s.media_mut())
    }

    fn prepare(&mut self) -> Result<Vec<String>> {
        dispatch!(self, s => s.prepare())
    }
}

impl From<H264Stream> for Track {
    fn from(s: H264Stream) -> Self {
        Self::H264(s)
    }
}

impl From<H263Stream> for Track {
    fn from(s: H263Stream) -> Self {
        Self::H263(s)
    }
}

impl From<AacStream> for Track {
    fn from(s: AacStream) -> Self {
        Self::Aac(s)
    }
}

impl From<AmrNbStream> for Track {
    fn from(s: AmrNbStream) -> Self {
        Self::AmrNb(s)
    }
}
