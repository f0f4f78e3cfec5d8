use base64::prelude::{BASE64_STANDARD, Engine as _};

use super::video::{CameraFacing, VideoSettings};
use super::{MediaKind, MediaStream, Stream};
use crate::error::Result;
use crate::platform::Preferences;

/// H.264 video track (RFC 6184).
///
/// The SDP `fmtp` line always carries `packetization-mode=1`. When the
/// encoder's SPS/PPS are known it also carries `profile-level-id` (bytes 1–3
/// of the SPS) and `sprop-parameter-sets` (RFC 6184 §8.1).
///
/// Parameter sets come from [`set_parameter_sets`](Self::set_parameter_sets)
/// or, failing that, from the [`Preferences`] cache, keyed by resolution and
/// frame rate. Explicitly supplied sets are written back to the cache so the
/// next session with the same quality can describe itself before the
/// encoder has produced a keyframe.
#[derive(Debug)]
pub struct H264Stream {
    media: MediaStream,
    video: VideoSettings,
    preferences: Option<Preferences>,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
}

impl H264Stream {
    pub fn new(camera: CameraFacing) -> Self {
        Self {
            media: MediaStream::new(),
            video: VideoSettings::new(camera),
            preferences: None,
            sps: None,
            pps: None,
        }
    }

    pub fn with_preferences(camera: CameraFacing, preferences: Preferences) -> Self {
        Self {
            preferences: Some(preferences),
            ..Self::new(camera)
        }
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn video(&self) -> &VideoSettings {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut VideoSettings {
        &mut self.video
    }

    /// Provide the encoder's SPS and PPS NAL units (without start codes).
    pub fn set_parameter_sets(&mut self, sps: Vec<u8>, pps: Vec<u8>) {
        tracing::debug!(sps_len = sps.len(), pps_len = pps.len(), "H.264 parameter sets set");
        self.sps = Some(sps);
        self.pps = Some(pps);
    }

    fn cache_key(&self) -> String {
        let q = &self.video.quality;
        format!("h264-{}x{}@{}", q.width, q.height, q.framerate)
    }

    /// Explicit sets win; otherwise try the cache. Cached values are stored
    /// as `<profile-level-id>,<b64 sps>,<b64 pps>`.
    fn resolve_parameter_sets(&mut self) {
        let Some(prefs) = &self.preferences else {
            return;
        };
        let key = self.cache_key();

        if let (Some(sps), Some(pps)) = (&self.sps, &self.pps) {
            let value = format!(
                "{},{},{}",
                profile_level_id(sps).unwrap_or_default(),
                BASE64_STANDARD.encode(sps),
                BASE64_STANDARD.encode(pps)
            );
            prefs.put(&key, value);
            return;
        }

        let Some(cached) = prefs.get(&key) else {
            return;
        };
        let fields: Vec<&str> = cached.split(',').collect();
        let decoded = match fields.as_slice() {
            [_, sps, pps] => BASE64_STANDARD
                .decode(sps)
                .and_then(|sps| BASE64_STANDARD.decode(pps).map(|pps| (sps, pps)))
                .ok(),
            _ => None,
        };
        match decoded {
            Some((sps, pps)) => {
                tracing::debug!(%key, "H.264 parameter sets loaded from preferences");
                self.sps = Some(sps);
                self.pps = Some(pps);
            }
            None => {
                tracing::warn!(%key, "discarding malformed cached H.264 parameter sets");
                prefs.remove(&key);
            }
        }
    }
}

/// `profile_idc`, constraint flags and `level_idc` as six hex digits.
fn profile_level_id(sps: &[u8]) -> Option<String> {
    match sps {
        [_, profile, constraints, level, ..] => {
            Some(format!("{profile:02x}{constraints:02x}{level:02x}"))
        }
        _ => None,
    }
}

impl Stream for H264Stream {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn codec_name(&self) -> &'static str {
        "H264"
    }

    fn clock_rate(&self) -> u32 {
        90000
    }

    fn media(&self) -> &MediaStream {
        &self.media
    }

    fn media_mut(&mut self) -> &mut MediaStream {
        &mut self.media
    }

    /// `a=rtpmap` must precede the `a=fmtp` that references it.
    fn prepare(&mut self) -> Result<Vec<String>> {
        self.video.validate()?;
        self.resolve_parameter_sets();

        let pt = self.media.payload_type();
        let mut fmtp = format!("a=fmtp:{pt} packetization-mode=1");
        if let (Some(sps), Some(pps)) = (&self.sps, &self.pps) {
            if let Some(pl) = profile_level_id(sps) {
                fmtp.push_str(&format!(";profile-level-id={pl}"));
            }
            fmtp.push_str(&format!(
                ";sprop-parameter-sets={},{}",
                BASE64_STANDARD.encode(sps),
                BASE64_STANDARD.encode(pps)
            ));
        }

        Ok(vec![
            format!("a=rtpmap:{pt} {}/{}", self.codec_name(), self.clock_rate()),
            fmtp,
        ])
    }
}
