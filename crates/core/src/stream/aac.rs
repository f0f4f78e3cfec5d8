use super::{MediaKind, MediaStream, Stream};
use crate::error::Result;
use crate::platform::Preferences;
use crate::quality::AudioQuality;

/// MPEG-4 sampling frequency table (ISO/IEC 14496-3 §1.6.3.4); the
/// position of a rate is its `samplingFrequencyIndex`.
pub const AAC_SAMPLING_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// AAC Low Complexity audio object type.
const AAC_LC: u16 = 2;
const CHANNELS: u16 = 1;

/// AAC audio track, `mpeg4-generic` AAC-hbr payload (RFC 3640 §3.3.6).
///
/// The requested sampling rate is resolved to an entry of
/// [`AAC_SAMPLING_RATES`] at configure time (exact match, else the closest
/// rate). With [`Preferences`] present the resolution is cached under
/// `aac-<requested rate>` and reused by later tracks.
#[derive(Debug)]
pub struct AacStream {
    media: MediaStream,
    quality: AudioQuality,
    preferences: Option<Preferences>,
    sample_rate_index: Option<usize>,
}

impl AacStream {
    pub fn new() -> Self {
        Self {
            media: MediaStream::new(),
            quality: AudioQuality::default(),
            preferences: None,
            sample_rate_index: None,
        }
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            preferences: Some(preferences),
            ..Self::new()
        }
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn quality(&self) -> AudioQuality {
        self.quality
    }

    pub fn set_quality(&mut self, quality: AudioQuality) {
        self.quality = quality;
    }

    /// Sampling rate actually used, once configured.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate_index.map(|i| AAC_SAMPLING_RATES[i])
    }

    /// The 2-byte AudioSpecificConfig advertised as `config=` in the fmtp.
    pub fn audio_specific_config(&self) -> Option<u16> {
        self.sample_rate_index
            .map(|i| (AAC_LC << 11) | ((i as u16) << 7) | (CHANNELS << 3))
    }

    fn resolve_sample_rate(&self) -> usize {
        let requested = self.quality.sample_rate;
        let key = format!("aac-{requested}");

        if let Some(idx) = self
            .preferences
            .as_ref()
            .and_then(|p| p.get(&key))
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(|rate| AAC_SAMPLING_RATES.iter().position(|&r| r == rate))
        {
            return idx;
        }

        let idx = closest_rate_index(requested);
        if AAC_SAMPLING_RATES[idx] != requested {
            tracing::warn!(
                requested,
                using = AAC_SAMPLING_RATES[idx],
                "unsupported AAC sampling rate"
            );
        }
        if let Some(prefs) = &self.preferences {
            prefs.put(&key, AAC_SAMPLING_RATES[idx].to_string());
        }
        idx
    }
}

impl Default for AacStream {
    fn default() -> Self {
        Self::new()
    }
}

fn closest_rate_index(rate: u32) -> usize {
    AAC_SAMPLING_RATES
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.abs_diff(rate))
        .map(|(i, _)| i)
        .unwrap_or(AAC_SAMPLING_RATES.len() - 1)
}

impl Stream for AacStream {
    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    fn codec_name(&self) -> &'static str {
        "mpeg4-generic"
    }

    fn clock_rate(&self) -> u32 {
        self.sample_rate().unwrap_or(self.quality.sample_rate)
    }

    fn media(&self) -> &MediaStream {
        &self.media
    }

    fn media_mut(&mut self) -> &mut MediaStream {
        &mut self.media
    }

    fn prepare(&mut self) -> Result<Vec<String>> {
        let idx = self.resolve_sample_rate();
        self.sample_rate_index = Some(idx);
        let config = self.audio_specific_config().unwrap_or_default();

        let pt = self.media.payload_type();
        Ok(vec![
            format!("a=rtpmap:{pt} {}/{}", self.codec_name(), self.clock_rate()),
            format!(
                "a=fmtp:{pt} streamtype=5; profile-level-id=15; mode=AAC-hbr; config={config:x}; \
                 SizeLength=13; IndexLength=3; IndexDeltaLength=3;"
            ),
        ])
    }
}
