use super::{MediaKind, MediaStream, Stream};
use crate::error::Result;
use crate::quality::AudioQuality;

/// AMR-NB narrowband sampling rate; the codec supports no other.
pub const AMRNB_SAMPLE_RATE: u32 = 8000;

/// AMR-NB audio track, octet-aligned payload format (RFC 4867 §4.4).
#[derive(Debug)]
pub struct AmrNbStream {
    media: MediaStream,
    quality: AudioQuality,
}

impl AmrNbStream {
    pub fn new() -> Self {
        Self {
            media: MediaStream::new(),
            quality: AudioQuality::default(),
        }
    }

    pub fn quality(&self) -> AudioQuality {
        self.quality
    }

    pub fn set_quality(&mut self, quality: AudioQuality) {
        self.quality = quality;
    }
}

impl Default for AmrNbStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for AmrNbStream {
    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    fn codec_name(&self) -> &'static str {
        "AMR"
    }

    fn clock_rate(&self) -> u32 {
        AMRNB_SAMPLE_RATE
    }

    fn media(&self) -> &MediaStream {
        &self.media
    }

    fn media_mut(&mut self) -> &mut MediaStream {
        &mut self.media
    }

    fn prepare(&mut self) -> Result<Vec<String>> {
        if self.quality.sample_rate != AMRNB_SAMPLE_RATE {
            tracing::debug!(
                requested = self.quality.sample_rate,
                "AMR-NB forces an 8 kHz sampling rate"
            );
            self.quality.sample_rate = AMRNB_SAMPLE_RATE;
        }

        let pt = self.media.payload_type();
        Ok(vec![
            format!("a=rtpmap:{pt} {}/{}", self.codec_name(), self.clock_rate()),
            format!("a=fmtp:{pt} octet-align=1"),
        ])
    }
}
