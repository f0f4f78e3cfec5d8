//! Video and audio quality descriptors.
//!
//! Both descriptors are `Copy`: handing one to a builder or a track always
//! stores a private copy, and reading one back returns another copy. A
//! default held by one builder can never be mutated through another.
//!
//! ## String form
//!
//! ```text
//! video: <bitrate kbps>-<framerate>-<width>-<height>   e.g. 500-20-176-144
//! audio: <bitrate kbps>-<sample rate Hz>               e.g. 32-8000
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{QualityKind, QualityParseError};

/// Desired characteristics of a video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoQuality {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

impl VideoQuality {
    pub const fn new(width: u32, height: u32, framerate: u32, bitrate: u32) -> Self {
        Self {
            width,
            height,
            framerate,
            bitrate,
        }
    }

    /// RTP timestamp increment per frame on the 90 kHz video clock.
    pub fn timestamp_increment(&self) -> u32 {
        if self.framerate == 0 {
            0
        } else {
            90_000 / self.framerate
        }
    }
}

impl Default for VideoQuality {
    fn default() -> Self {
        Self::new(176, 144, 20, 500_000)
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{}fps {}kbps",
            self.width,
            self.height,
            self.framerate,
            self.bitrate / 1000
        )
    }
}

impl FromStr for VideoQuality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_fields(s, 4, QualityKind::Video)?;
        Ok(Self {
            bitrate: fields[0].saturating_mul(1000),
            framerate: fields[1],
            width: fields[2],
            height: fields[3],
        })
    }
}

/// Desired characteristics of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioQuality {
    /// Sampling rate in Hz.
    pub sample_rate: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

impl AudioQuality {
    pub const fn new(sample_rate: u32, bitrate: u32) -> Self {
        Self {
            sample_rate,
            bitrate,
        }
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self::new(8000, 32_000)
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz {}kbps", self.sample_rate, self.bitrate / 1000)
    }
}

impl FromStr for AudioQuality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_fields(s, 2, QualityKind::Audio)?;
        Ok(Self {
            bitrate: fields[0].saturating_mul(1000),
            sample_rate: fields[1],
        })
    }
}

fn parse_fields(
    input: &str,
    expected: usize,
    kind: QualityKind,
) -> Result<Vec<u32>, QualityParseError> {
    let err = |reason: String| QualityParseError {
        kind,
        input: input.to_string(),
        reason,
    };

    let parts: Vec<&str> = input.trim().split('-').collect();
    if parts.len() != expected {
        return Err(err(format!(
            "expected {expected} '-'-separated fields, got {}",
            parts.len()
        )));
    }

    parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<u32>()
                .map_err(|e| err(format!("field {p:?}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(VideoQuality::default(), VideoQuality::new(176, 144, 20, 500_000));
        assert_eq!(AudioQuality::default(), AudioQuality::new(8000, 32_000));
    }

    #[test]
    fn copies_are_independent() {
        let original = VideoQuality::default();
        let mut copy = original;
        copy.width = 1280;
        assert_eq!(original.width, 176);
    }

    #[test]
    fn parse_video() {
        let q: VideoQuality = "2000-30-1280-720".parse().unwrap();
        assert_eq!(q, VideoQuality::new(1280, 720, 30, 2_000_000));
    }

    #[test]
    fn parse_audio() {
        let q: AudioQuality = "64-44100".parse().unwrap();
        assert_eq!(q, AudioQuality::new(44100, 64_000));
    }

    #[test]
    fn parse_wrong_field_count() {
        let err = "500-20-176".parse::<VideoQuality>().unwrap_err();
        assert_eq!(err.kind, QualityKind::Video);
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn parse_non_numeric() {
        assert!("fast-8000".parse::<AudioQuality>().is_err());
    }

    #[test]
    fn timestamp_increment_at_90khz() {
        assert_eq!(VideoQuality::new(640, 480, 30, 0).timestamp_increment(), 3000);
        assert_eq!(VideoQuality::new(640, 480, 0, 0).timestamp_increment(), 0);
    }
}
