use std::fmt;

use crate::error::{Result, StreamError};
use crate::platform::SurfaceHandle;
use crate::quality::VideoQuality;

/// Which camera a video track captures from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    /// Platform camera identifier (back = 0, front = 1).
    pub const fn id(self) -> u32 {
        match self {
            Self::Back => 0,
            Self::Front => 1,
        }
    }

    /// Unknown identifiers fall back to the back camera.
    pub const fn from_id(id: u32) -> Self {
        match id {
            1 => Self::Front,
            _ => Self::Back,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Back => Self::Front,
            Self::Front => Self::Back,
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Back => write!(f, "back"),
            Self::Front => write!(f, "front"),
        }
    }
}

/// Capture-side settings shared by the video tracks.
///
/// The camera itself lives outside this crate; these values are what the
/// capture collaborator reads when the track starts.
#[derive(Debug, Clone, Default)]
pub struct VideoSettings {
    pub quality: VideoQuality,
    pub camera: CameraFacing,
    pub flash: bool,
    /// Preview rotation in degrees.
    pub orientation: u16,
    pub surface: Option<SurfaceHandle>,
}

impl VideoSettings {
    pub fn new(camera: CameraFacing) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn switch_camera(&mut self) -> CameraFacing {
        self.camera = self.camera.opposite();
        tracing::debug!(camera = %self.camera, "camera switched");
        self.camera
    }

    pub fn toggle_flash(&mut self) -> bool {
        self.flash = !self.flash;
        self.flash
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let q = &self.quality;
        if q.width == 0 || q.height == 0 || q.framerate == 0 {
            return Err(StreamError::invalid_state(format!(
                "unusable video quality {q}"
            )));
        }
        Ok(())
    }
}
