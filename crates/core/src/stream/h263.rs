use super::video::{CameraFacing, VideoSettings};
use super::{MediaKind, MediaStream, Stream};
use crate::error::Result;

/// H.263 video track, payloaded per RFC 4629 (`H263-1998`).
///
/// H.263 needs no out-of-band parameters, so the media block is just the
/// `m=` line and `a=rtpmap`.
#[derive(Debug)]
pub struct H263Stream {
    media: MediaStream,
    video: VideoSettings,
}

impl H263Stream {
    pub fn new(camera: CameraFacing) -> Self {
        Self {
            media: MediaStream::new(),
            video: VideoSettings::new(camera),
        }
    }

    pub fn video(&self) -> &VideoSettings {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut VideoSettings {
        &mut self.video
    }
}

impl Stream for H263Stream {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn codec_name(&self) -> &'static str {
        "H263-1998"
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

    fn prepare(&mut self) -> Result<Vec<String>> {
        self.video.validate()?;
        Ok(vec![format!(
            "a=rtpmap:{} {}/{}",
            self.media.payload_type(),
            self.codec_name(),
            self.clock_rate()
        )])
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn media_block() {
        let mut s = H263Stream::new(CameraFacing::Front);
        s.set_destination_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        s.set_destination_ports(5007);
        s.configure().unwrap();
        assert_eq!(
            s.session_description().unwrap(),
            "m=video 5006 RTP/AVP 96\r\na=rtpmap:96 H263-1998/90000\r\n"
        );
        assert_eq!(s.video().camera, CameraFacing::Front);
    }

    #[test]
    fn invalid_quality_blocks_configure() {
        let mut s = H263Stream::new(CameraFacing::Back);
        s.set_destination_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
        s.set_destination_ports(5006);
        s.video_mut().quality.width = 0;
        assert!(s.configure().unwrap_err().is_invalid_state());
        assert!(s.session_description().is_err());
    }
}
