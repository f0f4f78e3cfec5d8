//! Session-level SDP (RFC 8866).
//!
//! A session description wraps the media blocks of its tracks:
//!
//! ```text
//! v=0                                           ← protocol version
//! o=<user> <sess-id> <sess-ver> IN IP4 <origin> ← origin
//! s=<session-name>                              ← session name
//! i=<session-info>                              ← session information
//! c=IN IP4 <destination>                        ← connection address
//! t=0 0                                         ← timing (live stream)
//! a=tool:<tool>                                 ← producing software
//! a=sendonly                                    ← direction
//! m=audio 5004 RTP/AVP 96                       ← first track block
//! a=rtpmap:96 AMR/8000
//! a=fmtp:96 octet-align=1
//! a=control:trackID=0                           ← track control URL
//! m=video 5006 RTP/AVP 96                       ← second track block
//! ...
//! a=control:trackID=1
//! ```

use std::net::IpAddr;

/// Session-level SDP fields, in the manner of a server's protocol config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpConfig {
    /// Origin username (`o=<username> ...`).
    pub username: String,
    /// Session name (`s=`).
    pub session_name: String,
    /// Session information (`i=`).
    pub session_info: String,
    /// Producing software (`a=tool:`).
    pub tool: String,
}

impl Default for SdpConfig {
    fn default() -> Self {
        Self {
            username: "-".to_string(),
            session_name: "Unnamed".to_string(),
            session_info: "N/A".to_string(),
            tool: concat!("rtsp-session/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A rendered track block and the id used for its control URL.
pub struct MediaBlock<'a> {
    pub track_id: u8,
    pub sdp: &'a str,
}

fn address_type(addr: &IpAddr) -> &'static str {
    match addr {
        IpAddr::V4(_) => "IP4",
        IpAddr::V6(_) => "IP6",
    }
}

/// Render a full session description.
pub fn generate_sdp(
    config: &SdpConfig,
    session_id: u64,
    origin: IpAddr,
    destination: IpAddr,
    blocks: &[MediaBlock<'_>],
) -> String {
    let mut sdp: Vec<String> = vec![
        "v=0".to_string(),
        format!(
            "o={} {} {} IN {} {}",
            config.username,
            session_id,
            session_id,
            address_type(&origin),
            origin
        ),
        format!("s={}", config.session_name),
        format!("i={}", config.session_info),
        format!("c=IN {} {}", address_type(&destination), destination),
        "t=0 0".to_string(),
        format!("a=tool:{}", config.tool),
        "a=sendonly".to_string(),
    ];

    for block in blocks {
        sdp.extend(block.sdp.lines().map(str::to_string));
        sdp.push(format!("a=control:trackID={}", block.track_id));
    }

    tracing::trace!("SDP: {}", sdp.join("\r\n"));

    format!("{}\r\n", sdp.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    #[test]
    fn session_level_lines() {
        let sdp = generate_sdp(
            &SdpConfig::default(),
            42,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
            &[],
        );
        assert!(sdp.starts_with("v=0\r\n"));
        assert!(sdp.contains("o=- 42 42 IN IP4 192.168.1.10\r\n"));
        assert!(sdp.contains("s=Unnamed\r\n"));
        assert!(sdp.contains("c=IN IP4 192.168.1.20\r\n"));
        assert!(sdp.contains("a=sendonly\r\n"));
        assert!(!sdp.contains("m="));
        assert!(sdp.ends_with("\r\n"));
    }

    #[test]
    fn blocks_get_control_lines_in_order() {
        let audio = "m=audio 5004 RTP/AVP 96\r\na=rtpmap:96 AMR/8000\r\n";
        let video = "m=video 5006 RTP/AVP 96\r\na=rtpmap:96 H263-1998/90000\r\n";
        let sdp = generate_sdp(
            &SdpConfig::default(),
            1,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            &[
                MediaBlock { track_id: 0, sdp: audio },
                MediaBlock { track_id: 1, sdp: video },
            ],
        );

        let m_audio = sdp.find("m=audio").unwrap();
        let ctl0 = sdp.find("a=control:trackID=0\r\n").unwrap();
        let m_video = sdp.find("m=video").unwrap();
        let ctl1 = sdp.find("a=control:trackID=1\r\n").unwrap();
        assert!(sdp.find("a=sendonly").unwrap() < m_audio);
        assert!(m_audio < ctl0 && ctl0 < m_video && m_video < ctl1);
        assert!(!sdp.contains("\r\n\r\n"));
    }

    #[test]
    fn ipv6_addresses() {
        let sdp = generate_sdp(
            &SdpConfig::default(),
            7,
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            &[],
        );
        assert!(sdp.contains("o=- 7 7 IN IP6 ::1\r\n"));
        assert!(sdp.contains("c=IN IP6 ::1\r\n"));
    }
}
