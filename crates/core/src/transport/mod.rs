//! Packet delivery for a streaming track.
//!
//! A track sends RTP in one of two ways:
//!
//! - **UDP** ([`udp`]): a connected RTP/RTCP socket pair per track, bound
//!   when the track starts and dropped when it stops.
//!
//! - **Interleaved** ([`interleaved`]): RTP multiplexed onto the RTSP TCP
//!   connection using `$` framing, selected with
//!   [`Stream::set_output_stream`](crate::Stream::set_output_stream).

pub mod interleaved;
pub mod udp;

pub use interleaved::{InterleavedOutput, SharedOutput};
pub use udp::UdpTransport;

use crate::error::Result;
use crate::stream::PortPair;

/// The open transport of a streaming track.
pub enum Transport {
    Udp(UdpTransport),
    Interleaved(InterleavedOutput),
}

impl Transport {
    pub fn send(&self, packet: &[u8]) -> Result<usize> {
        match self {
            Self::Udp(udp) => udp.send(packet),
            Self::Interleaved(out) => out.send(packet),
        }
    }

    /// Local UDP ports; interleaved output has none.
    pub fn local_ports(&self) -> Option<PortPair> {
        match self {
            Self::Udp(udp) => Some(udp.local_ports()),
            Self::Interleaved(_) => None,
        }
    }

    pub fn set_ttl(&self, ttl: u32) -> Result<()> {
        match self {
            Self::Udp(udp) => udp.set_ttl(ttl),
            Self::Interleaved(_) => Ok(()),
        }
    }
}
