use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use crate::error::Result;
use crate::stream::PortPair;

/// Attempts at binding an adjacent even/odd local pair before giving up on
/// adjacency.
const MAX_PAIR_ATTEMPTS: usize = 16;

/// UDP transport for one track: an RTP socket and its RTCP companion.
///
/// Both sockets are connected to the destination, so sends need no address.
pub struct UdpTransport {
    rtp: UdpSocket,
    rtcp: UdpSocket,
    destination: IpAddr,
    local: PortPair,
}

impl UdpTransport {
    /// Bind a local port pair, apply `ttl` and connect to `destination`.
    pub fn open(destination: IpAddr, remote: PortPair, ttl: u32) -> Result<Self> {
        let (rtp, rtcp) = bind_pair(destination)?;
        let local = PortPair::new(rtp.local_addr()?.port(), rtcp.local_addr()?.port());

        let transport = Self {
            rtp,
            rtcp,
            destination,
            local,
        };
        transport.set_ttl(ttl)?;

        transport
            .rtp
            .connect(SocketAddr::new(destination, remote.rtp))?;
        transport
            .rtcp
            .connect(SocketAddr::new(destination, remote.rtcp))?;

        tracing::debug!(
            %destination,
            remote = %remote,
            local = %local,
            ttl,
            "UDP transport opened"
        );
        Ok(transport)
    }

    pub fn local_ports(&self) -> PortPair {
        self.local
    }

    /// Apply the hop limit to both sockets.
    ///
    /// Multicast IPv4 destinations use the multicast TTL. IPv6 hop limits
    /// are left to the OS default.
    pub fn set_ttl(&self, ttl: u32) -> Result<()> {
        match self.destination {
            IpAddr::V4(addr) if addr.is_multicast() => {
                self.rtp.set_multicast_ttl_v4(ttl)?;
                self.rtcp.set_multicast_ttl_v4(ttl)?;
            }
            IpAddr::V4(_) => {
                self.rtp.set_ttl(ttl)?;
                self.rtcp.set_ttl(ttl)?;
            }
            IpAddr::V6(_) => {
                tracing::debug!(ttl, "TTL not applied to IPv6 destination");
            }
        }
        Ok(())
    }

    pub fn send(&self, packet: &[u8]) -> Result<usize> {
        Ok(self.rtp.send(packet)?)
    }
}

fn bind_pair(destination: IpAddr) -> Result<(UdpSocket, UdpSocket)> {
    let unspecified = match destination {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };

    for _ in 0..MAX_PAIR_ATTEMPTS {
        let rtp = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
        let port = rtp.local_addr()?.port();
        if port % 2 != 0 {
            continue;
        }
        if let Ok(rtcp) = UdpSocket::bind(SocketAddr::new(unspecified, port + 1)) {
            return Ok((rtp, rtcp));
        }
    }

    tracing::warn!("no adjacent local port pair available, using independent ports");
    let rtp = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
    let rtcp = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
    Ok((rtp, rtcp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_send_to_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();

        let transport = UdpTransport::open(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            PortPair::new(port, port.wrapping_add(1)),
            64,
        )
        .unwrap();
        assert_ne!(transport.local_ports().rtp, 0);

        transport.send(b"ping").unwrap();
        let mut buf = [0u8; 16];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }
}
