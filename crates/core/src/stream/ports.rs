use std::fmt;

/// An RTP/RTCP port pair.
///
/// Per RFC 3550 §11 RTP uses an even port and RTCP the next odd one.
/// [`PortPair::from_port`] derives a pair from either member; the
/// explicit constructor [`PortPair::new`] takes both as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortPair {
    pub rtp: u16,
    pub rtcp: u16,
}

impl PortPair {
    pub const fn new(rtp: u16, rtcp: u16) -> Self {
        Self { rtp, rtcp }
    }

    /// Derive the pair from a single port.
    ///
    /// An even `port` is the RTP port and `port + 1` is RTCP; an odd `port`
    /// is the RTCP port and `port - 1` is RTP. Never overflows: the largest
    /// even `u16` is 65534.
    pub const fn from_port(port: u16) -> Self {
        if port % 2 == 0 {
            Self::new(port, port + 1)
        } else {
            Self::new(port - 1, port)
        }
    }

    /// Whether both ports are usable as UDP destinations.
    pub const fn is_routable(&self) -> bool {
        self.rtp != 0 && self.rtcp != 0
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.rtp, self.rtcp)
    }
}
