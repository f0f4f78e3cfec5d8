use std::fmt;
use std::net::IpAddr;

use crate::error::{Result, StreamError};
use crate::transport::{InterleavedOutput, SharedOutput, Transport, UdpTransport};

use super::bitrate::BitrateMeter;
use super::rtp::{DYNAMIC_PAYLOAD_TYPE, RtpHeader};
use super::{MediaKind, PortPair, StreamState};

/// Default hop limit for outgoing packets.
pub const DEFAULT_TTL: u32 = 64;

/// Codec-independent half of every track.
///
/// Owns addressing, the lifecycle state, the RTP header state and the open
/// transport. Codec variants compose it and contribute only their SDP
/// attributes (see [`Stream::prepare`](super::Stream::prepare)).
pub struct MediaStream {
    state: StreamState,
    destination: Option<IpAddr>,
    destination_ports: Option<PortPair>,
    ttl: u32,
    output: Option<(SharedOutput, u8)>,
    transport: Option<Transport>,
    local_ports: Option<PortPair>,
    header: RtpHeader,
    bitrate: BitrateMeter,
    description: Option<String>,
}

impl MediaStream {
    pub fn new() -> Self {
        Self {
            state: StreamState::Unconfigured,
            destination: None,
            destination_ports: None,
            ttl: DEFAULT_TTL,
            output: None,
            transport: None,
            local_ports: None,
            header: RtpHeader::with_random_ssrc(DYNAMIC_PAYLOAD_TYPE),
            bitrate: BitrateMeter::new(),
            description: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn ssrc(&self) -> u32 {
        self.header.ssrc()
    }

    pub fn payload_type(&self) -> u8 {
        self.header.payload_type()
    }

    pub fn set_destination_address(&mut self, destination: IpAddr) {
        self.destination = Some(destination);
    }

    pub fn destination_address(&self) -> Option<IpAddr> {
        self.destination
    }

    pub fn set_destination_ports(&mut self, ports: PortPair) {
        tracing::trace!(ssrc = self.ssrc(), ports = %ports, "destination ports set");
        self.destination_ports = Some(ports);
    }

    pub fn destination_ports(&self) -> Option<PortPair> {
        self.destination_ports
    }

    pub fn local_ports(&self) -> Option<PortPair> {
        self.local_ports
    }

    pub fn time_to_live(&self) -> u32 {
        self.ttl
    }

    /// Store the TTL and, while streaming, apply it to the open socket.
    pub fn set_time_to_live(&mut self, ttl: u32) -> Result<()> {
        if let Some(transport) = &self.transport {
            transport.set_ttl(ttl)?;
        }
        self.ttl = ttl;
        Ok(())
    }

    /// Redirect packets to an interleaved RTSP connection on `channel`.
    ///
    /// Takes effect at the next `start()`.
    pub fn set_output_stream(&mut self, writer: SharedOutput, channel: u8) {
        self.output = Some((writer, channel));
    }

    /// Return to UDP delivery at the next `start()`.
    pub fn clear_output_stream(&mut self) {
        self.output = None;
    }

    pub fn is_interleaved(&self) -> bool {
        self.output.is_some()
    }

    /// Fail unless `configure()` may run now.
    pub(crate) fn ensure_configurable(&self) -> Result<()> {
        if self.state == StreamState::Streaming {
            return Err(StreamError::invalid_state(
                "configure() cannot be called while streaming",
            ));
        }
        if self.output.is_some() {
            return Ok(());
        }
        self.udp_target().map(|_| ())
    }

    /// Destination address and routable ports for UDP delivery.
    fn udp_target(&self) -> Result<(IpAddr, PortPair)> {
        let destination = self.destination.ok_or_else(|| {
            StreamError::invalid_state("no destination address set for the stream")
        })?;
        match self.destination_ports {
            Some(ports) if ports.is_routable() => Ok((destination, ports)),
            _ => Err(StreamError::invalid_state(
                "no destination ports set for the stream",
            )),
        }
    }

    /// Record a successful configuration and render the SDP media block.
    pub(crate) fn mark_configured(&mut self, kind: MediaKind, attributes: Vec<String>) {
        let port = match (&self.output, self.destination_ports) {
            (None, Some(ports)) => ports.rtp,
            _ => 0,
        };

        let mut lines = Vec::with_capacity(attributes.len() + 1);
        lines.push(format!(
            "m={} {} RTP/AVP {}",
            kind,
            port,
            self.payload_type()
        ));
        lines.extend(attributes);

        self.description = Some(format!("{}\r\n", lines.join("\r\n")));
        self.state = StreamState::Configured;
        tracing::debug!(ssrc = self.ssrc(), %kind, "stream configured");
    }

    pub fn session_description(&self) -> Result<String> {
        match (&self.description, self.state) {
            (Some(sdp), StreamState::Configured | StreamState::Streaming) => Ok(sdp.clone()),
            _ => Err(StreamError::invalid_state(
                "configure() must succeed before the session description is available",
            )),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            StreamState::Unconfigured => {
                return Err(StreamError::invalid_state(
                    "configure() must succeed before start()",
                ));
            }
            StreamState::Streaming => return Ok(()),
            StreamState::Configured => {}
        }

        let transport = match &self.output {
            Some((writer, channel)) => {
                Transport::Interleaved(InterleavedOutput::new(writer.clone(), *channel))
            }
            None => {
                let (destination, ports) = self.udp_target()?;
                Transport::Udp(UdpTransport::open(destination, ports, self.ttl)?)
            }
        };

        self.local_ports = transport.local_ports().or(self.local_ports);
        self.transport = Some(transport);
        self.state = StreamState::Streaming;
        tracing::debug!(ssrc = self.ssrc(), local = ?self.local_ports, "stream started");
        Ok(())
    }

    /// Release the transport. Never fails.
    pub fn stop(&mut self) {
        if let Some(Transport::Interleaved(out)) = &self.transport {
            if let Err(e) = out.flush() {
                tracing::warn!(ssrc = self.ssrc(), error = %e, "flush on stop failed");
            }
        }
        self.transport = None;
        self.bitrate.reset();

        if self.state == StreamState::Streaming {
            self.state = StreamState::Configured;
            tracing::debug!(ssrc = self.ssrc(), "stream stopped");
        }
    }

    /// Frame `payload` with the next RTP header and send it.
    ///
    /// Returns the number of bytes handed to the transport.
    pub fn send_payload(&mut self, payload: &[u8], marker: bool) -> Result<usize> {
        let Some(transport) = &self.transport else {
            return Err(StreamError::invalid_state(
                "start() must succeed before sending",
            ));
        };

        let header = self.header.write(marker);
        let mut packet = Vec::with_capacity(header.len() + payload.len());
        packet.extend_from_slice(&header);
        packet.extend_from_slice(payload);

        let sent = transport.send(&packet)?;
        self.bitrate.record(sent);
        tracing::trace!(
            ssrc = self.ssrc(),
            seq = self.header.sequence(),
            bytes = sent,
            "RTP packet sent"
        );
        Ok(sent)
    }

    pub fn advance_timestamp(&mut self, increment: u32) {
        self.header.advance_timestamp(increment);
    }

    pub fn rtp_timestamp(&self) -> u32 {
        self.header.timestamp() as u32
    }

    pub fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }

    pub fn bitrate(&self) -> u64 {
        self.bitrate.bits_per_second()
    }
}

impl Default for MediaStream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("state", &self.state)
            .field("ssrc", &format_args!("{:#010X}", self.ssrc()))
            .field("destination", &self.destination)
            .field("destination_ports", &self.destination_ports)
            .field("local_ports", &self.local_ports)
            .field("ttl", &self.ttl)
            .field("interleaved", &self.output.as_ref().map(|(_, ch)| *ch))
            .finish_non_exhaustive()
    }
}
