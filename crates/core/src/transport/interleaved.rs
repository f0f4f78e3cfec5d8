use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Writer shared between an RTSP connection and the tracks it carries.
pub type SharedOutput = Arc<Mutex<dyn Write + Send>>;

/// RTP over the RTSP TCP connection (RFC 2326 §10.12).
///
/// Each packet is framed as:
///
/// ```text
/// '$' | channel (1 byte) | length (2 bytes, big endian) | packet
/// ```
///
/// RTP uses `channel`; RTCP would use `channel + 1`.
pub struct InterleavedOutput {
    writer: SharedOutput,
    channel: u8,
}

impl InterleavedOutput {
    pub fn new(writer: SharedOutput, channel: u8) -> Self {
        Self { writer, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    pub fn send(&self, packet: &[u8]) -> Result<usize> {
        let len = u16::try_from(packet.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("packet of {} bytes exceeds interleaved frame", packet.len()),
            )
        })?;

        let mut frame = Vec::with_capacity(4 + packet.len());
        frame.push(b'$');
        frame.push(self.channel);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(packet);

        let mut writer = self.writer.lock();
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(frame.len())
    }
}
