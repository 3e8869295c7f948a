//! Capture sources: where packets come from before any link decoding.

mod pcap;

pub use pcap::PcapFileSource;

use pcap::error::PcapSourceError;

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured packet as read from a capture file.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Seconds since the Unix epoch, when the file records it.
    pub ts: Option<f64>,
    pub linktype: Linktype,
    /// The bytes actually captured, possibly fewer than `original_len`.
    pub captured: Vec<u8>,
    /// Length of the packet on the wire.
    pub original_len: usize,
}

impl PacketEvent {
    /// Whether the capture snapshot length cut this packet short.
    pub fn is_truncated(&self) -> bool {
        self.captured.len() < self.original_len
    }
}

/// Anything that yields captured packets in file order.
pub trait PacketSource {
    /// `Ok(None)` once the capture is exhausted.
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The container framing is damaged or unsupported.
    #[error("capture format error: {0}")]
    Format(String),
}

impl From<PcapSourceError> for SourceError {
    fn from(value: PcapSourceError) -> Self {
        match value {
            PcapSourceError::Io(err) => SourceError::Io(err),
            reader @ PcapSourceError::Reader { .. } => SourceError::Format(reader.to_string()),
        }
    }
}
