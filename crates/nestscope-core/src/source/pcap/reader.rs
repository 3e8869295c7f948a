use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;
use pcap_parser::Linktype;

/// Timestamp and link settings of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interface {
    pub linktype: Linktype,
    units_per_second: f64,
    offset_seconds: f64,
}

impl Interface {
    /// Build from the `if_tsresol` and `if_tsoffset` options of an IDB.
    pub fn new(linktype: Linktype, tsresol: u8, tsoffset: f64) -> Self {
        let exponent = i32::from(tsresol & !layout::TSRESOL_BINARY);
        let units_per_second = if tsresol & layout::TSRESOL_BINARY != 0 {
            2f64.powi(exponent)
        } else {
            10f64.powi(exponent)
        };
        Self {
            linktype,
            units_per_second,
            offset_seconds: tsoffset,
        }
    }

    /// Seconds since the epoch for a packet's split 64-bit timestamp.
    pub fn timestamp(&self, ts_high: u32, ts_low: u32) -> f64 {
        let units = (u64::from(ts_high) << 32) | u64::from(ts_low);
        self.offset_seconds + units as f64 / self.units_per_second
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self::new(layout::DEFAULT_LINKTYPE, layout::DEFAULT_TSRESOL, 0.0)
    }
}

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `PcapSourceError::Io` when the file holds fewer than four bytes or
/// cannot be rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Interface a packet refers to. Ids never described fall back to Ethernet
/// with microsecond timestamps.
pub fn interface_for(interfaces: &[Interface], if_id: u32) -> Interface {
    interfaces.get(if_id as usize).copied().unwrap_or_default()
}

/// Split a packet record into its captured bytes and original length.
///
/// `data` may carry block padding past `caplen`, and a damaged record may
/// claim more than it holds; the captured slice never exceeds either.
pub fn captured_bytes(data: &[u8], caplen: u32, origlen: u32) -> (Vec<u8>, usize) {
    let caplen = (caplen as usize).min(data.len());
    let captured = data.get(..caplen).unwrap_or(data).to_vec();
    let original = (origlen as usize).max(captured.len());
    (captured, original)
}
