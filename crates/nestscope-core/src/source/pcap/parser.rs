use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::{Format, PcapSourceError, Stage};
use super::layout;
use super::reader::{Interface, captured_bytes, interface_for, is_pcapng_magic, read_magic_and_rewind};

pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        link: LegacyLink,
    },
    Ng {
        reader: PcapNGReader<File>,
        /// Interfaces of the current section, indexed by interface id.
        interfaces: Vec<Interface>,
    },
}

/// Settings from the global header of a legacy capture.
struct LegacyLink {
    linktype: Linktype,
    subsecond_units: f64,
}

impl Default for LegacyLink {
    fn default() -> Self {
        Self {
            linktype: layout::DEFAULT_LINKTYPE,
            subsecond_units: 1e6,
        }
    }
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        log::debug!("opened capture {}", path.display());
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        let event = match &mut self.inner {
            PcapReader::Legacy { reader, link } => {
                next_event(reader, Format::Pcap, |block| legacy_block(block, link))
            }
            PcapReader::Ng { reader, interfaces } => {
                next_event(reader, Format::PcapNg, |block| ng_block(block, interfaces))
            }
        }?;
        Ok(event)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;
    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::reader(Format::PcapNg, Stage::Init, e))?;
        Ok(PcapReader::Ng {
            reader,
            interfaces: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::reader(Format::Pcap, Stage::Init, e))?;
        Ok(PcapReader::Legacy {
            reader,
            link: LegacyLink::default(),
        })
    }
}

/// Pull blocks until `to_event` turns one into a packet or the file ends.
fn next_event<R, F>(
    reader: &mut R,
    format: Format,
    mut to_event: F,
) -> Result<Option<PacketEvent>, PcapSourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = to_event(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| PcapSourceError::reader(format, Stage::Refill, e))?;
            }
            Err(e) => return Err(PcapSourceError::reader(format, Stage::Next, e)),
        }
    }
}

fn legacy_block(block: PcapBlockOwned<'_>, link: &mut LegacyLink) -> Option<PacketEvent> {
    match block {
        PcapBlockOwned::LegacyHeader(header) => {
            link.linktype = header.network;
            link.subsecond_units = if header.is_nanosecond_precision() { 1e9 } else { 1e6 };
            None
        }
        PcapBlockOwned::Legacy(packet) => {
            let (captured, original_len) = captured_bytes(packet.data, packet.caplen, packet.origlen);
            let ts = f64::from(packet.ts_sec) + f64::from(packet.ts_usec) / link.subsecond_units;
            Some(PacketEvent {
                ts: Some(ts),
                linktype: link.linktype,
                captured,
                original_len,
            })
        }
        _ => None,
    }
}

fn ng_block(block: PcapBlockOwned<'_>, interfaces: &mut Vec<Interface>) -> Option<PacketEvent> {
    match block {
        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
            interfaces.clear();
            None
        }
        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
            interfaces.push(Interface::new(
                idb.linktype,
                idb.if_tsresol,
                idb.if_tsoffset as f64,
            ));
            None
        }
        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
            let interface = interface_for(interfaces, packet.if_id);
            let (captured, original_len) = captured_bytes(packet.data, packet.caplen, packet.origlen);
            Some(PacketEvent {
                ts: Some(interface.timestamp(packet.ts_high, packet.ts_low)),
                linktype: interface.linktype,
                captured,
                original_len,
            })
        }
        PcapBlockOwned::NG(Block::SimplePacket(packet)) => {
            let interface = interface_for(interfaces, 0);
            let (captured, original_len) =
                captured_bytes(packet.data, packet.data.len() as u32, packet.origlen);
            Some(PacketEvent {
                ts: None,
                linktype: interface.linktype,
                captured,
                original_len,
            })
        }
        _ => None,
    }
}
