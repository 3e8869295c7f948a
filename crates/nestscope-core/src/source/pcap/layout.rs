/// Section header block type, which is also the PCAPNG file magic.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];
pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;
/// Linktype assumed when a packet's interface was never described.
pub const DEFAULT_LINKTYPE: pcap_parser::Linktype = pcap_parser::Linktype::ETHERNET;
/// `if_tsresol` when the option is absent: 10^-6 seconds.
pub const DEFAULT_TSRESOL: u8 = 6;
/// Set in `if_tsresol` when the exponent is a power of two.
pub const TSRESOL_BINARY: u8 = 0x80;
