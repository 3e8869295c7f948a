use pcap_parser::Linktype;

pub const LINKTYPE_IEEE802_15_4_WITHFCS: Linktype = Linktype(195);
pub const LINKTYPE_IEEE802_15_4_NOFCS: Linktype = Linktype(230);

pub const ETHERNET_HEADER_LEN: usize = 14;
/// EtherType values up to this are IEEE 802.3 length fields.
pub const MAX_8023_LENGTH: u16 = 1500;
/// LLC header of OSI network layer traffic (DSAP, SSAP, UI control).
pub const LLC_OSI: [u8; 3] = [0xfe, 0xfe, 0x03];
pub const LLC_LEN: usize = 3;

pub const UDP_HEADER_LEN: usize = 8;
