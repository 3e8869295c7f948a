//! IS-IS wire constants (ISO 10589, RFC 5305/5308/8667).

pub const IRPD: u8 = 0x83;
pub const VERSION: u8 = 1;
pub const PDU_TYPE_MASK: u8 = 0x1f;

pub const SYSTEM_ID_LEN: usize = 6;

pub const PDU_L1_LAN_IIH: u8 = 15;
pub const PDU_L2_LAN_IIH: u8 = 16;
pub const PDU_P2P_IIH: u8 = 17;
pub const PDU_L1_LSP: u8 = 18;
pub const PDU_L2_LSP: u8 = 20;
pub const PDU_L1_CSNP: u8 = 24;
pub const PDU_L2_CSNP: u8 = 25;
pub const PDU_L1_PSNP: u8 = 26;
pub const PDU_L2_PSNP: u8 = 27;

pub const LAN_IIH_HEADER_LEN: usize = 27;
pub const P2P_IIH_HEADER_LEN: usize = 20;
pub const LSP_HEADER_LEN: usize = 27;
pub const CSNP_HEADER_LEN: usize = 33;
pub const PSNP_HEADER_LEN: usize = 17;

/// The LSP checksum covers the PDU from the LSP ID onwards.
pub const LSP_CHECKSUM_START: usize = 12;
/// Checksum field position relative to `LSP_CHECKSUM_START`.
pub const LSP_CHECKSUM_FIELD: usize = 12;

pub const CIRCUIT_TYPE_MASK: u8 = 0x03;
pub const PRIORITY_MASK: u8 = 0x7f;

pub const LSP_TYPE_PARTITION_REPAIR: u8 = 0x80;
pub const LSP_TYPE_ATTACHED_MASK: u8 = 0x78;
pub const LSP_TYPE_OVERLOAD: u8 = 0x04;
pub const LSP_TYPE_IS_TYPE_MASK: u8 = 0x03;

pub const IS_REACH_ENTRY_LEN: usize = 11;
pub const IP_REACH_ENTRY_LEN: usize = 12;
pub const LSP_ENTRY_LEN: usize = 16;
pub const MAC_ADDRESS_LEN: usize = 6;

pub const METRIC_VALUE_MASK: u8 = 0x3f;
pub const METRIC_UNSUPPORTED: u8 = 0x80;
pub const METRIC_EXTERNAL: u8 = 0x40;

pub const EXT_IP_UP_DOWN: u8 = 0x80;
pub const EXT_IP_SUB_TLVS: u8 = 0x40;
pub const EXT_IP_PREFIX_LEN_MASK: u8 = 0x3f;

pub const IPV6_UP_DOWN: u8 = 0x80;
pub const IPV6_EXTERNAL: u8 = 0x40;
pub const IPV6_SUB_TLVS: u8 = 0x20;

pub const AUTH_CLEARTEXT: u8 = 1;
pub const AUTH_HMAC_MD5: u8 = 54;

pub const MAX_IPV4_PREFIX: u8 = 32;
pub const MAX_IPV6_PREFIX: u8 = 128;
