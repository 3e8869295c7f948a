//! IEEE 802.15.4 wire constants (2003, 2006 and 2015 frame versions).

pub const FRAME_CONTROL_LEN: usize = 2;
pub const FCS_LEN: usize = 2;

pub const FC_FRAME_TYPE_MASK: u16 = 0x0007;
pub const FC_SECURITY: u16 = 0x0008;
pub const FC_FRAME_PENDING: u16 = 0x0010;
pub const FC_ACK_REQUEST: u16 = 0x0020;
pub const FC_PAN_ID_COMPRESSION: u16 = 0x0040;
pub const FC_SEQ_SUPPRESSION: u16 = 0x0100;
pub const FC_IE_PRESENT: u16 = 0x0200;
pub const FC_DST_MODE_SHIFT: u16 = 10;
pub const FC_VERSION_SHIFT: u16 = 12;
pub const FC_SRC_MODE_SHIFT: u16 = 14;
pub const FC_TWO_BIT_MASK: u16 = 0x0003;

pub const FRAME_BEACON: u8 = 0;
pub const FRAME_COMMAND: u8 = 3;

pub const ADDR_NONE: u8 = 0;
pub const ADDR_SHORT: u8 = 2;
pub const ADDR_EXTENDED: u8 = 3;

pub const VERSION_2015: u8 = 2;
pub const VERSION_RESERVED: u8 = 3;

pub const SEC_LEVEL_MASK: u8 = 0x07;
pub const SEC_KEY_ID_MODE_SHIFT: u8 = 3;
pub const SEC_KEY_ID_MODE_MASK: u8 = 0x03;
pub const SEC_FRAME_COUNTER_SUPPRESSION: u8 = 0x20;

pub const IE_HEADER_LEN: usize = 2;
pub const IE_TYPE_PAYLOAD: u16 = 0x8000;
pub const HIE_LENGTH_MASK: u16 = 0x007f;
pub const HIE_ID_SHIFT: u16 = 7;
pub const HIE_ID_MASK: u16 = 0x00ff;
pub const PIE_LENGTH_MASK: u16 = 0x07ff;
pub const PIE_GROUP_SHIFT: u16 = 11;
pub const PIE_GROUP_MASK: u16 = 0x000f;
pub const SUB_IE_LONG: u16 = 0x8000;
pub const SUB_IE_SHORT_LENGTH_MASK: u16 = 0x00ff;
pub const SUB_IE_SHORT_ID_SHIFT: u16 = 8;
pub const SUB_IE_SHORT_ID_MASK: u16 = 0x007f;
pub const SUB_IE_LONG_LENGTH_MASK: u16 = 0x07ff;
pub const SUB_IE_LONG_ID_SHIFT: u16 = 11;
pub const SUB_IE_LONG_ID_MASK: u16 = 0x000f;
/// Long sub-IE ids are kept apart from short ones in one table.
pub const SUB_IE_LONG_NAMESPACE: u32 = 0x100;

pub const HIE_VENDOR: u32 = 0x00;
pub const HIE_CSL: u32 = 0x1a;
pub const HIE_RIT: u32 = 0x1b;
pub const HIE_RENDEZVOUS: u32 = 0x1d;
pub const HIE_TIME_CORRECTION: u32 = 0x1e;
pub const HIE_TERMINATION_1: u32 = 0x7e;
pub const HIE_TERMINATION_2: u32 = 0x7f;

pub const PIE_ESDU: u32 = 0x0;
pub const PIE_MLME: u32 = 0x1;
pub const PIE_VENDOR: u32 = 0x2;
pub const PIE_MPX: u32 = 0x3;
pub const PIE_TERMINATION: u32 = 0xf;

pub const MLME_TSCH_SYNC: u32 = 0x1a;
pub const MLME_TSCH_SLOTFRAME_LINK: u32 = 0x1b;
pub const MLME_TSCH_TIMESLOT: u32 = 0x1c;
pub const MLME_HOPPING_TIMING: u32 = 0x1d;
pub const MLME_EB_FILTER: u32 = 0x1e;
pub const MLME_CHANNEL_HOPPING: u32 = SUB_IE_LONG_NAMESPACE | 0x9;

pub const TIME_CORRECTION_MASK: u16 = 0x0fff;
pub const TIME_CORRECTION_BITS: u32 = 12;
pub const TIME_CORRECTION_NACK: u16 = 0x8000;

pub const TSCH_LINK_LEN: usize = 5;

pub const SF_BEACON_ORDER_MASK: u16 = 0x000f;
pub const SF_SUPERFRAME_ORDER_SHIFT: u16 = 4;
pub const SF_FINAL_CAP_SHIFT: u16 = 8;
pub const SF_NIBBLE_MASK: u16 = 0x000f;
pub const SF_BATTERY_EXTENSION: u16 = 0x1000;
pub const SF_PAN_COORDINATOR: u16 = 0x4000;
pub const SF_ASSOCIATION_PERMIT: u16 = 0x8000;

pub const GTS_COUNT_MASK: u8 = 0x07;
pub const GTS_PERMIT: u8 = 0x80;
pub const PENDING_SHORT_MASK: u8 = 0x07;
pub const PENDING_EXT_SHIFT: u8 = 4;

pub const CMD_ASSOCIATION_REQUEST: u8 = 0x01;
pub const CMD_ASSOCIATION_RESPONSE: u8 = 0x02;
pub const CMD_DISASSOCIATION: u8 = 0x03;
