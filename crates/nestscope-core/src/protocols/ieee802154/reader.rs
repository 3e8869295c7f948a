use std::fmt;

use super::layout;
use crate::protocols::common::reader::flag_names;
use crate::wire::{Cursor, DecodeError};

pub(super) const FRAME_TYPES: &[(u32, &str)] = &[
    (0, "Beacon"),
    (1, "Data"),
    (2, "Ack"),
    (3, "Command"),
    (4, "Reserved"),
    (5, "Multipurpose"),
    (6, "Fragment"),
    (7, "Extended"),
];

const FRAME_CONTROL_FLAGS: &[(u32, &str)] = &[
    (layout::FC_SECURITY as u32, "security"),
    (layout::FC_FRAME_PENDING as u32, "pending"),
    (layout::FC_ACK_REQUEST as u32, "ack-request"),
    (layout::FC_PAN_ID_COMPRESSION as u32, "pan-id-compression"),
    (layout::FC_SEQ_SUPPRESSION as u32, "seq-suppression"),
    (layout::FC_IE_PRESENT as u32, "ie-present"),
];

const SECURITY_LEVELS: &[&str] = &[
    "none",
    "MIC-32",
    "MIC-64",
    "MIC-128",
    "ENC",
    "ENC-MIC-32",
    "ENC-MIC-64",
    "ENC-MIC-128",
];

/// The little-endian frame control word.
///
/// # Examples
/// ```
/// use nestscope_core::protocols::ieee802154::reader::FrameControl;
///
/// let fc = FrameControl(0x9861);
/// assert_eq!(fc.frame_type(), 1);
/// assert_eq!(fc.version(), 1);
/// assert!(fc.ack_request());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl(pub u16);

impl FrameControl {
    pub fn frame_type(self) -> u8 {
        (self.0 & layout::FC_FRAME_TYPE_MASK) as u8
    }

    pub fn security_enabled(self) -> bool {
        self.0 & layout::FC_SECURITY != 0
    }

    pub fn frame_pending(self) -> bool {
        self.0 & layout::FC_FRAME_PENDING != 0
    }

    pub fn ack_request(self) -> bool {
        self.0 & layout::FC_ACK_REQUEST != 0
    }

    pub fn pan_id_compression(self) -> bool {
        self.0 & layout::FC_PAN_ID_COMPRESSION != 0
    }

    /// Sequence number suppression only exists from the 2015 revision on.
    pub fn sequence_suppressed(self) -> bool {
        self.version() == layout::VERSION_2015 && self.0 & layout::FC_SEQ_SUPPRESSION != 0
    }

    pub fn ie_present(self) -> bool {
        self.0 & layout::FC_IE_PRESENT != 0
    }

    pub fn dst_mode(self) -> u8 {
        ((self.0 >> layout::FC_DST_MODE_SHIFT) & layout::FC_TWO_BIT_MASK) as u8
    }

    pub fn version(self) -> u8 {
        ((self.0 >> layout::FC_VERSION_SHIFT) & layout::FC_TWO_BIT_MASK) as u8
    }

    pub fn src_mode(self) -> u8 {
        ((self.0 >> layout::FC_SRC_MODE_SHIFT) & layout::FC_TWO_BIT_MASK) as u8
    }

    pub fn flags(self) -> String {
        flag_names(u32::from(self.0), FRAME_CONTROL_FLAGS)
    }
}

/// Which PAN identifiers are carried, `(destination, source)`.
///
/// Frame versions 0 and 1 only omit the source PAN under compression; the
/// 2015 revision replaces that rule with a table over both address modes.
pub fn pan_id_presence(fc: FrameControl, offset: usize) -> Result<(bool, bool), DecodeError> {
    let dst = fc.dst_mode();
    let src = fc.src_mode();
    let compressed = fc.pan_id_compression();
    if fc.version() < layout::VERSION_2015 {
        if compressed && (dst == layout::ADDR_NONE || src == layout::ADDR_NONE) {
            return Err(DecodeError::malformed(
                offset,
                "PAN ID compression without both addresses",
            ));
        }
        return Ok((dst != layout::ADDR_NONE, src != layout::ADDR_NONE && !compressed));
    }
    let presence = match (dst, src) {
        (layout::ADDR_NONE, layout::ADDR_NONE) => (compressed, false),
        (_, layout::ADDR_NONE) => (!compressed, false),
        (layout::ADDR_NONE, _) => (false, !compressed),
        (layout::ADDR_EXTENDED, layout::ADDR_EXTENDED) => (!compressed, false),
        _ => (true, !compressed),
    };
    Ok(presence)
}

/// A short or extended MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Short(u16),
    Extended(u64),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Short(short) => write!(f, "0x{short:04x}"),
            Address::Extended(extended) => {
                for (index, byte) in extended.to_be_bytes().iter().enumerate() {
                    if index > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Read an address in `mode`; `None` for the "not present" mode.
pub fn read_address(cursor: &mut Cursor<'_>, mode: u8) -> Result<Option<Address>, DecodeError> {
    match mode {
        layout::ADDR_NONE => Ok(None),
        layout::ADDR_SHORT => Ok(Some(Address::Short(cursor.read_u16_le()?))),
        layout::ADDR_EXTENDED => Ok(Some(Address::Extended(cursor.read_u64_le()?))),
        _ => Err(DecodeError::malformed(
            cursor.offset(),
            "reserved addressing mode",
        )),
    }
}

/// Auxiliary security header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxSecurity {
    pub level: u8,
    pub key_id_mode: u8,
    pub frame_counter: Option<u32>,
    pub key_source: Option<u64>,
    pub key_index: Option<u8>,
}

impl AuxSecurity {
    pub fn level_name(&self) -> &'static str {
        SECURITY_LEVELS[usize::from(self.level & layout::SEC_LEVEL_MASK)]
    }

    /// Length of the message integrity code that ends the frame.
    pub fn mic_len(&self) -> usize {
        match self.level & 0x03 {
            0 => 0,
            1 => 4,
            2 => 8,
            _ => 16,
        }
    }

    /// Whether the payload is encrypted rather than only authenticated.
    pub fn encrypted(&self) -> bool {
        self.level & 0x04 != 0
    }
}

pub fn read_aux_security(
    cursor: &mut Cursor<'_>,
    fc: FrameControl,
) -> Result<AuxSecurity, DecodeError> {
    let control = cursor.read_u8()?;
    let level = control & layout::SEC_LEVEL_MASK;
    let key_id_mode = (control >> layout::SEC_KEY_ID_MODE_SHIFT) & layout::SEC_KEY_ID_MODE_MASK;
    let counter_suppressed = fc.version() == layout::VERSION_2015
        && control & layout::SEC_FRAME_COUNTER_SUPPRESSION != 0;
    let frame_counter = if counter_suppressed {
        None
    } else {
        Some(cursor.read_u32_le()?)
    };
    let key_source = match key_id_mode {
        2 => Some(u64::from(cursor.read_u32_le()?)),
        3 => Some(cursor.read_u64_le()?),
        _ => None,
    };
    let key_index = if key_id_mode == 0 {
        None
    } else {
        Some(cursor.read_u8()?)
    };
    Ok(AuxSecurity {
        level,
        key_id_mode,
        frame_counter,
        key_source,
        key_index,
    })
}

#[cfg(test)]
mod tests {
    use super::{Address, FrameControl, pan_id_presence, read_address, read_aux_security};
    use crate::wire::{Cursor, DecodeError};

    fn fc(version: u16, dst: u16, src: u16, compressed: bool) -> FrameControl {
        let mut word = 0x0001 | (dst << 10) | (version << 12) | (src << 14);
        if compressed {
            word |= 0x0040;
        }
        FrameControl(word)
    }

    #[test]
    fn frame_control_fields_decode() {
        let fc = FrameControl(0x9861);
        assert_eq!(fc.frame_type(), 1);
        assert_eq!(fc.dst_mode(), 2);
        assert_eq!(fc.src_mode(), 2);
        assert_eq!(fc.version(), 1);
        assert!(fc.pan_id_compression());
        assert_eq!(fc.flags(), "ack-request, pan-id-compression");
    }

    #[test]
    fn sequence_suppression_needs_2015_frames() {
        assert!(!FrameControl(0x1101).sequence_suppressed());
        assert!(FrameControl(0x2101).sequence_suppressed());
    }

    #[test]
    fn legacy_compression_drops_source_pan() {
        assert_eq!(pan_id_presence(fc(1, 2, 2, true), 0).unwrap(), (true, false));
        assert_eq!(pan_id_presence(fc(1, 2, 3, false), 0).unwrap(), (true, true));
        assert_eq!(pan_id_presence(fc(0, 0, 2, false), 0).unwrap(), (false, true));
        let err = pan_id_presence(fc(1, 0, 2, true), 0).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn version_2015_follows_presence_table() {
        assert_eq!(pan_id_presence(fc(2, 0, 0, false), 0).unwrap(), (false, false));
        assert_eq!(pan_id_presence(fc(2, 0, 0, true), 0).unwrap(), (true, false));
        assert_eq!(pan_id_presence(fc(2, 3, 3, false), 0).unwrap(), (true, false));
        assert_eq!(pan_id_presence(fc(2, 3, 3, true), 0).unwrap(), (false, false));
        assert_eq!(pan_id_presence(fc(2, 2, 3, true), 0).unwrap(), (true, false));
        assert_eq!(pan_id_presence(fc(2, 2, 2, false), 0).unwrap(), (true, true));
        assert_eq!(pan_id_presence(fc(2, 0, 2, true), 0).unwrap(), (false, false));
    }

    #[test]
    fn extended_address_prints_most_significant_first() {
        let data = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01];
        let mut cursor = Cursor::from_slice(&data);
        let address = read_address(&mut cursor, 3).unwrap().unwrap();
        assert_eq!(address.to_string(), "01:02:03:04:05:06:07:08");
        assert_eq!(Address::Short(0xbeef).to_string(), "0xbeef");
        assert!(read_address(&mut cursor, 0).unwrap().is_none());
    }

    #[test]
    fn reserved_address_mode_is_malformed() {
        let mut cursor = Cursor::from_slice(&[0, 0]);
        assert!(read_address(&mut cursor, 1).unwrap_err().is_malformed());
    }

    #[test]
    fn aux_security_reads_key_identifier() {
        // ENC-MIC-64, key id mode 2, counter 1, key source 0x04030201, index 9
        let data = [0x16, 1, 0, 0, 0, 1, 2, 3, 4, 9];
        let mut cursor = Cursor::from_slice(&data);
        let aux = read_aux_security(&mut cursor, fc(1, 2, 2, true)).unwrap();
        assert_eq!(aux.level_name(), "ENC-MIC-64");
        assert_eq!(aux.mic_len(), 8);
        assert!(aux.encrypted());
        assert_eq!(aux.frame_counter, Some(1));
        assert_eq!(aux.key_source, Some(0x0403_0201));
        assert_eq!(aux.key_index, Some(9));
        assert!(cursor.is_empty());
    }

    #[test]
    fn suppressed_frame_counter_is_absent() {
        let data = [0x25];
        let mut cursor = Cursor::from_slice(&data);
        let aux = read_aux_security(&mut cursor, fc(2, 2, 2, false)).unwrap();
        assert_eq!(aux.frame_counter, None);
        assert_eq!(aux.mic_len(), 4);
        assert!(aux.encrypted());
    }
}
