//! Width- and endianness-generic integer extraction.
//!
//! Every read goes through [`Cursor::peek`], so no extractor can reach past
//! the captured boundary. Widths 1 through 8 are supported; 3, 5, 6 and 7
//! byte signed values are sign-extended from the top bit of their most
//! significant byte.

use super::cursor::Cursor;
use super::error::DecodeError;

/// Widest integer the extractor assembles.
pub const MAX_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Assemble an unsigned value, most significant byte first.
///
/// # Examples
/// ```
/// use nestscope_core::wire::uint_from_be;
///
/// assert_eq!(uint_from_be(&[0x01, 0x02, 0x03]), 0x010203);
/// ```
pub fn uint_from_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Assemble an unsigned value, least significant byte first.
pub fn uint_from_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Interpret the low `bits` bits of `value` as two's complement.
///
/// # Examples
/// ```
/// use nestscope_core::wire::sign_extend;
///
/// assert_eq!(sign_extend(0x800000, 24), -8_388_608);
/// assert_eq!(sign_extend(0x7ff, 12), 2047);
/// assert_eq!(sign_extend(0xfff, 12), -1);
/// ```
pub fn sign_extend(value: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let sign = 1u64 << (bits - 1);
    let mask = !0u64 << bits;
    if value & sign != 0 {
        (value | mask) as i64
    } else {
        (value & !mask) as i64
    }
}

pub fn sint_from_be(bytes: &[u8]) -> i64 {
    sign_extend(uint_from_be(bytes), (bytes.len() * 8) as u32)
}

pub fn sint_from_le(bytes: &[u8]) -> i64 {
    sign_extend(uint_from_le(bytes), (bytes.len() * 8) as u32)
}

fn check_width(cursor: &Cursor<'_>, width: usize) -> Result<(), DecodeError> {
    if (1..=MAX_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(DecodeError::malformed(
            cursor.offset(),
            "unsupported integer width",
        ))
    }
}

impl<'a> Cursor<'a> {
    /// Peek an unsigned integer without moving.
    pub fn peek_uint(&self, width: usize, endian: Endian) -> Result<u64, DecodeError> {
        check_width(self, width)?;
        let bytes = self.peek(width)?;
        Ok(match endian {
            Endian::Big => uint_from_be(bytes),
            Endian::Little => uint_from_le(bytes),
        })
    }

    pub fn read_uint(&mut self, width: usize, endian: Endian) -> Result<u64, DecodeError> {
        let value = self.peek_uint(width, endian)?;
        self.skip(width)?;
        Ok(value)
    }

    pub fn read_sint(&mut self, width: usize, endian: Endian) -> Result<i64, DecodeError> {
        let value = self.read_uint(width, endian)?;
        Ok(sign_extend(value, (width * 8) as u32))
    }

    pub fn read_uint_be(&mut self, width: usize) -> Result<u64, DecodeError> {
        self.read_uint(width, Endian::Big)
    }

    pub fn read_uint_le(&mut self, width: usize) -> Result<u64, DecodeError> {
        self.read_uint(width, Endian::Little)
    }

    pub fn read_sint_be(&mut self, width: usize) -> Result<i64, DecodeError> {
        self.read_sint(width, Endian::Big)
    }

    pub fn read_sint_le(&mut self, width: usize) -> Result<i64, DecodeError> {
        self.read_sint(width, Endian::Little)
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        Ok(self.peek_uint(1, Endian::Big)? as u8)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_uint_be(1)? as u8)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_uint_be(2)? as u16)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_uint_le(2)? as u16)
    }

    pub fn read_u24_be(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint_be(3)? as u32)
    }

    pub fn read_u24_le(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint_le(3)? as u32)
    }

    pub fn read_i24_be(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_sint_be(3)? as i32)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint_be(4)? as u32)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_uint_le(4)? as u32)
    }

    pub fn read_u40_le(&mut self) -> Result<u64, DecodeError> {
        self.read_uint_le(5)
    }

    pub fn read_u64_be(&mut self) -> Result<u64, DecodeError> {
        self.read_uint_be(8)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        self.read_uint_le(8)
    }

    /// IEEE 754 single precision, network order.
    pub fn read_f32_be(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_u32_be()?))
    }

    /// Fixed-size array copy of the next `N` bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{Endian, sign_extend, sint_from_be, uint_from_le};
    use crate::wire::{Cursor, DecodeError};

    fn sint_be(bytes: &[u8]) -> i64 {
        Cursor::from_slice(bytes).read_sint_be(bytes.len()).unwrap()
    }

    #[test]
    fn three_byte_signed_reads_extend_sign() {
        assert_eq!(sint_be(&[0x7f, 0xff, 0xff]), 8_388_607);
        assert_eq!(sint_be(&[0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(sint_be(&[0xff, 0xff, 0xff]), -1);
    }

    #[test]
    fn odd_widths_extend_from_top_byte() {
        assert_eq!(sint_be(&[0x80, 0, 0, 0, 0]), -(1i64 << 39));
        assert_eq!(sint_be(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]), -2);
        assert_eq!(sint_be(&[0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]), (1i64 << 55) - 1);
        assert_eq!(sint_be(&[0x80, 0, 0, 0, 0, 0, 0]), -(1i64 << 55));
    }

    #[test]
    fn native_widths_match_std() {
        assert_eq!(sint_be(&[0x80]), i64::from(i8::MIN));
        assert_eq!(sint_be(&[0xff, 0x7f]), i64::from(i16::from_be_bytes([0xff, 0x7f])));
        assert_eq!(sint_be(&[0x80, 0, 0, 1]), i64::from(i32::from_be_bytes([0x80, 0, 0, 1])));
        assert_eq!(sint_be(&[0xff; 8]), -1);
    }

    #[test]
    fn little_endian_sign_bit_is_in_last_byte() {
        let data = [0x00, 0x00, 0x80];
        let mut cursor = Cursor::from_slice(&data);
        assert_eq!(cursor.read_sint_le(3).unwrap(), -8_388_608);

        let data = [0xff, 0xff, 0x7f];
        let mut cursor = Cursor::from_slice(&data);
        assert_eq!(cursor.read_sint(3, Endian::Little).unwrap(), 8_388_607);
    }

    #[test]
    fn unsigned_odd_widths_are_weighted_sums() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut cursor = Cursor::from_slice(&data);
        assert_eq!(cursor.read_u40_le().unwrap(), 0x05_0403_0201);
        assert_eq!(uint_from_le(&[0x01, 0x02, 0x03]), 0x030201);
        let mut cursor = Cursor::from_slice(&data);
        assert_eq!(cursor.read_u24_be().unwrap(), 0x010203);
        assert_eq!(cursor.offset(), 3);
    }

    #[test]
    fn width_outside_range_is_malformed() {
        let data = [0u8; 9];
        let mut cursor = Cursor::from_slice(&data);
        assert!(cursor.read_uint_be(0).unwrap_err().is_malformed());
        assert!(cursor.read_uint_be(9).unwrap_err().is_malformed());
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn truncation_propagates_without_moving() {
        let data = [0x12, 0x34];
        let mut cursor = Cursor::new(&data, 2, 4);
        let err = cursor.read_u32_be().unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 0,
                needed: 4,
                available: 2
            }
        );
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x1234);
    }

    #[test]
    fn sign_extend_handles_degenerate_widths() {
        assert_eq!(sign_extend(5, 0), 5);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
        assert_eq!(sint_from_be(&[]), 0);
    }
}
