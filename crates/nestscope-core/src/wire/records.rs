//! Sequences of self-describing records inside a declared envelope.
//!
//! Every protocol family walks its TLVs, attributes or information elements
//! through [`Records`]. The iterator owns the containment checks: a record
//! header must be captured, and a record body may never reach past the
//! envelope holding it. Each step consumes at least one header, so a walk
//! over `N` claimed bytes finishes in at most `N` steps whatever the wire
//! says.

use super::checksum::ByteFold;
use super::cursor::Cursor;
use super::error::DecodeError;
use super::extract::{Endian, uint_from_be, uint_from_le};
use crate::sink::{Marker, Sink};

/// Type code and body length read from a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHead {
    pub type_code: u32,
    /// Body length, header excluded.
    pub declared_length: usize,
}

/// Shape of a record header.
pub trait RecordFormat {
    /// Header size in bytes; always at least one.
    fn header_len(&self) -> usize;

    /// Decode a header of exactly `header_len()` bytes. A header that cannot
    /// describe a valid record returns the reason it is malformed.
    fn decode_header(&self, header: &[u8]) -> Result<RecordHead, &'static str>;
}

/// Whether a length field counts the record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    BodyOnly,
    IncludesHeader,
}

/// Plain type-then-length header with fixed field widths.
///
/// # Examples
/// ```
/// use nestscope_core::wire::{RecordFormat, TLV8};
///
/// let head = TLV8.decode_header(&[22, 11]).unwrap();
/// assert_eq!(head.type_code, 22);
/// assert_eq!(head.declared_length, 11);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv {
    pub type_width: usize,
    pub length_width: usize,
    pub endian: Endian,
    pub length_mode: LengthMode,
}

impl Tlv {
    pub const fn new(type_width: usize, length_width: usize, endian: Endian) -> Self {
        Self {
            type_width,
            length_width,
            endian,
            length_mode: LengthMode::BodyOnly,
        }
    }

    /// Same header, but the length field counts the header too.
    pub const fn including_header(self) -> Self {
        Self {
            length_mode: LengthMode::IncludesHeader,
            ..self
        }
    }

    fn field(&self, bytes: &[u8]) -> u64 {
        match self.endian {
            Endian::Big => uint_from_be(bytes),
            Endian::Little => uint_from_le(bytes),
        }
    }
}

/// One-byte type, one-byte body length.
pub const TLV8: Tlv = Tlv::new(1, 1, Endian::Big);

impl RecordFormat for Tlv {
    fn header_len(&self) -> usize {
        self.type_width + self.length_width
    }

    fn decode_header(&self, header: &[u8]) -> Result<RecordHead, &'static str> {
        let (type_bytes, length_bytes) = header
            .split_at_checked(self.type_width)
            .ok_or("record header shorter than its type field")?;
        let type_code = self.field(type_bytes) as u32;
        let length = self.field(length_bytes) as usize;
        let declared_length = match self.length_mode {
            LengthMode::BodyOnly => length,
            LengthMode::IncludesHeader => length
                .checked_sub(self.header_len())
                .ok_or("record length shorter than its header")?,
        };
        Ok(RecordHead {
            type_code,
            declared_length,
        })
    }
}

/// A record visited by the iterator; `body` is bounded to the record.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub type_code: u32,
    pub declared_length: usize,
    /// Absolute offset of the record header.
    pub offset: usize,
    pub body: Cursor<'a>,
}

/// Read one record at `cursor` and move past it.
///
/// The header must be captured (`Truncated` otherwise) and the body must fit
/// in what remains of `cursor`'s envelope (`Malformed` otherwise). The body
/// itself need not be captured.
pub fn read_record<'a, F: RecordFormat + ?Sized>(
    cursor: &mut Cursor<'a>,
    format: &F,
    tap: Option<&mut (dyn ByteFold + '_)>,
) -> Result<Record<'a>, DecodeError> {
    let offset = cursor.offset();
    let header_len = format.header_len();
    if header_len == 0 {
        return Err(DecodeError::malformed(offset, "record header has no size"));
    }
    let header = cursor.peek(header_len)?;
    let mut tap = tap;
    if let Some(tap) = tap.as_deref_mut() {
        tap.update(header);
    }
    let head = format
        .decode_header(header)
        .map_err(|reason| DecodeError::malformed(offset, reason))?;
    let after_header = cursor.advance(header_len)?;
    if head.declared_length > after_header.remaining_claimed() {
        return Err(DecodeError::malformed(
            offset,
            "record length exceeds envelope",
        ));
    }
    let body = after_header.sub_cursor(head.declared_length)?;
    if let Some(tap) = tap {
        tap.update(body.captured_rest());
    }
    *cursor = after_header.advance(head.declared_length)?;
    Ok(Record {
        type_code: head.type_code,
        declared_length: head.declared_length,
        offset,
        body,
    })
}

/// How a walk over an envelope ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Every claimed byte was consumed by records.
    Done,
    /// Fewer bytes than a header remained after the last record.
    TrailingBytes(usize),
    /// A visitor asked to stop (a list terminator); the rest is unconsumed.
    Stopped,
}

/// Lazy, single-pass iterator over the records of one envelope.
///
/// Yields `Err` at most once and then stays exhausted.
pub struct Records<'a, 't, F> {
    envelope: Cursor<'a>,
    format: F,
    bound: usize,
    consumed: usize,
    end: Option<WalkEnd>,
    failed: bool,
    tap: Option<&'t mut dyn ByteFold>,
}

impl<'a, 't, F: RecordFormat> Records<'a, 't, F> {
    pub fn new(envelope: Cursor<'a>, format: F) -> Self {
        Self {
            bound: envelope.remaining_claimed(),
            envelope,
            format,
            consumed: 0,
            end: None,
            failed: false,
            tap: None,
        }
    }

    /// Feed every header and captured body byte to `tap` as it is consumed.
    pub fn with_tap(mut self, tap: &'t mut dyn ByteFold) -> Self {
        self.tap = Some(tap);
        self
    }

    /// The part of the envelope not yet consumed.
    pub fn remaining(&self) -> Cursor<'a> {
        self.envelope
    }

    /// Bytes consumed so far, headers included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn end(&self) -> Option<WalkEnd> {
        self.end
    }

    fn stop(&mut self) {
        self.end = Some(WalkEnd::Stopped);
    }

    fn step(&mut self) -> Result<Option<Record<'a>>, DecodeError> {
        let remaining = self.envelope.remaining_claimed();
        if remaining == 0 {
            self.end = Some(WalkEnd::Done);
            return Ok(None);
        }
        if remaining < self.format.header_len() {
            self.end = Some(WalkEnd::TrailingBytes(remaining));
            return Ok(None);
        }
        let mut next = self.envelope;
        let tap = self.tap.as_deref_mut();
        let record = read_record(&mut next, &self.format, tap)?;
        let step = next.offset() - self.envelope.offset();
        if step == 0 || next.remaining_claimed() >= remaining || self.consumed + step > self.bound {
            return Err(DecodeError::malformed(
                record.offset,
                "record walk did not progress",
            ));
        }
        self.consumed += step;
        self.envelope = next;
        Ok(Some(record))
    }
}

impl<'a, F: RecordFormat> Iterator for Records<'a, '_, F> {
    type Item = Result<Record<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.end.is_some() {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Whether a walk continues past the record just visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub records: usize,
    pub end: WalkEnd,
}

/// Visit every record of `records` in wire order.
///
/// Errors from the iterator or the visitor end the walk and propagate: a
/// broken length leaves no safe place to resume inside this envelope.
/// Leftover bytes too short for a header are reported with a trailing
/// marker.
pub fn walk<'a, F, V>(
    records: Records<'a, '_, F>,
    sink: &mut dyn Sink,
    mut visit: V,
) -> Result<WalkSummary, DecodeError>
where
    F: RecordFormat,
    V: FnMut(Record<'a>, &mut dyn Sink) -> Result<(), DecodeError>,
{
    let mut records = records;
    walk_until(&mut records, sink, |record, sink| {
        visit(record, sink).map(|()| Flow::Continue)
    })
}

/// Like [`walk`], but the visitor may stop early; the unconsumed rest of
/// the envelope is then available from `records.remaining()`.
pub fn walk_until<'a, F, V>(
    records: &mut Records<'a, '_, F>,
    sink: &mut dyn Sink,
    mut visit: V,
) -> Result<WalkSummary, DecodeError>
where
    F: RecordFormat,
    V: FnMut(Record<'a>, &mut dyn Sink) -> Result<Flow, DecodeError>,
{
    let mut count = 0;
    while let Some(record) = records.next() {
        let record = record?;
        count += 1;
        if visit(record, sink)? == Flow::Stop {
            records.stop();
            break;
        }
    }
    let end = records.end().unwrap_or(WalkEnd::Done);
    if let WalkEnd::TrailingBytes(bytes) = end {
        sink.marker(Marker::Trailing(bytes));
    }
    Ok(WalkSummary {
        records: count,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::{Flow, LengthMode, RecordFormat, Records, TLV8, Tlv, WalkEnd, walk, walk_until};
    use crate::sink::TextSink;
    use crate::wire::{ByteFold, Crc16Kermit, Cursor, DecodeError, Endian};

    #[test]
    fn iterates_records_in_wire_order() {
        let data = [1, 2, 0xaa, 0xbb, 2, 0, 3, 1, 0xcc];
        let records: Vec<_> = Records::new(Cursor::from_slice(&data), TLV8)
            .map(|r| r.unwrap())
            .collect();
        let codes: Vec<u32> = records.iter().map(|r| r.type_code).collect();
        assert_eq!(codes, vec![1, 2, 3]);
        assert_eq!(records[0].body.captured_rest(), &[0xaa, 0xbb]);
        assert!(records[1].body.is_empty());
        assert_eq!(records[2].offset, 6);
    }

    #[test]
    fn zero_length_records_still_progress() {
        let data = [0u8; 64];
        let mut records = Records::new(Cursor::from_slice(&data), TLV8);
        let count = records.by_ref().filter(|r| r.is_ok()).count();
        assert_eq!(count, 32);
        assert_eq!(records.end(), Some(WalkEnd::Done));
    }

    #[test]
    fn body_past_envelope_is_malformed() {
        let data = [1, 5, 0, 0];
        let mut records = Records::new(Cursor::from_slice(&data), TLV8);
        let err = records.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            DecodeError::Malformed {
                offset: 0,
                reason: "record length exceeds envelope"
            }
        );
        assert!(records.next().is_none());
    }

    #[test]
    fn missing_header_bytes_are_truncated() {
        let data = [1, 0, 7];
        let mut records = Records::new(Cursor::new(&data, 3, 6), TLV8);
        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn short_tail_is_trailing_bytes() {
        let data = [1, 0, 9];
        let mut sink = TextSink::new();
        let summary = walk(Records::new(Cursor::from_slice(&data), TLV8), &mut sink, |_, _| Ok(())).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.end, WalkEnd::TrailingBytes(1));
        assert!(sink.as_str().contains("[1 trailing bytes]"));
    }

    #[test]
    fn length_including_header_rejects_short_lengths() {
        let format = Tlv::new(1, 1, Endian::Big).including_header();
        assert_eq!(format.length_mode, LengthMode::IncludesHeader);
        assert_eq!(format.decode_header(&[4, 6]).unwrap().declared_length, 4);
        assert!(format.decode_header(&[4, 1]).is_err());

        let data = [4, 0, 4, 0];
        let mut records = Records::new(Cursor::from_slice(&data), format);
        assert!(records.next().unwrap().unwrap_err().is_malformed());
    }

    #[test]
    fn little_endian_wide_headers() {
        let format = Tlv::new(2, 2, Endian::Little);
        let data = [0x34, 0x12, 0x01, 0x00, 0xff];
        let record = Records::new(Cursor::from_slice(&data), format)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record.type_code, 0x1234);
        assert_eq!(record.declared_length, 1);
    }

    #[test]
    fn walk_until_leaves_rest_unconsumed() {
        let data = [1, 0, 0x7f, 0, 0xde, 0xad];
        let mut sink = TextSink::new();
        let mut records = Records::new(Cursor::from_slice(&data), TLV8);
        let summary = walk_until(&mut records, &mut sink, |record, _| {
            Ok(if record.type_code == 0x7f { Flow::Stop } else { Flow::Continue })
        })
        .unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.end, WalkEnd::Stopped);
        assert_eq!(records.remaining().captured_rest(), &[0xde, 0xad]);
    }

    #[test]
    fn tap_sees_bytes_up_to_the_failure() {
        let data = [1, 2, 0xaa, 0xbb, 2, 9, 0xcc];
        let mut crc = Crc16Kermit::new();
        let mut records = Records::new(Cursor::from_slice(&data), TLV8).with_tap(&mut crc);
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_err());
        drop(records);
        let mut reference = Crc16Kermit::new();
        reference.update(&data[..6]);
        assert_eq!(crc.value(), reference.value());
    }
}
