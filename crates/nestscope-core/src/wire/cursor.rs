use super::error::DecodeError;

/// Read-only view over a captured buffer with two boundaries.
///
/// `claimed_end` is where the enclosing structure says the data ends;
/// `captured_end` is where the captured bytes actually stop. The captured
/// boundary never lies beyond the claimed one, and `offset` never moves past
/// the claimed one. `offset` may move past the captured boundary: that is
/// how a record whose body was cut by the snapshot length is skipped.
///
/// Offsets are absolute positions in the top-level buffer, so errors raised
/// at any nesting depth point at the same byte a hex dump of the frame shows.
///
/// # Examples
/// ```
/// use nestscope_core::wire::Cursor;
///
/// let frame = [0x01, 0x02, 0x03];
/// // The protocol claims 8 bytes but only 3 were captured.
/// let cursor = Cursor::new(&frame, frame.len(), 8);
/// assert_eq!(cursor.remaining_claimed(), 8);
/// assert_eq!(cursor.remaining_captured(), 3);
/// assert!(cursor.peek(4).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    origin: &'a [u8],
    offset: usize,
    claimed_end: usize,
    captured_end: usize,
}

impl<'a> Cursor<'a> {
    /// Build the top-level cursor for one message.
    ///
    /// The captured boundary is re-derived as the minimum of what the caller
    /// says was captured, what the message claims, and what the buffer holds.
    pub fn new(buffer: &'a [u8], captured_len: usize, claimed_len: usize) -> Self {
        let captured_end = captured_len.min(claimed_len).min(buffer.len());
        Self {
            origin: buffer,
            offset: 0,
            claimed_end: claimed_len,
            captured_end,
        }
    }

    /// Cursor over a fully captured buffer.
    pub fn from_slice(buffer: &'a [u8]) -> Self {
        Self::new(buffer, buffer.len(), buffer.len())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn claimed_end(&self) -> usize {
        self.claimed_end
    }

    pub fn captured_end(&self) -> usize {
        self.captured_end
    }

    pub fn remaining_captured(&self) -> usize {
        self.captured_end.saturating_sub(self.offset)
    }

    pub fn remaining_claimed(&self) -> usize {
        self.claimed_end.saturating_sub(self.offset)
    }

    /// True once every claimed byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining_claimed() == 0
    }

    /// True when the snapshot cut this envelope short.
    pub fn is_truncated(&self) -> bool {
        self.captured_end < self.claimed_end
    }

    /// Borrow the next `width` captured bytes without moving.
    ///
    /// Fails with `Truncated` iff the bytes were not captured. The claimed
    /// boundary is deliberately not consulted here.
    pub fn peek(&self, width: usize) -> Result<&'a [u8], DecodeError> {
        let truncated = DecodeError::Truncated {
            offset: self.offset,
            needed: width,
            available: self.remaining_captured(),
        };
        let end = match self.offset.checked_add(width) {
            Some(end) if end <= self.captured_end => end,
            _ => return Err(truncated),
        };
        self.origin.get(self.offset..end).ok_or(truncated)
    }

    /// New cursor moved forward by `width` bytes.
    ///
    /// Moving past the claimed boundary is a broken envelope and is reported
    /// as `Malformed`; moving past the captured boundary is allowed.
    pub fn advance(&self, width: usize) -> Result<Self, DecodeError> {
        match self.offset.checked_add(width) {
            Some(end) if end <= self.claimed_end => Ok(Self {
                offset: end,
                ..*self
            }),
            _ => Err(DecodeError::malformed(
                self.offset,
                "advance past end of envelope",
            )),
        }
    }

    pub fn skip(&mut self, width: usize) -> Result<(), DecodeError> {
        *self = self.advance(width)?;
        Ok(())
    }

    /// Consume and return the next `width` captured bytes.
    pub fn take(&mut self, width: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self.peek(width)?;
        self.skip(width)?;
        Ok(bytes)
    }

    /// Consume every remaining claimed byte; `Truncated` if they were not all
    /// captured.
    pub fn take_rest(&mut self) -> Result<&'a [u8], DecodeError> {
        self.take(self.remaining_claimed())
    }

    /// Narrowed cursor over the next `length` bytes.
    ///
    /// A nested structure may never claim more than its container: a length
    /// reaching past this cursor's claimed boundary is `Malformed` and no
    /// byte of the child is ever read.
    pub fn sub_cursor(&self, length: usize) -> Result<Self, DecodeError> {
        let claimed_end = match self.offset.checked_add(length) {
            Some(end) if end <= self.claimed_end => end,
            _ => {
                return Err(DecodeError::malformed(
                    self.offset,
                    "nested length exceeds envelope",
                ));
            }
        };
        Ok(Self {
            origin: self.origin,
            offset: self.offset,
            claimed_end,
            captured_end: self.captured_end.min(claimed_end),
        })
    }

    /// Split off a sub-cursor of `length` bytes and move past it.
    pub fn take_cursor(&mut self, length: usize) -> Result<Self, DecodeError> {
        let nested = self.sub_cursor(length)?;
        self.skip(length)?;
        Ok(nested)
    }

    /// Whatever captured bytes remain, possibly fewer than claimed.
    pub fn captured_rest(&self) -> &'a [u8] {
        self.origin
            .get(self.offset..self.captured_end)
            .unwrap_or(&[])
    }

    /// Fail with `Malformed` unless exactly `length` claimed bytes remain.
    pub fn expect_len(&self, length: usize, reason: &'static str) -> Result<(), DecodeError> {
        if self.remaining_claimed() == length {
            Ok(())
        } else {
            Err(DecodeError::malformed(self.offset, reason))
        }
    }

    /// Number of `size`-byte entries in the remaining claimed bytes, or
    /// `Malformed` when they do not divide evenly.
    pub fn entry_count(&self, size: usize, reason: &'static str) -> Result<usize, DecodeError> {
        let remaining = self.remaining_claimed();
        if size == 0 || remaining % size != 0 {
            return Err(DecodeError::malformed(self.offset, reason));
        }
        Ok(remaining / size)
    }
}
