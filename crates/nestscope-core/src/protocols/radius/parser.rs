use super::attribute::{ATTRIBUTES, walk_attributes};
use super::layout;
use super::reader::CODES;
use crate::context::DecodeContext;
use crate::protocols::common::reader::code_name;
use crate::sink::{Sink, hex_string, scoped};
use crate::wire::{Cursor, DecodeError};

/// Decode one RADIUS message at `cursor` and move past it.
///
/// The length field bounds the attribute list; bytes after it are left for
/// the next message of a pipelined stream.
pub fn decode_message(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let start = *cursor;
    let mut header = start;
    let code = header.read_u8()?;
    let identifier = header.read_u8()?;
    let length_offset = header.offset();
    let length = usize::from(header.read_u16_be()?);
    if !(layout::HEADER_LEN..=layout::MAX_LENGTH).contains(&length) {
        return Err(DecodeError::malformed(
            length_offset,
            "RADIUS length out of range",
        ));
    }
    if length > start.remaining_claimed() {
        return Err(DecodeError::malformed(
            length_offset,
            "RADIUS length exceeds message",
        ));
    }

    let mut message = start.sub_cursor(length)?;
    message.skip(header.offset() - start.offset())?;
    let label = format!(
        "RADIUS, {} ({code}), id 0x{identifier:02x}, length {length}",
        code_name(CODES, u32::from(code))
    );
    scoped(sink, &label, |sink| {
        let authenticator = message.take(layout::AUTHENTICATOR_LEN)?;
        sink.field("authenticator", &hex_string(authenticator));
        let count = walk_attributes(message, &ATTRIBUTES, ctx, sink)?;
        log::trace!("RADIUS message with {count} attributes");
        Ok::<(), DecodeError>(())
    })?;
    *cursor = start.advance(length)?;
    Ok(())
}
