//! Type-code dispatch for record bodies.
//!
//! A table maps each known type code to a name and, where the body format is
//! implemented, a decoder. Unknown codes and codes without a decoder share
//! one path: the body is dumped opaquely and skipped by its length, so new
//! wire values never stop a walk.

use super::cursor::Cursor;
use super::error::DecodeError;
use super::records::Record;
use crate::sink::{Marker, Sink, scoped};

/// Decoder for one record body. `C` is the caller-owned decode context.
pub type DecoderFn<C> = fn(&mut Cursor<'_>, &mut C, &mut dyn Sink) -> Result<(), DecodeError>;

pub struct Entry<C: 'static> {
    pub code: u32,
    pub name: &'static str,
    pub decode: Option<DecoderFn<C>>,
}

impl<C: 'static> Entry<C> {
    pub const fn decoded(code: u32, name: &'static str, decode: DecoderFn<C>) -> Self {
        Self {
            code,
            name,
            decode: Some(decode),
        }
    }

    /// Known type rendered opaquely.
    pub const fn named(code: u32, name: &'static str) -> Self {
        Self {
            code,
            name,
            decode: None,
        }
    }
}

/// Static table of entries, sorted by code.
pub struct DispatchTable<C: 'static> {
    namespace: &'static str,
    entries: &'static [Entry<C>],
}

impl<C: 'static> DispatchTable<C> {
    pub const fn new(namespace: &'static str, entries: &'static [Entry<C>]) -> Self {
        Self { namespace, entries }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn lookup(&self, code: u32) -> Option<&'static Entry<C>> {
        let entries: &'static [Entry<C>] = self.entries;
        entries
            .binary_search_by_key(&code, |entry| entry.code)
            .ok()
            .and_then(|idx| entries.get(idx))
    }

    pub fn name_of(&self, code: u32) -> &'static str {
        self.lookup(code).map_or("Unknown", |entry| entry.name)
    }

    /// True when a body decoder exists for `code`.
    pub fn is_handled(&self, code: u32) -> bool {
        self.lookup(code).is_some_and(|entry| entry.decode.is_some())
    }

    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|pair| match pair {
            [a, b] => a.code < b.code,
            _ => true,
        })
    }

    /// Decode one record inside its own scope.
    ///
    /// A `Malformed` body is marked corrupt and the record is skipped by its
    /// length (which the iterator already validated), so siblings still
    /// decode. `Truncated` propagates: nothing after it was captured.
    pub fn dispatch(
        &self,
        record: Record<'_>,
        ctx: &mut C,
        sink: &mut dyn Sink,
    ) -> Result<(), DecodeError> {
        let entry = self.lookup(record.type_code);
        let name = entry.map_or("Unknown", |entry| entry.name);
        let label = format!(
            "{name} ({}), length {}",
            record.type_code, record.declared_length
        );
        log::trace!(
            "{} record {} at offset {}",
            self.namespace,
            record.type_code,
            record.offset
        );
        scoped(sink, &label, |sink| {
            let mut body = record.body;
            let result = match entry.and_then(|entry| entry.decode) {
                Some(decode) => {
                    decode(&mut body, ctx, sink).and_then(|()| dump_leftover(&mut body, sink))
                }
                None => opaque(&mut body, sink),
            };
            match result {
                Err(DecodeError::Malformed { offset, reason }) => {
                    log::debug!(
                        "{} record {} corrupt at offset {offset}: {reason}",
                        self.namespace,
                        record.type_code
                    );
                    sink.marker(Marker::Corrupt(reason));
                    Ok(())
                }
                other => other,
            }
        })
    }
}

/// Dump the rest of `body` as opaque bytes and consume it.
///
/// Whatever was captured is printed first; `Truncated` follows if the body
/// was cut short.
pub fn opaque(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let captured = body.captured_rest();
    if !captured.is_empty() {
        sink.hex(captured);
    }
    body.take_rest().map(|_| ())
}

fn dump_leftover(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let leftover = body.remaining_claimed();
    if leftover == 0 {
        return Ok(());
    }
    sink.marker(Marker::Trailing(leftover));
    opaque(body, sink)
}

#[cfg(test)]
mod tests {
    use super::{DispatchTable, Entry, opaque};
    use crate::sink::{Sink, TextSink};
    use crate::wire::{Cursor, DecodeError, Records, TLV8};

    fn two_bytes(
        body: &mut Cursor<'_>,
        seen: &mut Vec<u16>,
        sink: &mut dyn Sink,
    ) -> Result<(), DecodeError> {
        let value = body.read_u16_be()?;
        seen.push(value);
        sink.field("value", &value);
        Ok(())
    }

    fn always_corrupt(
        body: &mut Cursor<'_>,
        _seen: &mut Vec<u16>,
        _sink: &mut dyn Sink,
    ) -> Result<(), DecodeError> {
        Err(DecodeError::malformed(body.offset(), "bad body"))
    }

    static TABLE: DispatchTable<Vec<u16>> = DispatchTable::new(
        "test",
        &[
            Entry::decoded(1, "Two", two_bytes),
            Entry::named(2, "Named"),
            Entry::decoded(3, "Corrupt", always_corrupt),
        ],
    );

    fn run(data: &[u8]) -> (Result<(), DecodeError>, Vec<u16>, String) {
        let mut seen = Vec::new();
        let mut sink = TextSink::new();
        let mut result = Ok(());
        for record in Records::new(Cursor::from_slice(data), TLV8) {
            result = record.and_then(|record| TABLE.dispatch(record, &mut seen, &mut sink));
            if result.is_err() {
                break;
            }
        }
        (result, seen, sink.into_string())
    }

    #[test]
    fn table_is_sorted_and_answers_lookups() {
        assert!(TABLE.is_sorted());
        assert_eq!(TABLE.name_of(1), "Two");
        assert_eq!(TABLE.name_of(9), "Unknown");
        assert!(TABLE.is_handled(1));
        assert!(!TABLE.is_handled(2));
        assert!(!TABLE.is_handled(9));
    }

    #[test]
    fn unknown_type_is_dumped_and_skipped() {
        let (result, seen, text) = run(&[9, 4, 0xde, 0xad, 0xbe, 0xef, 1, 2, 0x01, 0x02]);
        assert!(result.is_ok());
        assert_eq!(seen, vec![0x0102]);
        assert!(text.contains("Unknown (9), length 4"));
        assert!(text.contains("0x0000:  dead beef"));
    }

    #[test]
    fn corrupt_body_does_not_stop_siblings() {
        let (result, seen, text) = run(&[3, 1, 0, 1, 2, 0, 7]);
        assert!(result.is_ok());
        assert_eq!(seen, vec![7]);
        assert!(text.contains("[corrupt: bad body]"));
    }

    #[test]
    fn unread_body_bytes_are_reported() {
        let (result, _, text) = run(&[1, 3, 0, 1, 0xff]);
        assert!(result.is_ok());
        assert!(text.contains("[1 trailing bytes]"));
        assert!(text.contains("0x0000:  ff"));
    }

    #[test]
    fn truncated_body_propagates_after_partial_dump() {
        let data = [2, 4, 0xaa, 0xbb];
        let mut sink = TextSink::new();
        let mut body = Cursor::new(&data, 4, 6).advance(2).unwrap();
        let err = opaque(&mut body, &mut sink).unwrap_err();
        assert!(err.is_truncated());
        assert!(sink.as_str().contains("aabb"));
    }
}
