//! Bounded-read core shared by every decoder.
//!
//! - `cursor`: captured/claimed boundaries; the only way to touch bytes
//! - `extract`: width- and endianness-generic integers over a cursor
//! - `records`: TLV-shaped record walks with envelope containment
//! - `dispatch`: type-code tables with an opaque fallback
//! - `checksum`: byte folds fed alongside a walk
//! - `error`: the two terminal failures
//!
//! Protocol modules never index buffers directly; they go through this
//! module so a lying length field can only ever produce an error.

mod checksum;
mod cursor;
mod dispatch;
mod error;
mod extract;
mod records;

pub use checksum::{ByteFold, Crc16Kermit, Fletcher};
pub use cursor::Cursor;
pub use dispatch::{DecoderFn, DispatchTable, Entry, opaque};
pub use error::DecodeError;
pub use extract::{
    Endian, MAX_WIDTH, sign_extend, sint_from_be, sint_from_le, uint_from_be, uint_from_le,
};
pub use records::{
    Flow, LengthMode, Record, RecordFormat, RecordHead, Records, TLV8, Tlv, WalkEnd, WalkSummary,
    read_record, walk, walk_until,
};
