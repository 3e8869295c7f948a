//! Protocol decoders.
//!
//! Each protocol follows a layered structure:
//! - `layout`: wire constants, field masks and type codes
//! - `reader`: protocol conventions over the core cursor (ids, addresses,
//!   record formats)
//! - `parser`: message decoding and the dispatch tables it walks
//!
//! Decoders never index bytes directly and share one error type,
//! [`crate::wire::DecodeError`]. They contain no I/O; the capture source and
//! the analysis layer handle files and packet framing.

pub(crate) mod common;
pub mod ieee802154;
pub mod isis;
pub mod radius;
