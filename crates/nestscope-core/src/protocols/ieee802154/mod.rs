//! IEEE 802.15.4 MAC frames, including 2015-revision Information Elements.
//!
//! - `layout`: frame control bits, IE ids and other wire constants
//! - `reader`: frame control, addressing and security header helpers
//! - `parser`: frame decoding and the FCS check

pub mod ie;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::decode_frame;
