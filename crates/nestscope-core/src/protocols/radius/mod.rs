//! RADIUS authentication, accounting and dynamic authorization messages.
//!
//! - `layout`: header sizes, codes, attribute types and ports
//! - `reader`: attribute record format and value helpers
//! - `attribute`: attribute and vendor sub-attribute dispatch tables
//! - `parser`: message decoding

mod attribute;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::decode_message;
pub use reader::is_radius_port;
