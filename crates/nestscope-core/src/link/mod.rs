//! Link-layer demultiplexing: which decoder gets which bytes of a frame.
//!
//! - `layout`: linktypes, LLC and header sizes
//! - `reader`: UDP payload access
//! - `parser`: the demultiplexer itself (Ethernet, raw IP, 802.15.4)

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::LinkError;
pub use parser::{LinkPayload, demux};
