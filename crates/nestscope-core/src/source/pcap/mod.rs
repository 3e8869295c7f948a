//! Capture files in legacy pcap or PCAPNG framing.
//!
//! - `reader`: magic detection, per-interface timestamps, record slicing
//! - `parser`: the block pump behind [`PcapFileSource`]
//!
//! Every event carries the captured bytes and the original wire length, so
//! snapshot truncation reaches the decoders as a short capture.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
