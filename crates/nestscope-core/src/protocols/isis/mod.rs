//! IS-IS (ISO 10589) PDU decoding.
//!
//! The common header selects a PDU type whose fixed header carries the PDU
//! length. That length bounds a TLV walk; several TLVs open their own
//! sub-TLV namespaces, and the router capability TLV nests a third level
//! (SR capability ranges carrying SID/Label sub-TLVs).
//!
//! LSP checksums are folded over the record stream as it is consumed, so a
//! corrupt TLV body does not stop the checksum from being checked. Hostnames
//! learned from TLV 137 go into the caller's `DecodeContext`.

pub mod layout;
pub mod parser;
pub mod reader;
mod subtlv;
mod tlv;

pub use parser::decode_pdu;
