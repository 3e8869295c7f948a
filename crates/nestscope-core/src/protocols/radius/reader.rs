use super::layout;
use crate::protocols::common::reader::printable;
use crate::sink::Sink;
use crate::wire::{Cursor, DecodeError, Endian, Tlv};

/// Attributes and vendor sub-attributes: one-byte type, one-byte length
/// that counts the two header bytes.
pub const ATTRIBUTE: Tlv = Tlv::new(1, 1, Endian::Big).including_header();

pub(super) const CODES: &[(u32, &str)] = &[
    (layout::CODE_ACCESS_REQUEST as u32, "Access-Request"),
    (layout::CODE_ACCESS_ACCEPT as u32, "Access-Accept"),
    (layout::CODE_ACCESS_REJECT as u32, "Access-Reject"),
    (layout::CODE_ACCOUNTING_REQUEST as u32, "Accounting-Request"),
    (layout::CODE_ACCOUNTING_RESPONSE as u32, "Accounting-Response"),
    (layout::CODE_ACCESS_CHALLENGE as u32, "Access-Challenge"),
    (layout::CODE_STATUS_SERVER as u32, "Status-Server"),
    (layout::CODE_STATUS_CLIENT as u32, "Status-Client"),
    (layout::CODE_DISCONNECT_REQUEST as u32, "Disconnect-Request"),
    (layout::CODE_DISCONNECT_ACK as u32, "Disconnect-ACK"),
    (layout::CODE_DISCONNECT_NAK as u32, "Disconnect-NAK"),
    (layout::CODE_COA_REQUEST as u32, "CoA-Request"),
    (layout::CODE_COA_ACK as u32, "CoA-ACK"),
    (layout::CODE_COA_NAK as u32, "CoA-NAK"),
];

/// Whether `port` is one of the well-known RADIUS UDP ports.
pub fn is_radius_port(port: u16) -> bool {
    matches!(
        port,
        layout::AUTH_PORT
            | layout::ACCT_PORT
            | layout::DYNAUTH_PORT
            | layout::LEGACY_AUTH_PORT
            | layout::LEGACY_ACCT_PORT
    )
}

/// The rest of an attribute as text.
pub(super) fn text(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let bytes = body.take_rest()?;
    sink.field("value", &printable(bytes));
    Ok(())
}

/// A four-byte integer attribute.
pub(super) fn integer(body: &mut Cursor<'_>) -> Result<u32, DecodeError> {
    body.expect_len(4, "integer attribute length is not 4")?;
    body.read_u32_be()
}
