use std::net::{Ipv4Addr, Ipv6Addr};

use crate::wire::{Cursor, DecodeError};

pub(crate) fn read_ipv4(cursor: &mut Cursor<'_>) -> Result<Ipv4Addr, DecodeError> {
    Ok(Ipv4Addr::from(cursor.read_array::<4>()?))
}

pub(crate) fn read_ipv6(cursor: &mut Cursor<'_>) -> Result<Ipv6Addr, DecodeError> {
    Ok(Ipv6Addr::from(cursor.read_array::<16>()?))
}

/// Render bytes as text, escaping anything outside printable ASCII.
pub(crate) fn printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for byte in bytes {
        match byte {
            0x20..=0x7e => out.push(char::from(*byte)),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out
}

/// Name for `code` in a `(code, name)` table.
pub(crate) fn code_name(table: &[(u32, &'static str)], code: u32) -> &'static str {
    table
        .iter()
        .find(|(value, _)| *value == code)
        .map_or("Unknown", |(_, name)| name)
}

/// Comma-separated names of the bits set in `value`, or `none`.
pub(crate) fn flag_names(value: u32, table: &[(u32, &'static str)]) -> String {
    let names: Vec<&str> = table
        .iter()
        .filter(|(mask, _)| value & mask != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Prefix bytes of a `bits`-long prefix padded out to a full address.
pub(crate) fn read_prefix<const N: usize>(
    cursor: &mut Cursor<'_>,
    bits: u8,
) -> Result<[u8; N], DecodeError> {
    let len = usize::from(bits).div_ceil(8);
    if len > N {
        return Err(DecodeError::malformed(cursor.offset(), "prefix length too long"));
    }
    let mut out = [0u8; N];
    out[..len].copy_from_slice(cursor.take(len)?);
    Ok(out)
}
