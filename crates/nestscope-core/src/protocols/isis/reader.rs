use std::fmt::{self, Write as _};

use super::layout;
use crate::context::{HostnameTable, SystemIdBytes};
use crate::wire::{Cursor, DecodeError};

/// Six-byte system identifier, printed as three dotted hex groups.
///
/// # Examples
/// ```
/// use nestscope_core::HostnameTable;
/// use nestscope_core::protocols::isis::reader::SystemId;
///
/// let id = SystemId([0x19, 0x21, 0x68, 0x00, 0x10, 0x01]);
/// assert_eq!(id.to_string(), "1921.6800.1001");
///
/// let mut hostnames = HostnameTable::new();
/// assert_eq!(id.name(&hostnames), "1921.6800.1001");
/// hostnames.learn(id.0, "core-1");
/// assert_eq!(id.name(&hostnames), "core-1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub SystemIdBytes);

impl SystemId {
    /// Learned hostname when one is known, the dotted form otherwise.
    pub fn name(&self, hostnames: &HostnameTable) -> String {
        hostnames
            .lookup(&self.0)
            .map_or_else(|| self.to_string(), str::to_string)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}{b:02x}.{c:02x}{d:02x}.{e:02x}{g:02x}")
    }
}

/// System id plus pseudonode id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId {
    pub system: SystemId,
    pub pseudonode: u8,
}

impl NodeId {
    pub fn name(&self, hostnames: &HostnameTable) -> String {
        format!("{}.{:02x}", self.system.name(hostnames), self.pseudonode)
    }
}

/// Node id plus LSP fragment number.
///
/// # Examples
/// ```
/// use nestscope_core::HostnameTable;
/// use nestscope_core::protocols::isis::reader::read_lsp_id;
/// use nestscope_core::wire::Cursor;
///
/// let bytes = [0x19, 0x21, 0x68, 0x00, 0x10, 0x01, 0x00, 0x03];
/// let mut cursor = Cursor::new(&bytes, bytes.len(), bytes.len());
/// let lsp = read_lsp_id(&mut cursor).unwrap();
/// assert_eq!(lsp.name(&HostnameTable::new()), "1921.6800.1001.00-03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspId {
    pub node: NodeId,
    pub fragment: u8,
}

impl LspId {
    pub fn name(&self, hostnames: &HostnameTable) -> String {
        format!("{}-{:02x}", self.node.name(hostnames), self.fragment)
    }
}

pub fn read_system_id(cursor: &mut Cursor<'_>) -> Result<SystemId, DecodeError> {
    Ok(SystemId(cursor.read_array::<{ layout::SYSTEM_ID_LEN }>()?))
}

pub fn read_node_id(cursor: &mut Cursor<'_>) -> Result<NodeId, DecodeError> {
    let system = read_system_id(cursor)?;
    let pseudonode = cursor.read_u8()?;
    Ok(NodeId { system, pseudonode })
}

pub fn read_lsp_id(cursor: &mut Cursor<'_>) -> Result<LspId, DecodeError> {
    let node = read_node_id(cursor)?;
    let fragment = cursor.read_u8()?;
    Ok(LspId { node, fragment })
}

/// Area address in the usual `49.0001.0002` grouping.
pub fn format_area(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    let Some((first, rest)) = bytes.split_first() else {
        return out;
    };
    let _ = write!(out, "{first:02x}");
    for chunk in rest.chunks(2) {
        out.push('.');
        for byte in chunk {
            let _ = write!(out, "{byte:02x}");
        }
    }
    out
}

/// Old-style 6-bit metric with its "unsupported" bit.
pub fn format_metric(byte: u8) -> String {
    if byte & layout::METRIC_UNSUPPORTED != 0 {
        "unsupported".to_string()
    } else {
        (byte & layout::METRIC_VALUE_MASK).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{SystemId, format_area, format_metric, read_lsp_id};
    use crate::context::HostnameTable;
    use crate::wire::Cursor;

    #[test]
    fn ids_render_dotted() {
        let data = [0x19, 0x21, 0x68, 0x00, 0x10, 0x01, 0x02, 0x0a];
        let mut cursor = Cursor::from_slice(&data);
        let lsp = read_lsp_id(&mut cursor).unwrap();
        let hostnames = HostnameTable::new();
        assert_eq!(lsp.name(&hostnames), "1921.6800.1001.02-0a");
        assert_eq!(cursor.offset(), 8);
    }

    #[test]
    fn learned_hostname_replaces_system_id() {
        let id = SystemId([0x19, 0x21, 0x68, 0x00, 0x10, 0x01]);
        let mut hostnames = HostnameTable::new();
        hostnames.learn(id.0, "core-1");
        assert_eq!(id.name(&hostnames), "core-1");
        assert_eq!(id.to_string(), "1921.6800.1001");
    }

    #[test]
    fn area_groups_pairs_after_afi() {
        assert_eq!(format_area(&[0x49, 0x00, 0x01]), "49.0001");
        assert_eq!(format_area(&[0x49, 0x00, 0x01, 0x02]), "49.0001.02");
        assert_eq!(format_area(&[]), "");
    }

    #[test]
    fn metric_honours_unsupported_bit() {
        assert_eq!(format_metric(0x0a), "10");
        assert_eq!(format_metric(0x8a), "unsupported");
        assert_eq!(format_metric(0x4a), "10");
    }
}
