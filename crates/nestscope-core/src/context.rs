//! Caller-owned state threaded through every decode call.
//!
//! Nothing here is global: a caller decoding several captures in parallel
//! gives each one its own [`DecodeContext`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Decoder behaviour switches.
///
/// # Examples
/// ```
/// use nestscope_core::DecodeOptions;
///
/// let options: DecodeOptions = serde_json::from_str(r#"{"hex_dump_limit": 64}"#).unwrap();
/// assert!(options.verify_checksums);
/// assert_eq!(options.hex_dump_limit, Some(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Verify IS-IS LSP checksums and 802.15.4 frame check sequences.
    pub verify_checksums: bool,
    /// Cap on the bytes shown per opaque dump; `None` shows everything.
    pub hex_dump_limit: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            hex_dump_limit: None,
        }
    }
}

/// Six-byte IS-IS system identifier.
pub type SystemIdBytes = [u8; 6];

/// Hostnames learned from IS-IS dynamic hostname TLVs, keyed by system id.
///
/// Entries persist across packets so later PDUs print names instead of raw
/// identifiers.
#[derive(Debug, Default, Clone)]
pub struct HostnameTable {
    names: HashMap<SystemIdBytes, String>,
}

impl HostnameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` for `system_id`, replacing any earlier name.
    pub fn learn(&mut self, system_id: SystemIdBytes, name: impl Into<String>) {
        let name = name.into();
        log::debug!("learned hostname {name} for {system_id:02x?}");
        self.names.insert(system_id, name);
    }

    pub fn lookup(&self, system_id: &SystemIdBytes) -> Option<&str> {
        self.names.get(system_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything a decoder may consult or update beyond its own bytes.
#[derive(Debug, Default, Clone)]
pub struct DecodeContext {
    pub options: DecodeOptions,
    pub hostnames: HostnameTable,
    /// System id of the IS-IS LSP being decoded, if any.
    pub(crate) origin: Option<SystemIdBytes>,
}

impl DecodeContext {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeContext, DecodeOptions, HostnameTable};

    #[test]
    fn options_default_verifies_checksums() {
        let options = DecodeOptions::default();
        assert!(options.verify_checksums);
        assert_eq!(options.hex_dump_limit, None);

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["verify_checksums"], true);
    }

    #[test]
    fn hostname_table_replaces_names() {
        let mut table = HostnameTable::new();
        let id = [0x19, 0x21, 0x68, 0x00, 0x10, 0x01];
        table.learn(id, "core-1");
        table.learn(id, "core-1a");
        assert_eq!(table.lookup(&id), Some("core-1a"));
        assert_eq!(table.len(), 1);
        assert!(table.lookup(&[0; 6]).is_none());
    }

    #[test]
    fn context_starts_without_origin() {
        let ctx = DecodeContext::new(DecodeOptions {
            verify_checksums: false,
            hex_dump_limit: Some(8),
        });
        assert!(ctx.origin.is_none());
        assert!(ctx.hostnames.is_empty());
        assert!(!ctx.options.verify_checksums);
    }
}
