use thiserror::Error;

/// Terminal decode failures.
///
/// These are the only two ways a decode can fail; an unknown record type is
/// not an error and is rendered opaquely instead.
///
/// # Examples
/// ```
/// use nestscope_core::wire::DecodeError;
///
/// let err = DecodeError::Truncated { offset: 4, needed: 2, available: 1 };
/// assert!(err.to_string().contains("truncated"));
/// assert!(err.is_truncated());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Captured data ended before a required field.
    #[error("truncated at offset {offset}: need {needed} bytes, captured {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Fully captured data violates a structural invariant.
    #[error("malformed at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}

impl DecodeError {
    pub fn malformed(offset: usize, reason: &'static str) -> Self {
        DecodeError::Malformed { offset, reason }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::Malformed { .. })
    }

    /// Offset into the top-level buffer where the failure was detected.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::Truncated { offset, .. } | DecodeError::Malformed { offset, .. } => {
                *offset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DecodeError;

    #[test]
    fn malformed_message_includes_reason() {
        let err = DecodeError::malformed(7, "record length exceeds envelope");
        assert!(err.is_malformed());
        assert_eq!(err.offset(), 7);
        assert!(err.to_string().contains("record length exceeds envelope"));
    }

    #[test]
    fn truncated_reports_needed_and_available() {
        let err = DecodeError::Truncated {
            offset: 3,
            needed: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "truncated at offset 3: need 4 bytes, captured 2"
        );
    }
}
