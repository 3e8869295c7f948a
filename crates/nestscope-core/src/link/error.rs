use thiserror::Error;

/// Why a frame's link or transport headers could not be peeled.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("bad {layer} header: {message}")]
    Header { layer: &'static str, message: String },
    #[error("frame carries no IP header")]
    NotIp,
    #[error("IP packet carries no payload")]
    NoIpPayload,
    #[error("UDP datagram of {actual} bytes is shorter than its {needed}-byte header")]
    ShortDatagram { needed: usize, actual: usize },
}

impl LinkError {
    pub(crate) fn header(layer: &'static str, err: impl std::fmt::Display) -> Self {
        LinkError::Header {
            layer,
            message: err.to_string(),
        }
    }
}
