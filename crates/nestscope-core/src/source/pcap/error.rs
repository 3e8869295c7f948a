use std::fmt;

use thiserror::Error;

/// Capture container a reader error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pcap,
    PcapNg,
}

/// Step of the block loop that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Refill,
    Next,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Pcap => "pcap",
            Format::PcapNg => "pcapng",
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::Refill => "refill",
            Stage::Next => "next",
        })
    }
}

#[derive(Debug, Error)]
pub enum PcapSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{format} reader {stage}: {message}")]
    Reader {
        format: Format,
        stage: Stage,
        message: String,
    },
}

impl PcapSourceError {
    pub(crate) fn reader(format: Format, stage: Stage, err: impl fmt::Display) -> Self {
        PcapSourceError::Reader {
            format,
            stage,
            message: err.to_string(),
        }
    }
}
