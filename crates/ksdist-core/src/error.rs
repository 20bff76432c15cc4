//! Error type shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Generator output disagreed with its published reference vectors.
    #[error(
        "{generator} failed self-test at keystream offset {offset}: expected {expected:#04x}, got {actual:#04x}"
    )]
    SelfTest {
        generator: &'static str,
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("usage error: {0}")]
    Usage(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted table did not match `cnt[<i>][<j>]\t<count>`.
    #[error("format error in {origin} line {line}: {reason}")]
    Format {
        origin: String,
        line: usize,
        reason: String,
    },

    #[error("key length {len} rejected: {generator} is only validated with {expected}-byte keys")]
    KeyLength {
        generator: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("count overflow merging cell [{position}][{value}]")]
    CountOverflow { position: u8, value: u8 },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("interrupted after {completed} trials; no output written")]
    Interrupted { completed: u64 },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
