//! Final output destination for a reduced table.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::FrequencyTable;

/// Where a finished table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

impl Sink {
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::File(p.to_path_buf()),
            None => Self::Stdout,
        }
    }

    /// Write `table` once. Files are replaced atomically.
    pub fn write(&self, table: &FrequencyTable) -> Result<()> {
        match self {
            Self::Stdout => {
                let stdout = std::io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                table
                    .write_to(&mut out)
                    .map_err(|e| Error::io("<stdout>", e))?;
                out.flush().map_err(|e| Error::io("<stdout>", e))
            }
            Self::File(path) => {
                table.save(path)?;
                log::info!("wrote distribution to {}", path.display());
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "[stdout]"),
            Self::File(p) => write!(f, "{}", p.display()),
        }
    }
}
