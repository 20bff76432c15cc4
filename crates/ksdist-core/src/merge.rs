//! Out-of-process result combination.
//!
//! Tables produced by separate runs or machines are loaded and folded into a
//! single accumulator. Loading is all-or-nothing: the first unreadable or
//! malformed file aborts the merge before anything is written.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::table::FrequencyTable;

/// Minimum number of inputs for a merge.
pub const MIN_INPUTS: usize = 2;

/// Load and sum every table in `paths`.
pub fn merge_tables<P: AsRef<Path>>(paths: &[P]) -> Result<FrequencyTable> {
    if paths.len() < MIN_INPUTS {
        return Err(Error::Usage(format!(
            "merge needs at least {MIN_INPUTS} input files, got {}",
            paths.len()
        )));
    }

    let mut acc = FrequencyTable::new();
    for path in paths {
        let path = path.as_ref();
        log::info!("merging in file {}", path.display());
        let table = FrequencyTable::load(path)?;
        acc.merge_from(&table)?;
    }
    Ok(acc)
}

/// Summary of a completed merge.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MergeReport {
    pub inputs: Vec<PathBuf>,
    pub trials: u128,
    pub balanced: bool,
}

/// Merge `paths` and write the result to `out`, or stdout when `None`.
pub fn merge_files<P: AsRef<Path>>(paths: &[P], out: Option<&Path>) -> Result<MergeReport> {
    let table = merge_tables(paths)?;
    Sink::from_option(out).write(&table)?;
    Ok(MergeReport {
        inputs: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        trials: table.trials(),
        balanced: table.is_balanced(),
    })
}
