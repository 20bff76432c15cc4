use std::path::{Path, PathBuf};

use ksdist_core::{Result, merge_files};

pub fn run(files: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let names: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    log::info!("merging {} files: {}", files.len(), names.join(" "));

    let report = merge_files(files, output)?;
    log::info!(
        "merged distribution covers {} trials{}",
        report.trials,
        if report.balanced { "" } else { " (rows unbalanced)" }
    );
    Ok(())
}
