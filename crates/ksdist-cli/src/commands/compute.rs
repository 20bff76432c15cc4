use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ksdist_core::{
    Aggregator, Error, FrequencyTable, KeyLengthPolicy, KeystreamGenerator, Rc4, Result,
    RunConfig, Sink,
};

use crate::progress::ProgressBar;

pub struct ComputeCommandConfig<'a> {
    pub trials: u64,
    pub input: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub concurrency: Option<usize>,
    pub seed: Option<u64>,
    pub key_len: usize,
    pub strict_key_len: bool,
    pub summary: Option<&'a Path>,
}

pub fn run(cfg: ComputeCommandConfig<'_>) -> Result<()> {
    let workers = match cfg.concurrency {
        Some(n) => n,
        None => {
            let n = super::default_concurrency();
            log::info!("setting concurrency to number of cores ({n})");
            n
        }
    };
    let policy = if cfg.strict_key_len {
        KeyLengthPolicy::Reject
    } else {
        KeyLengthPolicy::Warn
    };

    let mut config = RunConfig::new(cfg.trials, workers).with_key_len(cfg.key_len, policy);
    if let Some(seed) = cfg.seed {
        config = config.with_seed(seed);
    }
    let sink = Sink::from_option(cfg.output);

    let aggregator = Aggregator::<Rc4>::new(config.clone())?;
    let plan = *aggregator.plan();
    log::info!("num_trials: {}", plan.total());
    log::info!("concurrency: {}", plan.workers);
    log::info!("trials_per_exec: {}", plan.per_worker);
    log::info!(
        "infile: {}",
        cfg.input.map_or("[none]".into(), |p| p.display().to_string())
    );
    log::info!("outfile: {sink}");

    let initial = match cfg.input {
        Some(path) => {
            log::info!("reading initial distribution from file {}", path.display());
            Some(FrequencyTable::load(path)?)
        }
        None => None,
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            log::warn!("could not install Ctrl-C handler: {e}");
        }
    }

    let mut aggregator = aggregator.with_cancel(&interrupted);
    if let Some(bar) = ProgressBar::stderr() {
        aggregator = aggregator.with_progress(bar);
    }
    let result = aggregator.run(initial)?;

    sink.write(&result.table)?;

    if let Some(path) = cfg.summary {
        let summary = serde_json::json!({
            "generator": Rc4::NAME,
            "config": config,
            "plan": result.plan,
            "excess_trials": result.plan.excess(),
            "executed_trials": result.executed,
            "table_trials": u64::try_from(result.table.trials()).ok(),
            "balanced": result.table.is_balanced(),
            "input": cfg.input.map(|p| p.display().to_string()),
            "output": sink.to_string(),
            "elapsed_secs": result.elapsed.as_secs_f64(),
        });
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::io(path, std::io::Error::other(e)))?;
        std::fs::write(path, text).map_err(|e| Error::io(path, e))?;
        log::info!("wrote run summary to {}", path.display());
    }

    Ok(())
}
