//! Parallel trial aggregation.
//!
//! Architecture:
//! 1. Split the trial budget evenly over `W` workers, rounding up
//! 2. Derive one private random source per worker
//! 3. Each worker fills its own table on a scoped thread
//! 4. Reduce worker tables and the optional seed table with `merge_from`
//!
//! Workers share nothing mutable. The only cross-thread state is a read-only
//! cancellation flag, so the reduced table depends on the drawn keys alone,
//! never on scheduling.

use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::generator::{KeyLengthPolicy, KeystreamGenerator, check_key_len};
use crate::table::FrequencyTable;
use crate::trial::{ProgressObserver, TrialRunner};

/// Default trial key length in bytes.
pub const DEFAULT_KEY_LEN: usize = 16;

/// How a trial budget is divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkPlan {
    pub requested: u64,
    pub workers: usize,
    pub per_worker: u64,
}

impl WorkPlan {
    /// Split `requested` trials over `workers`, rounding the per-worker share
    /// up so the total never falls short.
    pub fn new(requested: u64, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Usage("concurrency must be at least 1".into()));
        }
        let per_worker = requested.div_ceil(workers as u64);
        if per_worker.checked_mul(workers as u64).is_none() {
            return Err(Error::Usage(format!(
                "{requested} trials over {workers} workers overflows the trial counter"
            )));
        }
        Ok(Self {
            requested,
            workers,
            per_worker,
        })
    }

    /// Trials that will actually run.
    pub fn total(&self) -> u64 {
        self.per_worker * self.workers as u64
    }

    /// Trials run beyond the request because of rounding.
    pub fn excess(&self) -> u64 {
        self.total() - self.requested
    }
}

/// Parameters for one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub trials: u64,
    pub workers: usize,
    pub key_len: usize,
    pub key_policy: KeyLengthPolicy,
    /// Base seed for reproducible worker streams. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(trials: u64, workers: usize) -> Self {
        Self {
            trials,
            workers,
            key_len: DEFAULT_KEY_LEN,
            key_policy: KeyLengthPolicy::default(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_key_len(mut self, key_len: usize, policy: KeyLengthPolicy) -> Self {
        self.key_len = key_len;
        self.key_policy = policy;
        self
    }
}

/// Result of a completed aggregation.
#[derive(Debug)]
pub struct Aggregate {
    pub table: FrequencyTable,
    pub plan: WorkPlan,
    /// Trials executed by this run, excluding any seed table.
    pub executed: u64,
    pub elapsed: Duration,
}

/// Runs a [`WorkPlan`] for generator `G` across scoped worker threads.
pub struct Aggregator<'a, G> {
    config: RunConfig,
    plan: WorkPlan,
    progress: Option<Box<dyn ProgressObserver + 'a>>,
    cancel: Option<&'a AtomicBool>,
    _generator: PhantomData<fn() -> G>,
}

impl<'a, G: KeystreamGenerator> Aggregator<'a, G> {
    /// Validate `config` and build the plan. Reports rounding excess.
    pub fn new(config: RunConfig) -> Result<Self> {
        check_key_len::<G>(config.key_len, config.key_policy)?;
        let plan = WorkPlan::new(config.trials, config.workers)?;
        if plan.excess() > 0 {
            log::warn!(
                "performing {} additional trials ({} trials not a multiple of concurrency {})",
                plan.excess(),
                plan.requested,
                plan.workers
            );
        }
        Ok(Self {
            config,
            plan,
            progress: None,
            cancel: None,
            _generator: PhantomData,
        })
    }

    pub fn plan(&self) -> &WorkPlan {
        &self.plan
    }

    /// Attach a progress observer. It is driven by worker 0 only.
    pub fn with_progress(mut self, observer: impl ProgressObserver + 'a) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    /// Poll `flag` between trials; once set, workers stop and the run fails
    /// with [`Error::Interrupted`].
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn worker_rngs(&self) -> Vec<StdRng> {
        let mut master = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        (0..self.plan.workers)
            .map(|_| StdRng::from_rng(&mut master))
            .collect()
    }

    /// Self-test the generator, run every worker, and reduce.
    ///
    /// `initial` is merged into the result when present.
    pub fn run(mut self, initial: Option<FrequencyTable>) -> Result<Aggregate> {
        G::self_test()?;
        log::info!("{} self-test passed", G::NAME);

        let plan = self.plan;
        let key_len = self.config.key_len;
        let cancel = self.cancel;
        let mut progress = self.progress.take();
        let rngs = self.worker_rngs();

        log::info!(
            "running {} trials: {} workers x {} trials",
            plan.total(),
            plan.workers,
            plan.per_worker
        );

        let started = Instant::now();
        let results: Vec<Result<(FrequencyTable, u64)>> = std::thread::scope(|s| {
            let handles: Vec<_> = rngs
                .into_iter()
                .enumerate()
                .map(|(w, rng)| {
                    let mut observer = if w == 0 { progress.take() } else { None };
                    s.spawn(move || -> Result<(FrequencyTable, u64)> {
                        let t0 = Instant::now();
                        let mut runner = TrialRunner::<G, _>::new(rng, key_len)?;
                        let mut table = FrequencyTable::new();
                        let done = runner.run(
                            plan.per_worker,
                            &mut table,
                            observer.as_deref_mut().map(|o| o as &mut dyn ProgressObserver),
                            cancel,
                        );
                        log::debug!("worker {w}: {done} trials in {:?}", t0.elapsed());
                        Ok((table, done))
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(w, h)| h.join().unwrap_or_else(|_| Err(Error::WorkerPanicked(w))))
                .collect()
        });
        let elapsed = started.elapsed();

        let mut table = initial.unwrap_or_default();
        let mut executed = 0u64;
        let mut first_err = None;
        for result in results {
            match result {
                Ok((partial, done)) => {
                    executed += done;
                    table.merge_from(&partial)?;
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        if executed < plan.total() {
            return Err(Error::Interrupted {
                completed: executed,
            });
        }

        log::info!("{executed} trials in {:.2}s", elapsed.as_secs_f64());
        Ok(Aggregate {
            table,
            plan,
            executed,
            elapsed,
        })
    }
}
