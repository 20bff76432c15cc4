//! Single-trial execution: fresh key, keystream sample, fold into a table.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::RngCore;

use crate::error::{Error, Result};
use crate::generator::{KeystreamGenerator, MAX_KEY_LEN};
use crate::table::{FrequencyTable, SAMPLE_LEN};

/// Number of progress callbacks per run, not counting the final one.
pub const PROGRESS_STEPS: u64 = 100;

/// Receives `(completed, total)` trial counts from a running worker.
pub trait ProgressObserver: Send {
    fn update(&mut self, completed: u64, total: u64);
}

impl<F: FnMut(u64, u64) + Send> ProgressObserver for F {
    fn update(&mut self, completed: u64, total: u64) {
        self(completed, total)
    }
}

/// Runs trials for generator `G` using a privately owned random source.
///
/// Key and sample buffers are reused across trials, so the loop does not
/// allocate.
pub struct TrialRunner<G, R> {
    rng: R,
    key: [u8; MAX_KEY_LEN],
    key_len: usize,
    sample: [u8; SAMPLE_LEN],
    _generator: PhantomData<fn() -> G>,
}

impl<G: KeystreamGenerator, R: RngCore> TrialRunner<G, R> {
    pub fn new(rng: R, key_len: usize) -> Result<Self> {
        if key_len == 0 || key_len > MAX_KEY_LEN {
            return Err(Error::Usage(format!(
                "key length must be between 1 and {MAX_KEY_LEN} bytes, got {key_len}"
            )));
        }
        Ok(Self {
            rng,
            key: [0u8; MAX_KEY_LEN],
            key_len,
            sample: [0u8; SAMPLE_LEN],
            _generator: PhantomData,
        })
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// One trial: draw a key, emit `SAMPLE_LEN` bytes, increment
    /// `table[i][sample[i]]` for every position.
    #[inline]
    pub fn run_trial(&mut self, table: &mut FrequencyTable) {
        let key = &mut self.key[..self.key_len];
        self.rng.fill_bytes(key);
        let mut generator = G::from_key(key);
        generator.fill(&mut self.sample);
        table.record(&self.sample);
    }

    /// Run up to `trials` trials into `table`, returning how many completed.
    ///
    /// `cancel` is polled between trials; a cancelled run still leaves
    /// `table` holding exactly the completed trials.
    pub fn run(
        &mut self,
        trials: u64,
        table: &mut FrequencyTable,
        mut progress: Option<&mut dyn ProgressObserver>,
        cancel: Option<&AtomicBool>,
    ) -> u64 {
        let stride = trials.div_ceil(PROGRESS_STEPS).max(1);

        for t in 0..trials {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return t;
            }
            self.run_trial(table);

            let done = t + 1;
            if let Some(p) = progress.as_deref_mut() {
                if done % stride == 0 || done == trials {
                    p.update(done, trials);
                }
            }
        }
        trials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rc4::Rc4;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn runner(seed: u64) -> TrialRunner<Rc4, StdRng> {
        TrialRunner::new(StdRng::seed_from_u64(seed), 16).unwrap()
    }

    #[test]
    fn each_trial_adds_one_per_row() {
        let mut r = runner(1);
        let mut table = FrequencyTable::new();
        for n in 1..=5u128 {
            r.run_trial(&mut table);
            for i in 0..=255u8 {
                assert_eq!(table.row_sum(i), n);
            }
        }
    }

    #[test]
    fn trial_matches_direct_keystream() {
        let mut keys = StdRng::seed_from_u64(42);
        let mut key = [0u8; 16];
        keys.fill_bytes(&mut key);
        let sample: [u8; SAMPLE_LEN] = Rc4::from_key(&key).emit();

        let mut table = FrequencyTable::new();
        runner(42).run_trial(&mut table);
        for (i, &b) in sample.iter().enumerate() {
            assert_eq!(table.count(i as u8, b), 1);
        }
    }

    #[test]
    fn same_seed_same_table() {
        let mut a = FrequencyTable::new();
        let mut b = FrequencyTable::new();
        runner(7).run(50, &mut a, None, None);
        runner(7).run(50, &mut b, None, None);
        assert_eq!(a, b);

        let mut c = FrequencyTable::new();
        runner(8).run(50, &mut c, None, None);
        assert_ne!(a, c);
    }

    #[test]
    fn progress_is_bounded_and_ends_at_total() {
        let mut calls = Vec::new();
        let mut observer = |done: u64, total: u64| calls.push((done, total));
        let mut table = FrequencyTable::new();
        let done = runner(3).run(1050, &mut table, Some(&mut observer), None);

        assert_eq!(done, 1050);
        assert!(calls.len() <= PROGRESS_STEPS as usize + 1);
        assert_eq!(calls.last(), Some(&(1050, 1050)));
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn progress_never_exceeds_step_budget() {
        for trials in [99u64, 100, 101, 199, 1050, 12_345] {
            let mut calls = 0u64;
            let mut observer = |_: u64, _: u64| calls += 1;
            let mut table = FrequencyTable::new();
            runner(trials).run(trials, &mut table, Some(&mut observer), None);
            assert!(calls <= PROGRESS_STEPS + 1, "{trials} trials: {calls} updates");
        }
    }

    #[test]
    fn small_runs_report_every_trial() {
        let mut count = 0u64;
        let mut observer = |_: u64, _: u64| count += 1;
        let mut table = FrequencyTable::new();
        runner(3).run(7, &mut table, Some(&mut observer), None);
        assert_eq!(count, 7);
    }

    #[test]
    fn cancelled_run_keeps_completed_trials() {
        let cancel = AtomicBool::new(true);
        let mut table = FrequencyTable::new();
        let done = runner(5).run(100, &mut table, None, Some(&cancel));
        assert_eq!(done, 0);
        assert!(table.is_zero());
    }

    #[test]
    fn custom_key_length() {
        let mut r: TrialRunner<Rc4, _> = TrialRunner::new(StdRng::seed_from_u64(1), 5).unwrap();
        assert_eq!(r.key_len(), 5);
        let mut table = FrequencyTable::new();
        r.run(10, &mut table, None, None);
        assert_eq!(table.trials(), 10);
        assert!(table.is_balanced());
    }

    #[test]
    fn rejects_unusable_key_length() {
        assert!(TrialRunner::<Rc4, _>::new(StdRng::seed_from_u64(1), 0).is_err());
        assert!(TrialRunner::<Rc4, _>::new(StdRng::seed_from_u64(1), MAX_KEY_LEN + 1).is_err());
    }
}
