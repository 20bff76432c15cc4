//! # ksdist-core
//!
//! Empirical keystream distributions for stream-cipher bias research.
//!
//! For every keystream position `i` in `0..256` and byte value `j`, count how
//! often a freshly keyed generator emits `j` at position `i`, over many
//! independent trials. RC4's well-known early-keystream biases show up as
//! deviations from the uniform `1/256` in the resulting table.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ksdist_core::{Aggregator, Rc4, RunConfig};
//!
//! let config = RunConfig::new(1 << 16, 8);
//! let result = Aggregator::<Rc4>::new(config)?.run(None)?;
//! assert_eq!(result.table.trials(), 1 << 16);
//! # Ok::<(), ksdist_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Generator → Trial → per-worker Table → merge → Sink
//!
//! - [`KeystreamGenerator`]: keyed byte stream with `fill` and `advance`,
//!   self-tested before use. [`Rc4`] is the reference implementation.
//! - [`FrequencyTable`]: the 256×256 count matrix with an associative,
//!   commutative `merge` and a line-oriented text form.
//! - [`TrialRunner`]: one key, one 256-byte sample, one table update.
//! - [`Aggregator`]: splits the trial budget across scoped worker threads,
//!   each owning its own table and random source, then reduces.
//! - [`merge_files`]: combines tables persisted by separate runs.

pub mod aggregate;
pub mod error;
pub mod generator;
pub mod merge;
pub mod rc4;
pub mod sink;
pub mod table;
pub mod trial;

pub use aggregate::{Aggregate, Aggregator, DEFAULT_KEY_LEN, RunConfig, WorkPlan};
pub use error::{Error, Result};
pub use generator::{KeyLengthPolicy, KeystreamGenerator, MAX_KEY_LEN, check_key_len};
pub use merge::{MIN_INPUTS, MergeReport, merge_files, merge_tables};
pub use rc4::Rc4;
pub use sink::Sink;
pub use table::{FrequencyTable, SAMPLE_LEN, SIZE};
pub use trial::{ProgressObserver, TrialRunner};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
