//! 256×256 keystream frequency table.
//!
//! `count(i, j)` is the number of trials in which keystream position `i`
//! held byte value `j`. Every trial contributes exactly one increment per
//! row, so all row sums equal the number of trials folded in.
//!
//! Persisted form is one line per cell in row-major order:
//!
//! ```text
//! cnt[<i>][<j>]\t<count>
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Positions per keystream sample and values per byte.
pub const SIZE: usize = 256;

/// Keystream bytes folded per trial.
pub const SAMPLE_LEN: usize = SIZE;

type Cells = [[u64; SIZE]; SIZE];

#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    cells: Box<Cells>,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrequencyTable")
            .field("trials", &self.trials())
            .field("balanced", &self.is_balanced())
            .finish()
    }
}

fn zeroed_cells() -> Box<Cells> {
    // Built on the heap; a 512 KiB array would not fit on a worker stack.
    let rows: Box<[[u64; SIZE]]> = vec![[0u64; SIZE]; SIZE].into_boxed_slice();
    match rows.try_into() {
        Ok(cells) => cells,
        Err(_) => unreachable!("row count is fixed at {SIZE}"),
    }
}

impl FrequencyTable {
    /// All-zero table.
    pub fn new() -> Self {
        Self {
            cells: zeroed_cells(),
        }
    }

    #[inline]
    pub fn increment(&mut self, position: u8, value: u8) {
        self.cells[position as usize][value as usize] += 1;
    }

    /// Fold one trial's keystream sample into the table.
    #[inline]
    pub fn record(&mut self, sample: &[u8; SAMPLE_LEN]) {
        for (row, &value) in self.cells.iter_mut().zip(sample.iter()) {
            row[value as usize] += 1;
        }
    }

    pub fn count(&self, position: u8, value: u8) -> u64 {
        self.cells[position as usize][value as usize]
    }

    pub fn row(&self, position: u8) -> &[u64; SIZE] {
        &self.cells[position as usize]
    }

    /// Total of one row. Widened so that rows holding counts near
    /// `u64::MAX` still sum exactly.
    pub fn row_sum(&self, position: u8) -> u128 {
        self.row(position).iter().map(|&c| u128::from(c)).sum()
    }

    /// Number of trials represented, taken from row 0.
    pub fn trials(&self) -> u128 {
        self.row_sum(0)
    }

    /// True when every row sums to the same total.
    pub fn is_balanced(&self) -> bool {
        let first = self.trials();
        (1..=255u8).all(|i| self.row_sum(i) == first)
    }

    pub fn is_zero(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|&c| c == 0))
    }

    /// Add `other` into `self` cell by cell.
    ///
    /// On overflow `self` is left untouched.
    pub fn merge_from(&mut self, other: &FrequencyTable) -> Result<()> {
        for (i, (row, other_row)) in self.cells.iter().zip(other.cells.iter()).enumerate() {
            for (j, (&a, &b)) in row.iter().zip(other_row.iter()).enumerate() {
                if a.checked_add(b).is_none() {
                    return Err(Error::CountOverflow {
                        position: i as u8,
                        value: j as u8,
                    });
                }
            }
        }
        for (row, other_row) in self.cells.iter_mut().zip(other.cells.iter()) {
            for (a, &b) in row.iter_mut().zip(other_row.iter()) {
                *a += b;
            }
        }
        Ok(())
    }

    /// Elementwise sum of two tables as a new table.
    pub fn merge(&self, other: &FrequencyTable) -> Result<FrequencyTable> {
        let mut out = self.clone();
        out.merge_from(other)?;
        Ok(out)
    }

    /// Write the textual form.
    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        let mut line = String::with_capacity(32);
        for (i, row) in self.cells.iter().enumerate() {
            for (j, c) in row.iter().enumerate() {
                line.clear();
                // Writing into a String cannot fail.
                let _ = writeln!(line, "cnt[{i}][{j}]\t{c}");
                w.write_all(line.as_bytes())?;
            }
        }
        w.flush()
    }

    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(SIZE * SIZE * 16);
        for (i, row) in self.cells.iter().enumerate() {
            for (j, c) in row.iter().enumerate() {
                // Writing into a String cannot fail.
                let _ = writeln!(text, "cnt[{i}][{j}]\t{c}");
            }
        }
        text
    }

    /// Parse the textual form. `origin` names the input in errors.
    ///
    /// Every cell must appear exactly once; order is not enforced.
    pub fn read_from<R: BufRead>(r: R, origin: &str) -> Result<Self> {
        let mut table = Self::new();
        let mut seen = vec![false; SIZE * SIZE];
        let mut filled = 0usize;

        for (idx, line) in r.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|e| Error::Format {
                origin: origin.to_string(),
                line: lineno,
                reason: e.to_string(),
            })?;
            let fail = |reason: String| Error::Format {
                origin: origin.to_string(),
                line: lineno,
                reason,
            };

            let text = line.strip_suffix('\r').unwrap_or(line.as_str());
            let (i, j, count) = parse_line(text).map_err(fail)?;
            let slot = i as usize * SIZE + j as usize;
            if seen[slot] {
                return Err(fail(format!("duplicate cell cnt[{i}][{j}]")));
            }
            seen[slot] = true;
            filled += 1;
            table.cells[i as usize][j as usize] = count;
        }

        if filled != SIZE * SIZE {
            let missing = seen.iter().position(|&s| !s).unwrap_or(0);
            return Err(Error::Format {
                origin: origin.to_string(),
                line: filled + 1,
                reason: format!(
                    "expected {} cells, found {filled} (first missing cnt[{}][{}])",
                    SIZE * SIZE,
                    missing / SIZE,
                    missing % SIZE
                ),
            });
        }

        if !table.is_balanced() {
            log::warn!("{origin}: row sums differ; table was not produced by whole trials");
        }
        Ok(table)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::read_from(text.as_bytes(), "<input>")
    }

    /// Load a table from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::read_from(BufReader::new(file), &path.display().to_string())
    }

    /// Write a table to a file.
    ///
    /// The text goes to a temporary file next to `path` which is renamed into
    /// place only after every line has been written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            self.write_to(&mut w).map_err(|e| Error::io(path, e))?;
        }
        tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
        Ok(())
    }
}

fn parse_index(s: &str, what: &str) -> std::result::Result<u8, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{what} index '{s}' is not a decimal integer"));
    }
    match s.parse::<u32>() {
        Ok(v) if v < SIZE as u32 => Ok(v as u8),
        _ => Err(format!("{what} index {s} outside [0,{SIZE})")),
    }
}

fn parse_line(line: &str) -> std::result::Result<(u8, u8, u64), String> {
    let malformed = || format!("expected 'cnt[<i>][<j>]\\t<count>', got '{line}'");

    let rest = line.strip_prefix("cnt[").ok_or_else(malformed)?;
    let (i, rest) = rest.split_once("][").ok_or_else(malformed)?;
    let (j, rest) = rest.split_once("]\t").ok_or_else(malformed)?;

    let i = parse_index(i, "position")?;
    let j = parse_index(j, "value")?;

    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let count = rest
        .parse::<u64>()
        .map_err(|_| format!("count {rest} does not fit in 64 bits"))?;
    Ok((i, j, count))
}
