//! Terminal progress bar on standard error.

use std::io::{IsTerminal, Stderr, Write};

use ksdist_core::ProgressObserver;

const WIDTH: usize = 60;

pub struct ProgressBar<W> {
    out: W,
    width: usize,
}

impl ProgressBar<Stderr> {
    /// A bar on stderr, or `None` when stderr is not a terminal.
    pub fn stderr() -> Option<Self> {
        let err = std::io::stderr();
        err.is_terminal().then(|| Self::new(err, WIDTH))
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self { out, width }
    }
}

/// `[|||||.....]  50%` for `completed` of `total`.
pub fn render(completed: u64, total: u64, width: usize) -> String {
    let filled = if total == 0 {
        width
    } else {
        ((completed.min(total) as u128 * width as u128) / total as u128) as usize
    };
    let percent = if total == 0 {
        100
    } else {
        completed.min(total) * 100 / total
    };
    format!(
        "[{}{}] {percent:>3}%",
        "|".repeat(filled),
        ".".repeat(width - filled)
    )
}

impl<W: Write + Send> ProgressObserver for ProgressBar<W> {
    fn update(&mut self, completed: u64, total: u64) {
        let line = render(completed, total, self.width);
        let end = if completed >= total { "\n" } else { "" };
        // Progress output is best effort.
        let _ = write!(self.out, "\r{line}{end}");
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_bounds() {
        assert_eq!(render(0, 10, 4), "[....]   0%");
        assert_eq!(render(5, 10, 4), "[||..]  50%");
        assert_eq!(render(10, 10, 4), "[||||] 100%");
        assert_eq!(render(0, 0, 4), "[||||] 100%");
    }

    #[test]
    fn bar_writes_carriage_returns_and_final_newline() {
        let mut bar = ProgressBar::new(Vec::new(), 4);
        bar.update(1, 2);
        bar.update(2, 2);
        let text = String::from_utf8(bar.out).unwrap();
        assert_eq!(text, "\r[||..]  50%\r[||||] 100%\n");
    }
}
