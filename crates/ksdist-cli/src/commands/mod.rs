pub mod compute;
pub mod merge;
pub mod self_test;

/// Parse a trial count given as a decimal integer or as `2^k`.
pub fn parse_count(s: &str) -> Result<u64, String> {
    if let Some(exp) = s.strip_prefix("2^") {
        let k: u32 = exp
            .parse()
            .map_err(|_| format!("invalid exponent in '{s}'"))?;
        return 1u64
            .checked_shl(k)
            .ok_or_else(|| format!("'{s}' does not fit in 64 bits (exponent must be 0..=63)"));
    }
    s.parse::<u64>()
        .map_err(|_| format!("invalid count '{s}': expected an integer (1024) or a power of two (2^10)"))
}

/// Hardware parallelism, or 1 if it cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_power_of_two_counts() {
        assert_eq!(parse_count("1024"), Ok(1024));
        assert_eq!(parse_count("0"), Ok(0));
        assert_eq!(parse_count("2^0"), Ok(1));
        assert_eq!(parse_count("2^10"), Ok(1024));
        assert_eq!(parse_count("2^63"), Ok(1 << 63));
    }

    #[test]
    fn rejects_bad_counts() {
        for bad in ["", "ten", "2^", "2^64", "2^-1", "1e6", "-5", "3^4"] {
            assert!(parse_count(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn default_concurrency_is_positive() {
        assert!(default_concurrency() >= 1);
    }
}
