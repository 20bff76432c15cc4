//! End-to-end tests for the `ksdist` binary.

use std::path::Path;
use std::process::{Command, Output};

fn ksdist(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ksdist"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch ksdist")
}

fn row_sums(path: &Path) -> Vec<u64> {
    let text = std::fs::read_to_string(path).unwrap();
    let mut sums = vec![0u64; 256];
    for line in text.lines() {
        let (cell, count) = line.split_once('\t').unwrap();
        let i: usize = cell
            .trim_start_matches("cnt[")
            .split(']')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        sums[i] += count.parse::<u64>().unwrap();
    }
    sums
}

#[test]
fn compute_then_merge() {
    let dir = tempfile::tempdir().unwrap();
    let single = dir.path().join("single.txt");
    let merged = dir.path().join("merged.txt");

    let out = ksdist(&[
        "compute",
        "--trials",
        "100",
        "--concurrency",
        "1",
        "--output",
        single.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(row_sums(&single).iter().all(|&s| s == 100));

    let s = single.to_str().unwrap();
    let out = ksdist(&["merge", s, s, "--output", merged.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(row_sums(&merged).iter().all(|&s| s == 200));
}

#[test]
fn compute_writes_to_stdout_by_default() {
    let out = ksdist(&["compute", "--trials", "2^3", "--concurrency", "2", "--seed", "1"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().count(), 256 * 256);
    assert!(text.starts_with("cnt[0][0]\t"));
}

#[test]
fn seeded_runs_match() {
    let args = ["compute", "--trials", "64", "--concurrency", "3", "--seed", "42"];
    let a = ksdist(&args);
    let b = ksdist(&args);
    assert!(a.status.success() && b.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn rounding_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    let summary = dir.path().join("summary.json");
    let out = ksdist(&[
        "compute",
        "--trials",
        "10",
        "--concurrency",
        "3",
        "--output",
        output.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("2 additional trials"));
    assert!(row_sums(&output).iter().all(|&s| s == 12));

    let json = std::fs::read_to_string(&summary).unwrap();
    assert!(json.contains("\"excess_trials\": 2"), "{json}");
    assert!(json.contains("\"executed_trials\": 12"), "{json}");
    assert!(json.contains("\"table_trials\": 12"), "{json}");
}

#[test]
fn input_table_seeds_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");

    let out = ksdist(&[
        "compute",
        "--trials",
        "16",
        "--concurrency",
        "2",
        "--output",
        first.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let out = ksdist(&[
        "compute",
        "--trials",
        "16",
        "--concurrency",
        "4",
        "--input",
        first.to_str().unwrap(),
        "--output",
        second.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(row_sums(&second).iter().all(|&s| s == 32));
}

#[test]
fn merge_needs_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let only = dir.path().join("only.txt");
    std::fs::write(&only, "").unwrap();
    let out = ksdist(&["merge", only.to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn merge_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let bad = dir.path().join("bad.txt");
    let merged = dir.path().join("merged.txt");

    let out = ksdist(&["compute", "--trials", "4", "--output", good.to_str().unwrap()]);
    assert!(out.status.success());
    std::fs::write(&bad, "cnt[5][300]\t1\n").unwrap();

    let out = ksdist(&[
        "merge",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
        "--output",
        merged.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bad.txt"), "{stderr}");
    assert!(!merged.exists());
}

#[test]
fn unreadable_input_fails() {
    let out = ksdist(&["compute", "--trials", "1", "--input", "/nonexistent/ksdist.txt"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn bad_arguments_fail() {
    assert!(!ksdist(&["compute", "--trials", "lots"]).status.success());
    assert!(!ksdist(&["compute", "--trials", "4", "--concurrency", "0"]).status.success());
    assert!(
        !ksdist(&["compute", "--trials", "4", "--key-len", "8", "--strict-key-len"])
            .status
            .success()
    );
    assert!(!ksdist(&["frobnicate"]).status.success());
    assert!(!ksdist(&[]).status.success());
}

#[test]
fn help_and_self_test_succeed() {
    let out = ksdist(&["help"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("merge"));

    let out = ksdist(&["self-test"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("self-test passed"));
}
