#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rdk_backtest::ResultAggregator;

pub const HEADER: &str = "Date,Open,High,Low,Close,Volume";

/// Write a feed file with the standard header followed by `rows`.
pub fn write_feed(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = String::from(HEADER);
    body.push('\n');
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    fs::write(&path, body).expect("write feed fixture");
    path
}

pub fn memory_results() -> ResultAggregator<Vec<u8>> {
    ResultAggregator::new(Vec::new(), 6).expect("header")
}

pub fn output_lines(results: ResultAggregator<Vec<u8>>) -> Vec<String> {
    let bytes = results.finish().expect("finish");
    String::from_utf8(bytes)
        .expect("utf8")
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
