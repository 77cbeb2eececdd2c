//! Durable per-epoch and benchmark CSV logs.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::benchmark::BenchmarkResult;
use crate::core::{Result, TrainError};

const METRICS_HEADER: [&str; 4] = ["epoch", "win_rate", "avg_score_diff", "epsilon"];
const BENCHMARK_HEADER: [&str; 5] = ["epoch", "opponent", "win_rate", "avg_score_diff", "matches"];

/// One row of the epoch metrics file.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct EpochMetrics {
    pub epoch: u32,
    pub win_rate: f64,
    pub avg_score_diff: f64,
    pub epsilon: f64,
}

/// One row of the benchmark file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BenchmarkRow {
    pub epoch: u32,
    pub opponent: String,
    pub win_rate: f64,
    pub avg_score_diff: f64,
    pub matches: usize,
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TrainError::io(parent, e))?;
    }
    Ok(())
}

fn appender(path: &Path) -> Result<csv::Writer<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TrainError::io(path, e))?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

/// Epoch metrics file, one row appended per epoch.
#[derive(Clone, Debug)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    /// Start a fresh file with just the header, replacing any earlier run.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        create_parent(&path)?;
        let mut w = csv::Writer::from_path(&path)?;
        w.write_record(METRICS_HEADER)?;
        w.flush().map_err(|e| TrainError::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &EpochMetrics) -> Result<()> {
        let mut w = appender(&self.path)?;
        w.write_record([
            row.epoch.to_string(),
            format!("{:.3}", row.win_rate),
            format!("{:.2}", row.avg_score_diff),
            format!("{:.3}", row.epsilon),
        ])?;
        w.flush().map_err(|e| TrainError::io(&self.path, e))?;
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Vec<EpochMetrics>> {
        read_rows(path.as_ref())
    }
}

/// Append one epoch's benchmark results, writing the header first if the
/// file does not exist yet.
pub fn append_benchmark(path: impl AsRef<Path>, epoch: u32, results: &[BenchmarkResult]) -> Result<()> {
    let path = path.as_ref();
    let write_header = !path.exists();
    create_parent(path)?;
    let mut w = appender(path)?;
    if write_header {
        w.write_record(BENCHMARK_HEADER)?;
    }
    for r in results {
        w.write_record([
            epoch.to_string(),
            r.opponent.clone(),
            format!("{:.3}", r.win_rate),
            format!("{:.2}", r.avg_score_diff),
            r.matches.to_string(),
        ])?;
    }
    w.flush().map_err(|e| TrainError::io(path, e))?;
    Ok(())
}

pub fn read_benchmark(path: impl AsRef<Path>) -> Result<Vec<BenchmarkRow>> {
    read_rows(path.as_ref())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "stale\n").unwrap();

        let log = MetricsLog::create(&path).unwrap();
        log.append(&EpochMetrics {
            epoch: 1,
            win_rate: 0.5,
            avg_score_diff: -0.25,
            epsilon: 0.3,
        })
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "epoch,win_rate,avg_score_diff,epsilon\n1,0.500,-0.25,0.300\n");

        let rows = MetricsLog::read(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avg_score_diff, -0.25);
    }

    #[test]
    fn test_benchmark_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bench.csv");
        let results = vec![
            BenchmarkResult::new("random", 0.75, 1.5, 4),
            BenchmarkResult::failed("greedy"),
        ];
        append_benchmark(&path, 2, &results).unwrap();
        append_benchmark(&path, 4, &results[..1]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("epoch,opponent").count(), 1);

        let rows = read_benchmark(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].opponent, "greedy");
        assert_eq!(rows[1].matches, 0);
        assert_eq!(rows[2].epoch, 4);
        assert_eq!(rows[2].win_rate, 0.75);
    }
}
