//! Console and JSON output.
//!
//! The JSON file holds one document, `{"results": [...]}`, with one record per
//! (strategy, block size) run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use blockring::StrategyKind;
use serde::Serialize;

use crate::harness::{RunParams, RunResult};

/// One run, as written to the results file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchRecord {
    pub implementation: &'static str,
    pub num_cycles: usize,
    pub block_size: usize,
    pub num_blocks: usize,
    pub num_readers: usize,
    /// Mean write latency, ns.
    pub writer: f64,
    /// Mean read latency per reader, ns.
    pub readers: Vec<f64>,
    pub torn_reads: u64,
}

impl BenchRecord {
    pub fn new(kind: StrategyKind, params: &RunParams, result: &RunResult) -> Self {
        Self {
            implementation: label(kind),
            num_cycles: params.cycles,
            block_size: params.ring.block_size,
            num_blocks: params.ring.num_blocks,
            num_readers: params.num_readers,
            writer: result.writer_ns,
            readers: result.readers_ns.clone(),
            torn_reads: result.torn_reads,
        }
    }
}

#[derive(Serialize)]
struct ResultsFile<'a> {
    results: &'a [BenchRecord],
}

/// Human-readable strategy name.
pub fn label(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::Unsynchronized => "Unsynchronized",
        StrategyKind::Exclusive => "Mutex",
        StrategyKind::Shared => "Shared mutex",
        StrategyKind::SeqLock => "SeqLock",
        StrategyKind::Baseline => "Memcpy",
    }
}

/// Print one run's timings.
pub fn print_results<W: Write>(out: &mut W, record: &BenchRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "\n{} (block size {}, {} blocks)",
        record.implementation, record.block_size, record.num_blocks
    )?;
    writeln!(out, "Write time, ns: {:.1}", record.writer)?;
    for (k, ns) in record.readers.iter().enumerate() {
        writeln!(out, "Read {} time, ns: {:.1}", k, ns)?;
    }
    if record.torn_reads > 0 {
        writeln!(out, "Torn reads: {}", record.torn_reads)?;
    }
    Ok(())
}

/// Serialize `records` as a results document.
pub fn write_json<W: Write>(out: W, records: &[BenchRecord]) -> Result<()> {
    serde_json::to_writer_pretty(out, &ResultsFile { results: records })?;
    Ok(())
}

/// Write `records` to `path`, replacing any previous file.
pub fn save(path: &Path, records: &[BenchRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_json(&mut out, records)?;
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockring::RingConfig;

    fn sample() -> BenchRecord {
        let params = RunParams {
            ring: RingConfig::new(10, 16),
            num_readers: 2,
            cycles: 1000,
            verify: false,
        };
        let result = RunResult {
            writer_ns: 21.5,
            readers_ns: vec![30.4, 31.0],
            torn_reads: 0,
        };
        BenchRecord::new(StrategyKind::Shared, &params, &result)
    }

    #[test]
    fn test_json_shape() {
        let mut buf = Vec::new();
        write_json(&mut buf, &[sample()]).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let record = &doc["results"][0];
        assert_eq!(record["implementation"], "Shared mutex");
        assert_eq!(record["num_cycles"], 1000);
        assert_eq!(record["block_size"], 16);
        assert_eq!(record["num_blocks"], 10);
        assert_eq!(record["num_readers"], 2);
        assert_eq!(record["writer"], 21.5);
        assert_eq!(record["readers"], serde_json::json!([30.4, 31.0]));
        assert_eq!(record["torn_reads"], 0);
    }

    #[test]
    fn test_labels_are_distinct() {
        let mut labels: Vec<_> = StrategyKind::ALL.iter().map(|&k| label(k)).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), StrategyKind::ALL.len());
    }

    #[test]
    fn test_print_results() {
        let mut out = Vec::new();
        print_results(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Shared mutex (block size 16, 10 blocks)"));
        assert!(text.contains("Write time, ns: 21.5"));
        assert!(text.contains("Read 0 time, ns: 30.4"));
        assert!(text.contains("Read 1 time, ns: 31.0"));
        assert!(!text.contains("Torn reads"));
    }

    #[test]
    fn test_save_creates_file() {
        let path = std::env::temp_dir().join(format!(
            "blockring-bench-report-{}.json",
            std::process::id()
        ));
        save(&path, &[sample(), sample()]).unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["results"].as_array().map(Vec::len), Some(2));
        std::fs::remove_file(&path).unwrap();
    }
}
