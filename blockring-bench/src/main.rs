//! Latency benchmark for blockring strategies.
//!
//! Runs one writer and N readers against a shared ring for every requested
//! strategy and block size, and prints the mean per-call latency of each
//! thread.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release -p blockring-bench
//! cargo run --release -p blockring-bench -- --block-size 16,256,4096 --output results.json
//! cargo run --release -p blockring-bench -- --strategy seqlock --verify
//! ```

mod config;
mod harness;
mod report;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::config::{BenchConfig, Cli};
use crate::harness::RunParams;
use crate::report::BenchRecord;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BenchConfig::from_cli(Cli::parse())?;
    info!(
        "{} runs: {} blocks, {} readers, {} cycles",
        config.total_runs(),
        config.num_blocks,
        config.num_readers,
        config.cycles
    );

    let records = run_all(&config)?;

    if let Some(path) = &config.output {
        report::save(path, &records)?;
        info!("Wrote {} results to {}", records.len(), path.display());
    }
    Ok(())
}

fn run_all(config: &BenchConfig) -> Result<Vec<BenchRecord>> {
    let mut stdout = io::stdout().lock();
    let mut records = Vec::with_capacity(config.total_runs());

    for &kind in &config.strategies {
        for &block_size in &config.block_sizes {
            let params = RunParams {
                ring: config.ring_config(block_size),
                num_readers: config.num_readers,
                cycles: config.cycles,
                verify: config.verify,
            };
            let result = harness::run(kind, &params)
                .with_context(|| format!("{} run with block size {} failed", kind, block_size))?;

            let record = BenchRecord::new(kind, &params, &result);
            report::print_results(&mut stdout, &record)?;
            records.push(record);
        }
    }
    Ok(records)
}
