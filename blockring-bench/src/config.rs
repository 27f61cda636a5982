//! Command line and run configuration.

use std::path::PathBuf;

use anyhow::{bail, Result};
use blockring::{RingConfig, StrategyKind, DEFAULT_ALIGNMENT};
use clap::Parser;

/// Single-writer / multi-reader ring buffer benchmark
#[derive(Parser, Debug)]
#[command(name = "blockring-bench")]
#[command(about = "Measure per-call write and read latency of blockring strategies")]
pub struct Cli {
    /// Blocks in the ring
    #[arg(short = 'n', long, default_value_t = 10)]
    pub num_blocks: usize,

    /// Elements per block; repeat or comma-separate to sweep
    #[arg(short, long = "block-size", value_delimiter = ',', default_values_t = [16])]
    pub block_sizes: Vec<usize>,

    /// Reader threads
    #[arg(short, long, default_value_t = 3)]
    pub readers: usize,

    /// Writes and reads per thread
    #[arg(short, long, default_value_t = 1_000_000)]
    pub cycles: usize,

    /// Storage alignment in bytes
    #[arg(short, long, default_value_t = DEFAULT_ALIGNMENT)]
    pub alignment: usize,

    /// Strategies to run; repeat or comma-separate
    #[arg(
        short,
        long = "strategy",
        value_delimiter = ',',
        default_values_t = [
            StrategyKind::Baseline,
            StrategyKind::Exclusive,
            StrategyKind::Shared,
            StrategyKind::SeqLock,
        ]
    )]
    pub strategies: Vec<StrategyKind>,

    /// Write all results to this JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Check every block read for tearing and report the count
    #[arg(long)]
    pub verify: bool,
}

/// Validated benchmark configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub num_blocks: usize,
    pub block_sizes: Vec<usize>,
    pub num_readers: usize,
    pub cycles: usize,
    pub alignment: usize,
    pub strategies: Vec<StrategyKind>,
    pub output: Option<PathBuf>,
    pub verify: bool,
}

impl BenchConfig {
    /// Check the parsed arguments and build a configuration.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.cycles < 2 {
            bail!("--cycles must be at least 2, got {}", cli.cycles);
        }
        if cli.block_sizes.is_empty() {
            bail!("at least one --block-size is required");
        }
        if cli.strategies.is_empty() {
            bail!("at least one --strategy is required");
        }
        if let Some(kind) = cli.strategies.iter().find(|k| !k.is_concurrent()) {
            bail!("strategy '{}' cannot be shared between threads", kind);
        }

        let config = Self {
            num_blocks: cli.num_blocks,
            block_sizes: cli.block_sizes,
            num_readers: cli.readers,
            cycles: cli.cycles,
            alignment: cli.alignment,
            strategies: cli.strategies,
            output: cli.output,
            verify: cli.verify,
        };

        for &block_size in &config.block_sizes {
            config.ring_config(block_size).validate::<u64>()?;
        }
        Ok(config)
    }

    /// Ring geometry for one sweep point.
    pub fn ring_config(&self, block_size: usize) -> RingConfig {
        RingConfig::new(self.num_blocks, block_size).with_alignment(self.alignment)
    }

    /// Number of (strategy, block size) runs.
    pub fn total_runs(&self) -> usize {
        self.strategies.len() * self.block_sizes.len()
    }
}
