//! One writer thread and N reader threads hammering a single ring.
//!
//! All threads rendezvous on a barrier after setup so that timing starts
//! together. Each call is timed on its own and the per-thread mean is
//! reported in nanoseconds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use blockring::{
    Baseline, ExclusiveLock, RingBuffer, RingConfig, RingReader, SeqLock, SharedLock,
    StrategyKind, SyncStrategy,
};
use instant::Instant;
use log::{debug, info};

/// Value the ring holds before the first write.
pub const FILL_VALUE: u64 = 12345;

/// Parameters of a single run.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub ring: RingConfig,
    pub num_readers: usize,
    pub cycles: usize,
    pub verify: bool,
}

/// Timings of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Mean write latency, ns.
    pub writer_ns: f64,
    /// Mean read latency per reader, ns.
    pub readers_ns: Vec<f64>,
    /// Accepted blocks that mixed two writes (only counted with `verify`).
    pub torn_reads: u64,
}

/// Run `kind` with `params`.
pub fn run(kind: StrategyKind, params: &RunParams) -> Result<RunResult> {
    match kind {
        StrategyKind::Baseline => run_with::<Baseline<u64>>(params),
        StrategyKind::Exclusive => run_with::<ExclusiveLock<u64>>(params),
        StrategyKind::Shared => run_with::<SharedLock<u64>>(params),
        StrategyKind::SeqLock => run_with::<SeqLock<u64>>(params),
        StrategyKind::Unsynchronized => Err(anyhow!(
            "strategy '{}' cannot be shared between threads",
            kind
        )),
    }
}

fn run_with<S>(params: &RunParams) -> Result<RunResult>
where
    S: SyncStrategy<u64> + Send + Sync + 'static,
{
    let mut ring = RingBuffer::<u64, S>::new(params.ring)
        .with_context(|| format!("failed to build {} ring", S::KIND))?;
    ring.fill(FILL_VALUE);
    debug!("Running {:?} with {:?}", ring, params);

    let gate = Arc::new(StartGate::default());
    let barrier = Arc::new(Barrier::new(params.num_readers + 1));
    let torn = Arc::new(AtomicU64::new(0));

    let mut readers = Vec::with_capacity(params.num_readers);
    for index in 0..params.num_readers {
        let reader = ring.reader();
        let reader_gate = Arc::clone(&gate);
        let barrier = Arc::clone(&barrier);
        let torn = Arc::clone(&torn);
        let params = *params;
        let spawned = thread::Builder::new()
            .name(format!("reader-{}", index))
            .spawn(move || reader_loop(reader, index, &params, &reader_gate, &barrier, &torn));
        match spawned {
            Ok(handle) => readers.push(handle),
            Err(err) => {
                abort_spawned(&gate, readers);
                return Err(err).context("failed to spawn reader thread");
            }
        }
    }

    let writer = {
        let writer_gate = Arc::clone(&gate);
        let barrier = Arc::clone(&barrier);
        let cycles = params.cycles;
        let spawned = thread::Builder::new()
            .name("writer".into())
            .spawn(move || writer_loop(ring, cycles, &writer_gate, &barrier));
        match spawned {
            Ok(handle) => handle,
            Err(err) => {
                abort_spawned(&gate, readers);
                return Err(err).context("failed to spawn writer thread");
            }
        }
    };

    // Every participant of the barrier exists now.
    gate.open(true);

    let writer_ns = writer
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))??;
    let readers_ns = readers
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("reader thread panicked"))?
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RunResult {
        writer_ns,
        readers_ns,
        torn_reads: torn.load(Ordering::Relaxed),
    })
}

/// Release threads parked on a gate that will never be followed by a full
/// barrier, and wait for them to exit.
fn abort_spawned<R>(gate: &StartGate, handles: Vec<JoinHandle<R>>) {
    gate.open(false);
    for handle in handles {
        let _ = handle.join();
    }
}

/// One-shot start signal raised by the spawning thread.
///
/// Threads park here until every thread of the run has been spawned, so that
/// the barrier behind it is only entered once it can complete.
#[derive(Debug, Default)]
struct StartGate {
    state: Mutex<Option<bool>>,
    opened: Condvar,
}

impl StartGate {
    /// Let waiting threads through; `go == false` tells them to bail out.
    fn open(&self, go: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = Some(go);
        self.opened.notify_all();
    }

    /// Block until opened. Returns whether the run goes ahead.
    fn wait(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self
            .opened
            .wait_while(state, |state| state.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        *state == Some(true)
    }
}

/// Writes values `0, 1, 2, ...`, one per block. The first write happens
/// before the barrier and is not timed.
fn writer_loop<S: SyncStrategy<u64>>(
    mut ring: RingBuffer<u64, S>,
    cycles: usize,
    gate: &StartGate,
    barrier: &Barrier,
) -> Result<f64> {
    info!("Writer starts");

    let mut value = 0u64;
    let mut src = vec![value; ring.block_size()];
    ring.write(&src)?;
    value += 1;

    if !gate.wait() {
        bail!("writer aborted before start");
    }
    barrier.wait();

    let mut total_ns = 0u128;
    for _ in 1..cycles {
        src.fill(value);
        value += 1;
        let t0 = Instant::now();
        ring.write(&src)?;
        total_ns += t0.elapsed().as_nanos();
    }

    let mean = total_ns as f64 / (cycles - 1) as f64;
    info!("Writer terminates. Write time, ns: {:.1}", mean);
    Ok(mean)
}

/// Reads `cycles` blocks, walking the ring from offset 0.
fn reader_loop<S: SyncStrategy<u64>>(
    reader: RingReader<u64, S>,
    index: usize,
    params: &RunParams,
    gate: &StartGate,
    barrier: &Barrier,
    torn: &AtomicU64,
) -> Result<f64> {
    info!("Reader {} starts", index);

    let block_size = reader.block_size();
    let capacity = reader.size();
    let mut dst = vec![0u64; block_size];
    let mut offset = 0;
    let mut torn_here = 0u64;

    if !gate.wait() {
        bail!("reader {} aborted before start", index);
    }
    barrier.wait();

    let mut total_ns = 0u128;
    for _ in 0..params.cycles {
        let t0 = Instant::now();
        reader.read(&mut dst, offset)?;
        total_ns += t0.elapsed().as_nanos();

        if params.verify && !is_uniform(&dst) {
            torn_here += 1;
        }
        offset = (offset + block_size) % capacity;
    }

    if torn_here > 0 {
        torn.fetch_add(torn_here, Ordering::Relaxed);
    }

    let mean = total_ns as f64 / params.cycles as f64;
    info!("Reader {} terminates. Read time, ns: {:.1}", index, mean);
    Ok(mean)
}

/// Every write fills its block with one value.
fn is_uniform(block: &[u64]) -> bool {
    block.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(verify: bool) -> RunParams {
        RunParams {
            ring: RingConfig::new(4, 8),
            num_readers: 2,
            cycles: 2_000,
            verify,
        }
    }

    #[test]
    fn test_run_reports_every_thread() {
        for kind in [
            StrategyKind::Baseline,
            StrategyKind::Exclusive,
            StrategyKind::Shared,
            StrategyKind::SeqLock,
        ] {
            let result = run(kind, &small(false)).unwrap();
            assert_eq!(result.readers_ns.len(), 2, "{}", kind);
            assert!(result.writer_ns >= 0.0);
            assert!(result.readers_ns.iter().all(|&ns| ns >= 0.0));
            assert_eq!(result.torn_reads, 0);
        }
    }

    #[test]
    fn test_verified_runs_see_no_tearing() {
        for kind in [StrategyKind::Exclusive, StrategyKind::Shared, StrategyKind::SeqLock] {
            let result = run(kind, &small(true)).unwrap();
            assert_eq!(result.torn_reads, 0, "{}", kind);
        }
    }

    #[test]
    fn test_zero_readers() {
        let params = RunParams {
            num_readers: 0,
            ..small(false)
        };
        let result = run(StrategyKind::SeqLock, &params).unwrap();
        assert!(result.readers_ns.is_empty());
    }

    #[test]
    fn test_unsynchronized_is_rejected() {
        assert!(run(StrategyKind::Unsynchronized, &small(false)).is_err());
    }

    #[test]
    fn test_bad_geometry_is_reported() {
        let params = RunParams {
            ring: RingConfig::new(0, 8),
            ..small(false)
        };
        let err = run(StrategyKind::Exclusive, &params).unwrap_err();
        assert!(format!("{:#}", err).contains("at least one block"));
    }

    #[test]
    fn test_aborted_gate_releases_spawned_threads() {
        let ring =
            RingBuffer::<u64, SeqLock<u64>>::new(RingConfig::new(4, 8)).unwrap();
        let gate = Arc::new(StartGate::default());
        // Sized for a writer that never gets spawned.
        let barrier = Arc::new(Barrier::new(3));
        let torn = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..2)
            .map(|index| {
                let reader = ring.reader();
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                let torn = Arc::clone(&torn);
                let params = small(false);
                thread::spawn(move || {
                    reader_loop(reader, index, &params, &gate, &barrier, &torn)
                })
            })
            .collect();

        // Returns only once every parked reader has exited.
        abort_spawned(&gate, handles);

        let late = {
            let reader = ring.reader();
            let params = small(false);
            thread::spawn(move || reader_loop(reader, 2, &params, &gate, &barrier, &torn))
        };
        let err = late.join().unwrap().unwrap_err();
        assert!(err.to_string().contains("aborted before start"));
    }

    #[test]
    fn test_gate_reports_abort_to_waiters() {
        let gate = Arc::new(StartGate::default());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait())
        };
        gate.open(false);
        assert!(!waiter.join().unwrap());

        let gate = StartGate::default();
        gate.open(true);
        assert!(gate.wait());
    }

    #[test]
    fn test_is_uniform() {
        assert!(is_uniform(&[3, 3, 3]));
        assert!(is_uniform(&[]));
        assert!(!is_uniform(&[3, 3, 4]));
    }
}
