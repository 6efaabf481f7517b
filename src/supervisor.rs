//! Worker pool and scan supervisor
//!
//! The supervisor is the single coordinator: it materializes batches of
//! candidate scalars, dispatches them over a bounded channel (the bound is
//! the in-flight backpressure limit), drains worker results, persists
//! matches and folds counts into the shared stats. Workers only read the
//! target set and push outcomes back; the batch controller is owned by the
//! supervisor alone.
//!
//! Lifecycle: `Running -> Draining -> Stopped`. A shutdown signal stops
//! batch submission; queued batches complete (workers cut the candidate
//! loop at sub-batch granularity so shutdown latency is bounded), their
//! matches are flushed, the pool is joined and final stats are reported
//! exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::address;
use crate::batch::BatchController;
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::keygen::{CandidateGenerator, KeySource};
use crate::mem;
use crate::sink::{FoundRecord, ResultSink};
use crate::stats::{Stats, ThroughputMeter};
use crate::targets::TargetSet;

/// Candidates processed between shutdown checks inside a worker.
const SUB_BATCH: usize = 1024;

/// Flush attempts on the drain path before giving up with a warning.
const DRAIN_FLUSH_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Draining,
    Stopped,
}

/// Cancellation hook handed to the hosting process (signal handlers,
/// tests). Triggering it moves the supervisor into Draining.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One unit of dispatched work, owned by a single worker at a time.
struct Batch {
    scalars: Vec<[u8; 32]>,
}

struct MatchHit {
    scalar: [u8; 32],
    hash: [u8; 20],
    balance: u64,
}

struct BatchOutcome {
    checked: u64,
    hits: Vec<MatchHit>,
}

/// Aggregate result of a completed run, produced once.
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub checked: u64,
    pub found: u64,
    pub elapsed: Duration,
    pub average_rate: f64,
    /// Set when the drain-path flush failed after bounded retries.
    pub sink_warning: Option<String>,
}

pub struct Supervisor<S: KeySource> {
    cfg: ScanConfig,
    generator: CandidateGenerator<S>,
    targets: Arc<TargetSet>,
    sink: ResultSink,
    stats: Arc<Stats>,
    shutdown: Arc<AtomicBool>,
    state: RunState,
}

impl<S: KeySource> Supervisor<S> {
    pub fn new(
        cfg: ScanConfig,
        source: S,
        targets: Arc<TargetSet>,
        sink: ResultSink,
    ) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            generator: CandidateGenerator::new(source),
            targets,
            sink,
            stats: Arc::new(Stats::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            state: RunState::Running,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the scan until shutdown or an optional budget is exhausted.
    pub fn run(&mut self) -> Result<FinalReport> {
        let start = Instant::now();
        let (task_tx, task_rx) = bounded::<Batch>(self.cfg.inflight_limit);
        let (result_tx, result_rx) = bounded::<BatchOutcome>(self.cfg.inflight_limit.max(1));

        let handles: Vec<JoinHandle<()>> = (0..self.cfg.workers)
            .map(|_| {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let targets = Arc::clone(&self.targets);
                let shutdown = Arc::clone(&self.shutdown);
                thread::spawn(move || worker_loop(task_rx, result_tx, targets, shutdown))
            })
            .collect();
        // workers hold the only task receivers and result senders
        drop(task_rx);
        drop(result_tx);

        let mut warning = None;
        let feed_result = self.feed(&task_tx, &result_rx, start);

        self.state = RunState::Draining;
        if feed_result.is_err() {
            // fatal mid-run: tell workers to cut their batches short
            self.shutdown.store(true, Ordering::SeqCst);
        }

        // No new batches; queued ones drain through the pool.
        drop(task_tx);
        while let Ok(outcome) = result_rx.recv() {
            if let Err(e) = self.process_outcome(outcome) {
                warning.get_or_insert_with(|| e.to_string());
            }
        }
        for handle in handles {
            let _ = handle.join();
        }
        if let Err(e) = self.sink.flush_with_retries(DRAIN_FLUSH_RETRIES) {
            warning.get_or_insert_with(|| e.to_string());
        }

        self.state = RunState::Stopped;
        feed_result?;

        let snap = self.stats.snapshot();
        let elapsed = start.elapsed();
        let secs = elapsed.as_secs_f64();
        Ok(FinalReport {
            checked: snap.checked,
            found: snap.found,
            elapsed,
            average_rate: if secs > 0.0 { snap.checked as f64 / secs } else { 0.0 },
            sink_warning: warning,
        })
    }

    /// The Running phase: dispatch batches until shutdown or budget.
    fn feed(
        &self,
        task_tx: &Sender<Batch>,
        result_rx: &Receiver<BatchOutcome>,
        start: Instant,
    ) -> Result<()> {
        let mut controller = BatchController::new(&self.cfg);
        let mut meter = ThroughputMeter::new();
        let mut dispatched: u64 = 0;
        let mut last_report = Instant::now();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }
            if let Some(budget) = self.cfg.max_runtime {
                if start.elapsed() >= budget {
                    return Ok(());
                }
            }
            let mut size = controller.current();
            if let Some(max) = self.cfg.max_keys {
                let remaining = max.saturating_sub(dispatched);
                if remaining == 0 {
                    return Ok(());
                }
                size = size.min(remaining as usize);
            }

            let mut batch = self.materialize(size)?;
            dispatched += batch.scalars.len() as u64;

            // Bounded backpressure: with the in-flight limit reached, drain
            // results instead of queueing more work.
            loop {
                match task_tx.try_send(batch) {
                    Ok(()) => break,
                    Err(TrySendError::Full(b)) => {
                        batch = b;
                        self.drain_ready(result_rx)?;
                        if self.shutdown.load(Ordering::Relaxed) {
                            return Ok(());
                        }
                        thread::sleep(Duration::from_millis(2));
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        return Err(ScanError::Pool("all workers exited".into()));
                    }
                }
            }

            self.drain_ready(result_rx)?;

            if last_report.elapsed() >= self.cfg.stats_interval {
                let snap = self.stats.snapshot();
                let rate = meter.tick(snap.checked);
                if let Some(new_size) = controller.update(rate, mem::available_fraction()) {
                    println!("[*] Batch size -> {}", new_size);
                }
                println!(
                    "[*] {:>12.0} keys/s | checked {} | found {} | batch {}",
                    rate,
                    snap.checked,
                    snap.found,
                    controller.current()
                );
                last_report = Instant::now();
            }
        }
    }

    fn materialize(&self, size: usize) -> Result<Batch> {
        let mut scalars = Vec::with_capacity(size);
        for _ in 0..size {
            scalars.push(self.generator.next_scalar()?);
        }
        Ok(Batch { scalars })
    }

    fn drain_ready(&self, result_rx: &Receiver<BatchOutcome>) -> Result<()> {
        while let Ok(outcome) = result_rx.try_recv() {
            self.process_outcome(outcome)?;
        }
        Ok(())
    }

    /// Persist matches, then publish counts. The sink write happens before
    /// the found counter moves, so visible statistics never run ahead of
    /// the durable log.
    fn process_outcome(&self, outcome: BatchOutcome) -> Result<()> {
        let mut first_err = None;
        for hit in &outcome.hits {
            let record = FoundRecord::new(
                address::address_from_hash160(&hit.hash),
                address::to_wif(&hit.scalar),
                hit.balance,
            );
            match self.sink.append(&record) {
                Ok(()) => {
                    self.stats.record_found();
                    println!(
                        "\n[✓] Found: {} | Balance: {} sat",
                        record.address, record.balance
                    );
                }
                // a match that never became durable is never counted
                Err(e) => {
                    let _ = first_err.get_or_insert(e);
                }
            }
        }
        // processed-candidate counts are accurate even when the sink fails
        self.stats.add_checked(outcome.checked);
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn worker_loop(
    task_rx: Receiver<Batch>,
    result_tx: Sender<BatchOutcome>,
    targets: Arc<TargetSet>,
    shutdown: Arc<AtomicBool>,
) {
    while let Ok(batch) = task_rx.recv() {
        let mut outcome = BatchOutcome {
            checked: 0,
            hits: Vec::new(),
        };
        'scan: for chunk in batch.scalars.chunks(SUB_BATCH) {
            if shutdown.load(Ordering::Relaxed) {
                break 'scan;
            }
            for scalar in chunk {
                // derivation failure yields no result for the candidate
                if let Some(hash) = address::derive_hash160(scalar) {
                    if let Some(balance) = targets.balance(&hash) {
                        outcome.hits.push(MatchHit {
                            scalar: *scalar,
                            hash,
                            balance,
                        });
                    }
                }
                outcome.checked += 1;
            }
        }
        // Completed (or cut-short) work is always reported so nothing
        // found so far can be dropped.
        if result_tx.send(outcome).is_err() {
            break;
        }
    }
}
