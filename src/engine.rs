//! Detection Loop
//!
//! Runs the per-tick pipeline on one background worker:
//!
//! ```text
//! SignalSource ──► log + chart ──► SigmaDetector.record
//!                                      │
//!            sample > threshold ──► Classifier ──► event history + log
//!                                      │
//!            window ready ──────► SigmaDetector.scan ──► anomaly log lines
//! ```
//!
//! The loop is either Stopped or Running. `start` and `stop` are idempotent
//! and may be called from any thread; the worker wakes from its inter-tick
//! wait as soon as it is cancelled.

use crate::algo::SigmaDetector;
use crate::classifier::Classifier;
use crate::config::{DetectorConfig, MAX_SAMPLE};
use crate::error::Result;
use crate::metrics;
use crate::shell::Presenter;
use crate::simulation::{SignalSource, UniformActivity};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const STARTED_LINE: &str = "INTRUDER DETECTION SYSTEM STARTED";
pub const STOPPED_LINE: &str = "INTRUDER DETECTION SYSTEM STOPPED";

pub type SourceFactory = Arc<dyn Fn() -> Box<dyn SignalSource> + Send + Sync>;

/// Lifecycle of a [`DetectionLoop`].
pub enum RunState {
    Stopped,
    Running(ActiveRun),
}

/// Handles of the worker owned by a running loop.
pub struct ActiveRun {
    run_id: Uuid,
    cancel_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Start/stop controller for the detection worker.
pub struct DetectionLoop {
    config: DetectorConfig,
    presenter: Arc<dyn Presenter>,
    source_factory: SourceFactory,
    state: Mutex<RunState>,

    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    active_workers: Arc<AtomicUsize>,
}

impl DetectionLoop {
    pub fn new(config: DetectorConfig, presenter: Arc<dyn Presenter>) -> Result<Self> {
        config.validate()?;

        let seed = config.seed;
        let source_factory: SourceFactory = Arc::new(move || -> Box<dyn SignalSource> {
            match seed {
                Some(seed) => Box::new(UniformActivity::seeded(seed)),
                None => Box::new(UniformActivity::new()),
            }
        });

        Ok(Self {
            config,
            presenter,
            source_factory,
            state: Mutex::new(RunState::Stopped),
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Replace the signal source. The factory is called once per run.
    pub fn with_source_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SignalSource> + Send + Sync + 'static,
    {
        self.source_factory = Arc::new(factory);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Start a fresh run. Returns `Ok(false)` if a run is already active.
    pub fn start(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if matches!(*state, RunState::Running(_)) {
            if self.running.load(Ordering::SeqCst) {
                debug!("Start ignored: detection loop already running");
                return Ok(false);
            }
            // The worker released its guard without being stopped; reap it first.
            if let RunState::Running(dead) = std::mem::replace(&mut *state, RunState::Stopped) {
                if dead.handle.join().is_err() {
                    warn!(run_id = %dead.run_id, "Detection worker panicked");
                }
            }
        }

        let run_id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        self.ticks.store(0, Ordering::SeqCst);

        let worker = Worker {
            run_id,
            threshold: self.config.activity_threshold,
            interval: self.config.tick_interval(),
            source: (self.source_factory)(),
            classifier: match self.config.seed {
                Some(seed) => Classifier::seeded(seed.wrapping_add(1)),
                None => Classifier::new(),
            },
            detector: SigmaDetector::new(
                self.config.window_size,
                self.config.window_policy,
                self.config.sigma_multiplier,
            ),
            presenter: Arc::clone(&self.presenter),
            ticks: Arc::clone(&self.ticks),
            cancel_rx,
        };

        // Dropped by the worker on exit, normal or not; dropped here if the spawn fails.
        let guard = WorkerGuard::enter(&self.active_workers, &self.running);
        let handle = match thread::Builder::new()
            .name("ids-detector".into())
            .spawn(move || worker.run(guard))
        {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Failed to spawn detection worker");
                return Err(e.into());
            }
        };

        info!(
            run_id = %run_id,
            interval_ms = self.config.tick_interval_ms,
            window_size = self.config.window_size,
            threshold = self.config.activity_threshold,
            "Detection loop started"
        );

        *state = RunState::Running(ActiveRun {
            run_id,
            cancel_tx,
            handle,
        });
        Ok(true)
    }

    /// Cancel the active run and wait for the worker to exit.
    /// Returns `false` if the loop was not running.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        let run = match std::mem::replace(&mut *state, RunState::Stopped) {
            RunState::Running(run) => run,
            RunState::Stopped => {
                debug!("Stop ignored: detection loop not running");
                return false;
            }
        };

        // Buffer of one; a second signal is never needed.
        let _ = run.cancel_tx.try_send(());
        if run.handle.join().is_err() {
            warn!(run_id = %run.run_id, "Detection worker panicked");
        }

        self.presenter.log(STOPPED_LINE);
        info!(
            run_id = %run.run_id,
            ticks = self.ticks.load(Ordering::SeqCst),
            "Detection loop stopped"
        );
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks executed by the current (or most recent) run.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    pub fn run_id(&self) -> Option<Uuid> {
        match &*self.state.lock() {
            RunState::Running(run) => Some(run.run_id),
            RunState::Stopped => None,
        }
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

// --- Worker ---

struct Worker {
    run_id: Uuid,
    threshold: u8,
    interval: std::time::Duration,
    source: Box<dyn SignalSource>,
    classifier: Classifier,
    detector: SigmaDetector,
    presenter: Arc<dyn Presenter>,
    ticks: Arc<AtomicU64>,
    cancel_rx: Receiver<()>,
}

/// Counts a live worker. Released on drop, so a panicking tick still
/// clears the running flag and the worker count.
struct WorkerGuard {
    active_workers: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl WorkerGuard {
    fn enter(active_workers: &Arc<AtomicUsize>, running: &Arc<AtomicBool>) -> Self {
        active_workers.fetch_add(1, Ordering::SeqCst);
        running.store(true, Ordering::SeqCst);
        Self {
            active_workers: Arc::clone(active_workers),
            running: Arc::clone(running),
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Worker {
    fn run(mut self, _guard: WorkerGuard) {
        let span = tracing::info_span!("detection_run", run_id = %self.run_id);
        let _enter = span.enter();
        debug!(source = self.source.name(), "Detection worker active");

        // Logged from the worker so it only appears for a run that exists
        // and always precedes the first tick.
        self.presenter.log(STARTED_LINE);

        loop {
            match self.cancel_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => break,
            }

            self.tick();

            match self.cancel_rx.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        }

        debug!("Detection worker exited");
    }

    fn tick(&mut self) {
        let sample = self.source.next_sample().min(MAX_SAMPLE);

        self.presenter.log(&format!("Current Traffic: {}", sample));
        self.presenter.record_sample(sample);
        self.detector.record(sample);

        if sample > self.threshold {
            let intrusion = self.classifier.classify();
            metrics::INTRUSIONS_TOTAL.inc();
            warn!(
                sample,
                kind = %intrusion.kind(),
                severity = intrusion.severity(),
                "Intrusion detected"
            );
            self.presenter.record_event(&intrusion);
            self.presenter.log(&intrusion.alert_line());
        }

        if self.detector.is_ready() {
            for finding in self.detector.scan() {
                metrics::ANOMALIES_TOTAL.inc();
                info!(
                    value = finding.value,
                    threshold = finding.threshold,
                    "Anomalous activity level"
                );
                self.presenter.log(&finding.log_line());
            }
        }

        metrics::TICKS_TOTAL.inc();
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}
