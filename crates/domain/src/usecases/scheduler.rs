//! In-process scheduler for deferred publish jobs
//!
//! A timing task sleeps until the earliest deadline (bounded by `max_idle`,
//! woken early by new submissions), re-checks the clock and hands every due
//! job to an executor task that appends log entries in order. Nothing here is
//! durable: jobs still queued when the process exits are lost.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    model::{LogEntry, PublishJob},
    ports::{Clock, EventLog},
};

/// Configuration for the job scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Longest the timing task sleeps before re-reading the clock
    pub max_idle: Duration,
}

impl SchedulerConfig {
    /// Floor for `max_idle`; a zero idle interval would spin the timing task
    pub const MIN_IDLE: Duration = Duration::from_millis(10);
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_idle: Duration::from_secs(1),
        }
    }
}

/// A scheduled job whose log entry could not be written
#[derive(Debug, Clone)]
pub struct FireFailure {
    pub job_id: Uuid,
    pub error: String,
}

struct QueuedJob {
    scheduled_at: OffsetDateTime,
    sequence: u64,
    job: PublishJob,
}

impl QueuedJob {
    fn key(&self) -> (OffsetDateTime, u64) {
        (self.scheduled_at, self.sequence)
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

struct SchedulerState {
    queue: Mutex<BinaryHeap<Reverse<QueuedJob>>>,
    failures: Mutex<Vec<FireFailure>>,
    sequence: AtomicU64,
    /// Jobs accepted but not yet logged (queued, handed off, or appending)
    outstanding: AtomicUsize,
    wake: Notify,
    idle: Notify,
    log: Arc<dyn EventLog>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

struct Running {
    stop: watch::Sender<bool>,
    timer: JoinHandle<()>,
    executor: JoinHandle<()>,
}

/// Timer-driven executor for `Scheduled` jobs, with an explicit start/stop lifecycle
pub struct JobScheduler {
    state: Arc<SchedulerState>,
    running: tokio::sync::Mutex<Option<Running>>,
}

impl JobScheduler {
    pub fn new(log: Arc<dyn EventLog>, clock: Arc<dyn Clock>, mut config: SchedulerConfig) -> Self {
        if config.max_idle < SchedulerConfig::MIN_IDLE {
            tracing::warn!(
                max_idle_ms = config.max_idle.as_millis() as u64,
                min_ms = SchedulerConfig::MIN_IDLE.as_millis() as u64,
                "Scheduler idle interval too small, raising to the minimum"
            );
            config.max_idle = SchedulerConfig::MIN_IDLE;
        }

        Self {
            state: Arc::new(SchedulerState {
                queue: Mutex::new(BinaryHeap::new()),
                failures: Mutex::new(Vec::new()),
                sequence: AtomicU64::new(0),
                outstanding: AtomicUsize::new(0),
                wake: Notify::new(),
                idle: Notify::new(),
                log,
                clock,
                config,
            }),
            running: tokio::sync::Mutex::new(None),
        }
    }

    /// Spawn the timing and executor tasks; a no-op when already running
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (job_tx, job_rx) = mpsc::unbounded_channel();

        let timer = tokio::spawn(run_timer(Arc::clone(&self.state), job_tx, stop_rx));
        let executor = tokio::spawn(run_executor(Arc::clone(&self.state), job_rx));

        tracing::info!(
            pending = self.pending_count(),
            max_idle_ms = self.state.config.max_idle.as_millis() as u64,
            "Scheduler started"
        );

        *running = Some(Running {
            stop: stop_tx,
            timer,
            executor,
        });
    }

    /// Stop both tasks and return how many jobs never fired
    ///
    /// Jobs already due are still logged before this returns. The rest stay
    /// queued in memory, so a later `start` resumes them, but they are lost if
    /// the process exits.
    pub async fn stop(&self) -> usize {
        let Some(running) = self.running.lock().await.take() else {
            return self.pending_count();
        };

        let _ = running.stop.send(true);
        if let Err(e) = running.timer.await {
            tracing::error!(error = %e, "Scheduler timer task failed");
        }
        if let Err(e) = running.executor.await {
            tracing::error!(error = %e, "Scheduler executor task failed");
        }

        let lost = self.pending_count();
        if lost > 0 {
            tracing::warn!(
                pending = lost,
                "Scheduler stopped with jobs that have not fired; they are not persisted and will be lost on exit"
            );
        } else {
            tracing::info!("Scheduler stopped");
        }
        lost
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Queue a job for execution at its `scheduled_at`
    pub fn schedule(&self, job: PublishJob) {
        let scheduled_at = job.scheduled_at.unwrap_or_else(|| self.state.clock.now());
        let sequence = self.state.sequence.fetch_add(1, AtomicOrdering::SeqCst);

        tracing::info!(
            job_id = %job.id,
            scheduled_at = %scheduled_at,
            "Job scheduled"
        );

        self.state.outstanding.fetch_add(1, AtomicOrdering::SeqCst);
        lock(&self.state.queue).push(Reverse(QueuedJob {
            scheduled_at,
            sequence,
            job,
        }));
        self.state.wake.notify_one();
    }

    /// Jobs not yet handed to the executor, earliest first
    pub fn pending(&self) -> Vec<PublishJob> {
        let queue = lock(&self.state.queue);
        let mut jobs: Vec<&QueuedJob> = queue.iter().map(|Reverse(q)| q).collect();
        jobs.sort();
        jobs.into_iter().map(|q| q.job.clone()).collect()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.state.queue).len()
    }

    pub fn is_pending(&self, job_id: &Uuid) -> bool {
        lock(&self.state.queue)
            .iter()
            .any(|Reverse(q)| &q.job.id == job_id)
    }

    /// Scheduled jobs whose log entry failed to persist
    pub fn failures(&self) -> Vec<FireFailure> {
        lock(&self.state.failures).clone()
    }

    /// Resolve once every accepted job has been executed and logged
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            if self.state.outstanding.load(AtomicOrdering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SchedulerState {
    /// Pop every job whose deadline has passed, in firing order
    fn take_due(&self, now: OffsetDateTime) -> Vec<PublishJob> {
        let mut queue = lock(&self.queue);
        let mut due = Vec::new();
        while queue
            .peek()
            .is_some_and(|Reverse(next)| next.scheduled_at <= now)
        {
            if let Some(Reverse(next)) = queue.pop() {
                due.push(next.job);
            }
        }
        due
    }

    fn next_wait(&self, now: OffsetDateTime) -> Duration {
        let queue = lock(&self.queue);
        match queue.peek() {
            Some(Reverse(next)) => Duration::try_from(next.scheduled_at - now)
                .unwrap_or(Duration::ZERO)
                .min(self.config.max_idle),
            None => self.config.max_idle,
        }
    }

    async fn execute(&self, job: PublishJob) {
        let executed_at = self.clock.now();
        let entry = LogEntry::executed(&job, executed_at);

        match self.log.append(&entry).await {
            Ok(()) => {
                tracing::info!(
                    job_id = %job.id,
                    executed_at = %executed_at,
                    "Scheduled job executed"
                );
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    error = %e,
                    "Failed to log scheduled job; publish did not complete"
                );
                lock(&self.failures).push(FireFailure {
                    job_id: job.id,
                    error: e.to_string(),
                });
            }
        }

        if self.outstanding.fetch_sub(1, AtomicOrdering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

async fn run_timer(
    state: Arc<SchedulerState>,
    jobs: mpsc::UnboundedSender<PublishJob>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let now = state.clock.now();
        for job in state.take_due(now) {
            tracing::debug!(job_id = %job.id, "Job due");
            if jobs.send(job).is_err() {
                tracing::error!("Scheduler executor is gone");
                return;
            }
        }

        let wait = state.next_wait(now);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = state.wake.notified() => {}
            _ = stop.changed() => break,
        }
    }
}

async fn run_executor(state: Arc<SchedulerState>, mut jobs: mpsc::UnboundedReceiver<PublishJob>) {
    while let Some(job) = jobs.recv().await {
        state.execute(job).await;
    }
}
