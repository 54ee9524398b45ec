//! Background job orchestration
//!
//! Ingestion and aggregation runs are queued as independent jobs and
//! executed by a fixed pool of workers. Submission never blocks and never
//! waits for the job: configuration problems are the only errors a submitter
//! sees. Each job runs exactly once on one worker, on Tokio's blocking pool,
//! because every store and log operation inside a run is synchronous.
//!
//! A successful ingestion that inserted rows submits an aggregation job
//! from inside its own run, after its bulk write has committed.

use crate::aggregation::AggregationEngine;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::ingestion::IngestionPipeline;
use crate::store::Database;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
enum Job {
    Ingest(IngestionPipeline),
    Aggregate(AggregationEngine),
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Ingest(_) => "ingestion",
            Job::Aggregate(_) => "aggregation",
        }
    }
}

/// Counters across every job the pool has finished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSummary {
    pub ingestions_succeeded: usize,
    pub ingestions_failed: usize,
    pub aggregations_succeeded: usize,
    pub aggregations_failed: usize,
    pub rows_inserted: usize,
    pub results_written: usize,
    /// Report written by the most recently finished aggregation
    pub latest_report: Option<PathBuf>,
}

struct Inner {
    sender: mpsc::UnboundedSender<Job>,
    pending: AtomicUsize,
    idle: Notify,
    stopped: AtomicBool,
    summary: Mutex<JobSummary>,
    database: Database,
    config: PipelineConfig,
}

/// Handle to a running worker pool; cheap to clone
#[derive(Clone)]
pub struct JobOrchestrator {
    inner: Arc<Inner>,
    workers: Arc<Vec<JoinHandle<()>>>,
}

impl JobOrchestrator {
    /// Spawn `config.workers` workers on the current Tokio runtime
    pub fn start(config: PipelineConfig, database: Database) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let inner = Arc::new(Inner {
            sender,
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
            stopped: AtomicBool::new(false),
            summary: Mutex::new(JobSummary::default()),
            database,
            config,
        });

        let workers = (0..inner.config.workers)
            .map(|id| {
                let inner = Arc::clone(&inner);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(worker_loop(id, inner, receiver))
            })
            .collect();

        info!("Started job orchestrator with {} workers", inner.config.workers);
        Ok(Self {
            inner,
            workers: Arc::new(workers),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Queue an ingestion of `files`; an empty set is rejected before anything is queued
    pub fn submit_ingestion(&self, files: Vec<PathBuf>, trigger: &str) -> Result<()> {
        let pipeline = IngestionPipeline::new(
            files,
            trigger,
            self.inner.database.records(),
            self.inner.config.log_dir.clone(),
        )?;
        self.inner.submit(Job::Ingest(pipeline))
    }

    /// Queue an ingestion of every station file in the configured data directory
    pub fn submit_directory_ingestion(&self, trigger: &str) -> Result<()> {
        let pipeline = IngestionPipeline::from_directory(
            &self.inner.config.data_dir,
            trigger,
            self.inner.database.records(),
            self.inner.config.log_dir.clone(),
        )?;
        self.inner.submit(Job::Ingest(pipeline))
    }

    /// Queue an aggregation run
    pub fn submit_aggregation(&self) -> Result<()> {
        self.inner.submit(Job::Aggregate(self.inner.aggregation_engine()))
    }

    /// Number of jobs queued or running
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Resolve once no job is queued or running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn summary(&self) -> JobSummary {
        match self.inner.summary.lock() {
            Ok(summary) => summary.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stop every worker; queued jobs that have not started are dropped
    ///
    /// Dropped jobs no longer count as pending, so `wait_idle` resolves, and
    /// later submissions fail with `QueueClosed`. A job already on the
    /// blocking pool runs to completion but cannot hand off.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        for worker in self.workers.iter() {
            worker.abort();
        }

        let dropped = self.inner.pending.swap(0, Ordering::SeqCst);
        self.inner.idle.notify_waiters();
        debug!("Job orchestrator shut down, {} queued job(s) dropped", dropped);
    }
}

impl Inner {
    fn aggregation_engine(&self) -> AggregationEngine {
        AggregationEngine::new(
            self.database.records(),
            self.database.results(),
            self.config.log_dir.clone(),
            self.config.results_dir.clone(),
        )
    }

    fn submit(&self, job: Job) -> Result<()> {
        let name = job.name();
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.stopped.load(Ordering::SeqCst) || self.sender.send(job).is_err() {
            self.finish_one();
            return Err(PipelineError::QueueClosed { job: name });
        }
        debug!("Submitted {} job", name);
        Ok(())
    }

    fn execute(&self, job: Job) {
        match job {
            Job::Ingest(pipeline) => {
                let outcome = pipeline.run(|| {
                    if let Err(e) = self.submit(Job::Aggregate(self.aggregation_engine())) {
                        warn!("Aggregation hand-off failed: {}", e);
                    }
                });
                self.record(|summary| match &outcome {
                    Some(stats) => {
                        summary.ingestions_succeeded += 1;
                        summary.rows_inserted += stats.rows_inserted;
                    }
                    None => summary.ingestions_failed += 1,
                });
            }
            Job::Aggregate(engine) => {
                let outcome = engine.run();
                self.record(|summary| match outcome {
                    Some(stats) => {
                        summary.aggregations_succeeded += 1;
                        summary.results_written += stats.results_written;
                        summary.latest_report = Some(stats.report_path);
                    }
                    None => summary.aggregations_failed += 1,
                });
            }
        }
    }

    fn record(&self, update: impl FnOnce(&mut JobSummary)) {
        match self.summary.lock() {
            Ok(mut summary) => update(&mut summary),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }

    fn finish_one(&self) {
        // Already zero when shutdown drained the count first
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.idle.notify_waiters();
        }
    }
}

async fn worker_loop(
    id: usize,
    inner: Arc<Inner>,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<Job>>>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            debug!("Worker {} stopping, queue closed", id);
            break;
        };

        let name = job.name();
        debug!("Worker {} running {} job", id, name);

        let runner = Arc::clone(&inner);
        if let Err(e) = task::spawn_blocking(move || runner.execute(job)).await {
            error!("Worker {} {} job did not complete: {}", id, name, e);
        }

        inner.finish_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn start(temp_dir: &TempDir) -> (JobOrchestrator, Database) {
        let config = PipelineConfig::from_root(temp_dir.path()).with_workers(2);
        let database = Database::open_in_memory().unwrap();
        let orchestrator = JobOrchestrator::start(config, database.clone()).unwrap();
        (orchestrator, database)
    }

    fn write_station(dir: &std::path::Path, station: &str, content: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(format!("{}.txt", station));
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_ingestion_hands_off_to_aggregation() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, database) = start(&temp_dir);
        let file = write_station(temp_dir.path(), "USC00110072", "20120101\t289\t-178\t0\n");

        orchestrator.submit_ingestion(vec![file], "test").unwrap();
        orchestrator.wait_idle().await;

        let summary = orchestrator.summary();
        assert_eq!(summary.ingestions_succeeded, 1);
        assert_eq!(summary.aggregations_succeeded, 1);
        assert_eq!(summary.rows_inserted, 1);
        assert_eq!(summary.results_written, 1);
        assert!(summary.latest_report.is_some());
        assert!(database.results().get("2012USC00110072").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected_synchronously() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);

        let err = orchestrator.submit_ingestion(Vec::new(), "test").unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(orchestrator.pending(), 0);
    }

    #[tokio::test]
    async fn test_missing_data_directory_is_rejected_synchronously() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);

        let err = orchestrator.submit_directory_ingestion("test").unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(orchestrator.pending(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, database) = start(&temp_dir);
        let file = write_station(temp_dir.path(), "USC00110072", "20120101\tbad\t-178\t0\n");

        orchestrator.submit_ingestion(vec![file], "test").unwrap();
        orchestrator.wait_idle().await;

        let summary = orchestrator.summary();
        assert_eq!(summary.ingestions_failed, 1);
        assert_eq!(summary.aggregations_succeeded + summary.aggregations_failed, 0);
        assert_eq!(database.records().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_aggregation_job_on_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);

        orchestrator.submit_aggregation().unwrap();
        orchestrator.wait_idle().await;

        let summary = orchestrator.summary();
        assert_eq!(summary.aggregations_succeeded, 1);
        assert_eq!(summary.results_written, 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_without_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);

        orchestrator.wait_idle().await;
        assert_eq!(orchestrator.summary(), JobSummary::default());
    }

    #[tokio::test]
    async fn test_directory_ingestion_records_trigger() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);
        write_station(
            &orchestrator.config().data_dir,
            "USC00110072",
            "20120101\t289\t-178\t0\n",
        );

        orchestrator.submit_directory_ingestion("nightly").unwrap();
        orchestrator.wait_idle().await;

        let ingestion_log = fs::read_dir(&orchestrator.config().log_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .find(|path| path.file_name().unwrap().to_string_lossy().starts_with("ingestion_"))
            .unwrap();
        let content = fs::read_to_string(ingestion_log).unwrap();
        assert!(content.contains("Ingestion type: nightly"));
        assert!(!content.contains("Ingestion type: batch"));
    }

    #[tokio::test]
    async fn test_shutdown_drops_queued_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let (orchestrator, _database) = start(&temp_dir);

        // Workers cannot run before the first await on this single-threaded runtime
        orchestrator.submit_aggregation().unwrap();
        orchestrator.submit_aggregation().unwrap();
        assert_eq!(orchestrator.pending(), 2);

        orchestrator.shutdown();
        orchestrator.wait_idle().await;

        assert_eq!(orchestrator.pending(), 0);
        let err = orchestrator.submit_aggregation().unwrap_err();
        assert!(matches!(err, PipelineError::QueueClosed { job: "aggregation" }));
        assert_eq!(orchestrator.pending(), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::from_root(temp_dir.path()).with_workers(0);
        let database = Database::open_in_memory().unwrap();

        // Validation fails before any worker is spawned, so no runtime is needed
        assert!(JobOrchestrator::start(config, database).is_err());
    }
}
