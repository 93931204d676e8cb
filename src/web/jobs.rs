// src/web/jobs.rs
//! In-memory registry of background batch jobs. Nothing survives a restart,
//! and only the most recent finished jobs are retained.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::types::{BatchStatusData, JobStatus};
use crate::discovery::BatchProgress;
use crate::types::ResultRow;

pub struct BatchJob {
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    pub resolved: usize,
    pub rows: Vec<ResultRow>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancel: Arc<AtomicBool>,
}

const DEFAULT_RETAINED_JOBS: usize = 100;

pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, BatchJob>>,
    retained: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retained` finished jobs; running jobs are never evicted.
    pub fn with_retention(retained: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retained,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, BatchJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new running job and hand back its id and stop flag.
    pub fn create(&self, total: usize) -> (Uuid, Arc<AtomicBool>) {
        let id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        self.lock().insert(
            id,
            BatchJob {
                status: JobStatus::Running,
                processed: 0,
                total,
                resolved: 0,
                rows: Vec::new(),
                started_at: Utc::now(),
                finished_at: None,
                cancel: cancel.clone(),
            },
        );
        (id, cancel)
    }

    pub fn record_progress(&self, id: Uuid, progress: &BatchProgress) {
        if let Some(job) = self.lock().get_mut(&id) {
            job.processed = progress.processed;
            if progress.resolved {
                job.resolved += 1;
            }
        }
    }

    /// A job counts as cancelled only when some company was left unprocessed.
    pub fn finish(&self, id: Uuid, rows: Vec<ResultRow>) {
        let mut jobs = self.lock();
        if let Some(job) = jobs.get_mut(&id) {
            job.status = if rows.iter().any(ResultRow::is_cancelled) {
                JobStatus::Cancelled
            } else {
                JobStatus::Completed
            };
            job.processed = rows.len();
            job.resolved = rows.iter().filter(|r| r.is_resolved()).count();
            job.rows = rows;
            job.finished_at = Some(Utc::now());
        }
        Self::evict_finished(&mut jobs, self.retained);
    }

    fn evict_finished(jobs: &mut HashMap<Uuid, BatchJob>, retained: usize) {
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
            .iter()
            .filter_map(|(id, job)| job.finished_at.map(|at| (at, *id)))
            .collect();
        if finished.len() <= retained {
            return;
        }

        finished.sort();
        let excess = finished.len() - retained;
        for (_, id) in finished.into_iter().take(excess) {
            jobs.remove(&id);
        }
    }

    /// Raise the stop flag. `None` when the job is unknown.
    pub fn cancel(&self, id: Uuid) -> Option<JobStatus> {
        let jobs = self.lock();
        let job = jobs.get(&id)?;
        if job.status == JobStatus::Running {
            job.cancel.store(true, Ordering::SeqCst);
        }
        Some(job.status)
    }

    pub fn status(&self, id: Uuid, include_rows: bool) -> Option<BatchStatusData> {
        let jobs = self.lock();
        let job = jobs.get(&id)?;
        Some(BatchStatusData {
            job_id: id,
            status: job.status,
            processed: job.processed,
            total: job.total,
            resolved: job.resolved,
            started_at: job.started_at,
            finished_at: job.finished_at,
            rows: (include_rows && job.status != JobStatus::Running).then(|| job.rows.clone()),
        })
    }

    /// Rows of a finished job; `Err(status)` while it is still running.
    pub fn rows(&self, id: Uuid) -> Option<Result<Vec<ResultRow>, JobStatus>> {
        let jobs = self.lock();
        let job = jobs.get(&id)?;
        Some(match job.status {
            JobStatus::Running => Err(JobStatus::Running),
            _ => Ok(job.rows.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(company: &str, url: &str) -> ResultRow {
        ResultRow {
            company: company.to_string(),
            best_url: url.to_string(),
            message: None,
            confidence: None,
            error: String::new(),
        }
    }

    #[test]
    fn test_job_lifecycle() {
        let registry = JobRegistry::new();
        let (id, _cancel) = registry.create(2);

        registry.record_progress(
            id,
            &BatchProgress {
                processed: 1,
                total: 2,
                company: "A".to_string(),
                resolved: true,
            },
        );
        let running = registry.status(id, true).unwrap();
        assert_eq!(running.status, JobStatus::Running);
        assert_eq!(running.processed, 1);
        assert_eq!(running.resolved, 1);
        assert!(running.rows.is_none());
        assert_eq!(registry.rows(id), Some(Err(JobStatus::Running)));

        registry.finish(id, vec![row("A", "https://linkedin.com/in/a"), row("B", "No profiles found")]);
        let done = registry.status(id, true).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.processed, 2);
        assert_eq!(done.resolved, 1);
        assert_eq!(done.rows.unwrap().len(), 2);
        assert!(done.finished_at.is_some());
    }

    #[test]
    fn test_cancel_raises_flag_and_marks_job() {
        let registry = JobRegistry::new();
        let (id, cancel) = registry.create(3);

        assert_eq!(registry.cancel(id), Some(JobStatus::Running));
        assert!(cancel.load(Ordering::SeqCst));

        registry.finish(
            id,
            vec![
                row("A", "https://linkedin.com/in/a"),
                ResultRow::cancelled("B"),
                ResultRow::cancelled("C"),
            ],
        );
        assert_eq!(registry.status(id, false).unwrap().status, JobStatus::Cancelled);
        assert_eq!(registry.cancel(id), Some(JobStatus::Cancelled));
    }

    #[test]
    fn test_late_cancel_still_completes() {
        let registry = JobRegistry::new();
        let (id, cancel) = registry.create(2);

        registry.cancel(id);
        assert!(cancel.load(Ordering::SeqCst));

        registry.finish(id, vec![row("A", "https://linkedin.com/in/a"), row("B", "No profiles found")]);
        assert_eq!(registry.status(id, false).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_oldest_finished_jobs_are_evicted() {
        let registry = JobRegistry::with_retention(2);
        let (running, _) = registry.create(1);

        let mut finished = Vec::new();
        for _ in 0..3 {
            let (id, _) = registry.create(1);
            registry.finish(id, vec![row("A", "https://linkedin.com/in/a")]);
            finished.push(id);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        assert!(registry.status(finished[0], false).is_none());
        assert!(registry.status(finished[1], false).is_some());
        assert!(registry.status(finished[2], false).is_some());
        assert_eq!(registry.status(running, false).unwrap().status, JobStatus::Running);
    }

    #[test]
    fn test_unknown_job() {
        let registry = JobRegistry::new();
        assert!(registry.status(Uuid::new_v4(), false).is_none());
        assert!(registry.cancel(Uuid::new_v4()).is_none());
        assert!(registry.rows(Uuid::new_v4()).is_none());
    }
}
