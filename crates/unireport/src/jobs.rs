//! Status tracking for background report runs.
//!
//! Each run owns one entry in a [`JobRegistry`]. The registry map is behind
//! a read-write lock that is only held to look up or insert entries; each
//! entry has its own mutex, so updating one run never blocks reading
//! another.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ReportError, Result};

/// Lifecycle state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    /// Running, with the current stage name.
    Running(String),
    Completed,
    Error(String),
}

impl JobState {
    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Error(_))
    }
}

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Percentage complete, 0 to 100.
    pub progress: u8,
    pub state: JobState,
    /// Name of the artifact produced, once completed.
    pub output: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    fn queued() -> Self {
        Self {
            progress: 0,
            state: JobState::Queued,
            output: None,
            updated_at: Utc::now(),
        }
    }

    /// Status text as shown to users.
    pub fn status_text(&self) -> String {
        match &self.state {
            JobState::Queued => "Queued".to_string(),
            JobState::Running(stage) => stage.clone(),
            JobState::Completed => "Completed".to_string(),
            JobState::Error(message) => format!("Error: {}", message),
        }
    }
}

/// Write access to a single job's status.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: Uuid,
    status: Arc<Mutex<JobStatus>>,
}

impl JobHandle {
    /// Job identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Record the current stage and progress.
    pub fn stage(&self, progress: u8, stage: impl Into<String>) {
        self.update(|s| {
            s.progress = progress.min(100);
            s.state = JobState::Running(stage.into());
        });
    }

    /// Mark the job completed.
    pub fn complete(&self, output: Option<String>) {
        self.update(|s| {
            s.progress = 100;
            s.state = JobState::Completed;
            s.output = output;
        });
    }

    /// Mark the job failed.
    pub fn fail(&self, message: impl Into<String>) {
        self.update(|s| s.state = JobState::Error(message.into()));
    }

    fn update(&self, f: impl FnOnce(&mut JobStatus)) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
        status.updated_at = Utc::now();
    }

    fn snapshot(&self) -> JobStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Shared table of job statuses keyed by run id.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, Arc<Mutex<JobStatus>>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job.
    pub fn create(&self) -> JobHandle {
        let id = Uuid::new_v4();
        let status = Arc::new(Mutex::new(JobStatus::queued()));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, status.clone());
        JobHandle { id, status }
    }

    /// Handle for an existing job.
    pub fn handle(&self, id: Uuid) -> Result<JobHandle> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id)
            .map(|status| JobHandle {
                id,
                status: status.clone(),
            })
            .ok_or_else(|| ReportError::UnknownJob(id.to_string()))
    }

    /// Current status of a job.
    pub fn status(&self, id: Uuid) -> Result<JobStatus> {
        self.handle(id).map(|h| h.snapshot())
    }

    /// Status of every job.
    pub fn list(&self) -> Vec<(Uuid, JobStatus)> {
        let handles: Vec<JobHandle> = {
            let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
            jobs.iter()
                .map(|(id, status)| JobHandle {
                    id: *id,
                    status: status.clone(),
                })
                .collect()
        };
        handles.into_iter().map(|h| (h.id, h.snapshot())).collect()
    }

    /// Run `work` on a background thread as a new job.
    ///
    /// The job ends `Completed` with the returned output name, or `Error`
    /// with the error message. A panic inside `work` also ends in `Error`.
    /// There is no cancellation.
    pub fn spawn<F>(&self, work: F) -> (Uuid, JoinHandle<()>)
    where
        F: FnOnce(&JobHandle) -> Result<String> + Send + 'static,
    {
        let handle = self.create();
        let id = handle.id();
        let join = std::thread::spawn(move || {
            match panic::catch_unwind(AssertUnwindSafe(|| work(&handle))) {
                Ok(Ok(output)) => {
                    info!("Job {} completed: {}", handle.id(), output);
                    handle.complete(Some(output));
                }
                Ok(Err(e)) => {
                    error!("Job {} failed: {}", handle.id(), e);
                    handle.fail(e.to_string());
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Job {} panicked: {}", handle.id(), message);
                    handle.fail(format!("internal error: {}", message));
                }
            }
        });
        (id, join)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
