use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    application::repos::{JobsRepo, NewJobRecord, RepoError},
    domain::types::JobType,
};

use super::student_created::enqueue_student_created_job;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to enqueue job: {0}")]
    Enqueue(#[from] RepoError),
}

/// Fire-and-forget notification channel. Delivery is at-least-once at best; callers
/// never wait for the job to run.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queue one "student created" notification and return the assigned job id.
    async fn notify_student_created(&self, student_id: i64) -> Result<String, QueueError>;
}

/// [`TaskQueue`] backed by the persistent apalis job table.
#[derive(Clone)]
pub struct JobsTaskQueue {
    jobs: Arc<dyn JobsRepo>,
    max_attempts: i32,
}

impl JobsTaskQueue {
    pub fn new(jobs: Arc<dyn JobsRepo>, max_attempts: i32) -> Self {
        Self { jobs, max_attempts }
    }
}

#[async_trait]
impl TaskQueue for JobsTaskQueue {
    async fn notify_student_created(&self, student_id: i64) -> Result<String, QueueError> {
        let job_id =
            enqueue_student_created_job(self.jobs.as_ref(), student_id, self.max_attempts).await?;
        Ok(job_id)
    }
}

/// Enqueue a job with the provided payload, returning the assigned ULID.
pub async fn enqueue_job<J, P>(
    repo: &J,
    job_type: JobType,
    payload: &P,
    run_at: Option<OffsetDateTime>,
    max_attempts: i32,
    priority: i32,
) -> Result<String, RepoError>
where
    J: JobsRepo + ?Sized,
    P: serde::Serialize,
{
    let payload = serde_json::to_value(payload)
        .map_err(|err| RepoError::from_persistence(err.to_string()))?;
    let record = NewJobRecord {
        job_type,
        payload,
        run_at: run_at.unwrap_or_else(OffsetDateTime::now_utc),
        max_attempts,
        priority,
    };

    repo.enqueue_job(record).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingJobsRepo {
        jobs: Mutex<Vec<NewJobRecord>>,
    }

    #[async_trait]
    impl JobsRepo for RecordingJobsRepo {
        async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.push(job);
            Ok(format!("job-{}", jobs.len()))
        }
    }

    struct FailingJobsRepo;

    #[async_trait]
    impl JobsRepo for FailingJobsRepo {
        async fn enqueue_job(&self, _job: NewJobRecord) -> Result<String, RepoError> {
            Err(RepoError::Timeout)
        }
    }

    #[tokio::test]
    async fn student_created_job_carries_the_id() {
        let repo = Arc::new(RecordingJobsRepo::default());
        let queue = JobsTaskQueue::new(repo.clone(), 3);

        let job_id = queue.notify_student_created(17).await.unwrap();
        assert_eq!(job_id, "job-1");

        let jobs = repo.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, JobType::StudentCreated);
        assert_eq!(jobs[0].payload, serde_json::json!({ "student_id": 17 }));
        assert_eq!(jobs[0].max_attempts, 3);
    }

    #[tokio::test]
    async fn repo_failures_surface_as_queue_errors() {
        let queue = JobsTaskQueue::new(Arc::new(FailingJobsRepo), 3);
        let err = queue.notify_student_created(1).await.unwrap_err();
        assert!(matches!(err, QueueError::Enqueue(RepoError::Timeout)));
    }
}
