use apalis::prelude::{Data, Error as ApalisError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    application::repos::{JobsRepo, RepoError},
    domain::types::JobType,
};

use super::{context::JobWorkerContext, queue::enqueue_job};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCreatedJobPayload {
    pub student_id: i64,
}

pub async fn enqueue_student_created_job<J: JobsRepo + ?Sized>(
    repo: &J,
    student_id: i64,
    max_attempts: i32,
) -> Result<String, RepoError> {
    let payload = StudentCreatedJobPayload { student_id };
    enqueue_job(repo, JobType::StudentCreated, &payload, None, max_attempts, 0).await
}

pub async fn process_student_created_job(
    payload: StudentCreatedJobPayload,
    context: Data<JobWorkerContext>,
) -> Result<(), ApalisError> {
    info!(
        target = "roster::jobs::student_created",
        student_id = payload.student_id,
        "Processing new student"
    );

    tokio::time::sleep(context.processing_delay).await;

    info!(
        target = "roster::jobs::student_created",
        student_id = payload.student_id,
        "Finished processing new student"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn waits_the_configured_delay() {
        let context = Data::new(JobWorkerContext {
            processing_delay: Duration::from_secs(5),
        });
        let started = tokio::time::Instant::now();

        process_student_created_job(StudentCreatedJobPayload { student_id: 3 }, context)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn payload_shape_is_stable() {
        let value = serde_json::to_value(StudentCreatedJobPayload { student_id: 9 }).unwrap();
        assert_eq!(value, serde_json::json!({ "student_id": 9 }));
    }
}
