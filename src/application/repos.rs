//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{NewStudent, StudentRecord};
use crate::domain::types::JobType;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable student storage. The source of truth for every cached snapshot.
#[async_trait]
pub trait StudentsRepo: Send + Sync {
    /// Insert a validated student and return it with its assigned id.
    async fn create(&self, student: NewStudent) -> Result<StudentRecord, RepoError>;

    /// `RepoError::NotFound` when no row has `id`.
    async fn find_by_id(&self, id: i64) -> Result<StudentRecord, RepoError>;

    /// Every student in ascending id order.
    async fn list_all(&self) -> Result<Vec<StudentRecord>, RepoError>;

    /// Remove and return the row as it was before removal.
    async fn delete(&self, id: i64) -> Result<StudentRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub max_attempts: i32,
    pub priority: i32,
}

#[async_trait]
pub trait JobsRepo: Send + Sync {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError>;
}

/// Liveness probe for the backing database.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
