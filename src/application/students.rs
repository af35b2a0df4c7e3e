//! Cache-coherent access to student records.
//!
//! [`StudentService`] sits between the HTTP surface and [`StudentsRepo`] and keeps two
//! derived cache shapes in an [`ExpiringStore`]:
//!
//! - one item entry per student, keyed `student:<id>`
//! - one listing entry holding every student, keyed `students_list`
//!
//! Both carry the same TTL and are never refreshed by reads, only rewritten.
//!
//! The store mutation always happens first. Cache bookkeeping follows and, unless
//! `strict` is set, a failing backend is logged and counted but never fails the call:
//! a failed read is treated as a miss and a failed write simply leaves the entry to
//! be repopulated later.
//!
//! # Listing patches
//!
//! `create` and `delete` patch the listing in place with a plain read-modify-write:
//! read the blob, decode, append or filter, write it back with a fresh TTL. There is
//! no compare-and-swap, so two concurrent creates can both read the same listing and
//! the later write drops the earlier append. The store still holds both rows and the
//! listing heals when the entry expires. A listing that cannot be decoded is deleted
//! rather than left stale.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    application::{
        jobs::TaskQueue,
        repos::{RepoError, StudentsRepo},
    },
    cache::{CacheConfig, CacheError, CacheKey, ExpiringStore},
    domain::{
        entities::{NewStudent, StudentRecord},
        error::DomainError,
        students::validate_new_student,
    },
};

const METRIC_CACHE_HIT: &str = "roster_cache_hit_total";
const METRIC_CACHE_MISS: &str = "roster_cache_miss_total";
const METRIC_CACHE_PATCH: &str = "roster_cache_patch_total";
const METRIC_CACHE_INVALIDATE: &str = "roster_cache_invalidate_total";
const METRIC_CACHE_BACKEND_ERROR: &str = "roster_cache_backend_error_total";
const METRIC_NOTIFY_ENQUEUED: &str = "roster_notify_enqueued_total";
const METRIC_NOTIFY_FAILED: &str = "roster_notify_failed_total";

#[derive(Debug, Error)]
pub enum StudentServiceError {
    #[error("student `{id}` not found")]
    NotFound { id: i64 },
    #[error("invalid student: {message}")]
    Validation { message: String },
    /// Only raised in strict mode. `committed` holds whatever the store already
    /// returned, so a successful mutation is still visible to the caller.
    #[error("cache unavailable during {operation}")]
    CacheUnavailable {
        operation: &'static str,
        committed: Option<Box<StudentRecord>>,
        #[source]
        source: CacheError,
    },
    #[error(transparent)]
    Repo(RepoError),
}

impl StudentServiceError {
    fn from_repo(err: RepoError, id: Option<i64>) -> Self {
        match (err, id) {
            (RepoError::NotFound, Some(id)) => Self::NotFound { id },
            (RepoError::InvalidInput { message }, _) => Self::Validation { message },
            (RepoError::Duplicate { .. }, _) => Self::Validation {
                message: "a student with this email already exists".to_string(),
            },
            (err, _) => Self::Repo(err),
        }
    }

    fn cache_unavailable(
        operation: &'static str,
        committed: Option<&StudentRecord>,
        source: CacheError,
    ) -> Self {
        Self::CacheUnavailable {
            operation,
            committed: committed.cloned().map(Box::new),
            source,
        }
    }
}

impl From<DomainError> for StudentServiceError {
    fn from(err: DomainError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct StudentService {
    students: Arc<dyn StudentsRepo>,
    cache: Arc<dyn ExpiringStore>,
    notifier: Arc<dyn TaskQueue>,
    ttl: Duration,
    strict: bool,
}

impl StudentService {
    pub fn new(
        students: Arc<dyn StudentsRepo>,
        cache: Arc<dyn ExpiringStore>,
        notifier: Arc<dyn TaskQueue>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            students,
            cache,
            notifier,
            ttl: config.ttl,
            strict: config.strict,
        }
    }

    /// Insert a student, cache it, and append it to a cached listing if one exists.
    ///
    /// A notification is queued only when the listing was present and patched.
    pub async fn create(&self, input: NewStudent) -> Result<StudentRecord, StudentServiceError> {
        let input = validate_new_student(input)?;
        let student = self
            .students
            .create(input)
            .await
            .map_err(|err| StudentServiceError::from_repo(err, None))?;

        let item = self.write(CacheKey::Student(student.id), &student).await;
        let listing = self
            .patch_listing("append", |listing| listing.push(student.clone()))
            .await;

        if matches!(listing, Ok(true)) {
            self.notify_created(student.id).await;
        }

        item.and(listing.map(|_| ())).map_err(|source| {
            StudentServiceError::cache_unavailable("create", Some(&student), source)
        })?;

        info!(
            target = "roster::students",
            student_id = student.id,
            "Student created"
        );
        Ok(student)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<StudentRecord, StudentServiceError> {
        let key = CacheKey::Student(id);
        if let Some(student) = self
            .read::<StudentRecord>(key)
            .await
            .map_err(|source| StudentServiceError::cache_unavailable("get", None, source))?
        {
            return Ok(student);
        }

        let student = self
            .students
            .find_by_id(id)
            .await
            .map_err(|err| StudentServiceError::from_repo(err, Some(id)))?;

        self.write(key, &student)
            .await
            .map_err(|source| StudentServiceError::cache_unavailable("get", Some(&student), source))?;
        Ok(student)
    }

    pub async fn list_all(&self) -> Result<Vec<StudentRecord>, StudentServiceError> {
        let key = CacheKey::StudentList;
        if let Some(listing) = self
            .read::<Vec<StudentRecord>>(key)
            .await
            .map_err(|source| StudentServiceError::cache_unavailable("list", None, source))?
        {
            return Ok(listing);
        }

        let listing = self
            .students
            .list_all()
            .await
            .map_err(|err| StudentServiceError::from_repo(err, None))?;

        self.write(key, &listing)
            .await
            .map_err(|source| StudentServiceError::cache_unavailable("list", None, source))?;
        Ok(listing)
    }

    /// Remove a student, drop its item entry, and filter it out of a cached listing.
    ///
    /// Returns the row as the store held it before removal.
    pub async fn delete(&self, id: i64) -> Result<StudentRecord, StudentServiceError> {
        let student = self
            .students
            .delete(id)
            .await
            .map_err(|err| StudentServiceError::from_repo(err, Some(id)))?;

        let item = self.invalidate(CacheKey::Student(id), "deleted").await;
        let listing = self
            .patch_listing("remove", |listing| listing.retain(|entry| entry.id != id))
            .await;

        item.and(listing.map(|_| ())).map_err(|source| {
            StudentServiceError::cache_unavailable("delete", Some(&student), source)
        })?;

        info!(target = "roster::students", student_id = id, "Student deleted");
        Ok(student)
    }

    /// Read-modify-write of the listing entry.
    ///
    /// Returns `Ok(true)` only when a live listing was decoded, mutated and written back.
    /// Not atomic: a concurrent patch between the read and the write is overwritten.
    async fn patch_listing<F>(&self, op: &'static str, mutate: F) -> Result<bool, CacheError>
    where
        F: FnOnce(&mut Vec<StudentRecord>),
    {
        let key = CacheKey::StudentList;
        let raw = match self.cache.get(&key.to_string()).await {
            Ok(raw) => raw,
            Err(err) => return self.abandon_patch("get", err).await,
        };

        let Some(raw) = raw else {
            debug!(target = "roster::students", op, "No cached listing to patch");
            return Ok(false);
        };

        let mut listing: Vec<StudentRecord> = match serde_json::from_str(&raw) {
            Ok(listing) => listing,
            Err(err) => {
                warn!(
                    target = "roster::students",
                    key = %key,
                    error = %err,
                    "Cached listing could not be decoded; dropping it"
                );
                self.invalidate(key, "decode_failed").await?;
                return Ok(false);
            }
        };

        mutate(&mut listing);

        let encoded = match serde_json::to_string(&listing) {
            Ok(encoded) => encoded,
            Err(err) => return self.abandon_patch("encode", err.into()).await,
        };

        match self.cache.set(&key.to_string(), encoded, self.ttl).await {
            Ok(()) => {
                counter!(METRIC_CACHE_PATCH, "shape" => key.shape(), "op" => op).increment(1);
                Ok(true)
            }
            Err(err) => self.abandon_patch("set", err).await,
        }
    }

    /// Drop a listing that could not be patched.
    ///
    /// The delete is attempted even when strict mode surfaces `err`, so a committed
    /// mutation never leaves the old listing behind. The first failure is returned.
    async fn abandon_patch(&self, op: &'static str, err: CacheError) -> Result<bool, CacheError> {
        let key = CacheKey::StudentList;
        let absorbed = self.absorb(op, key, err);
        let invalidated = self.invalidate(key, "patch_failed").await;
        absorbed.and(invalidated).map(|()| false)
    }

    /// Fetch and decode an entry. Undecodable entries are deleted and reported as a miss.
    async fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Result<Option<T>, CacheError> {
        let raw = match self.cache.get(&key.to_string()).await {
            Ok(raw) => raw,
            Err(err) => {
                self.absorb("get", key, err)?;
                None
            }
        };

        let Some(raw) = raw else {
            counter!(METRIC_CACHE_MISS, "shape" => key.shape()).increment(1);
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "shape" => key.shape()).increment(1);
                Ok(Some(value))
            }
            Err(err) => {
                warn!(
                    target = "roster::students",
                    key = %key,
                    error = %err,
                    "Cached entry could not be decoded; dropping it"
                );
                self.invalidate(key, "decode_failed").await?;
                counter!(METRIC_CACHE_MISS, "shape" => key.shape()).increment(1);
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        key: CacheKey,
        value: &T,
    ) -> Result<(), CacheError> {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => return self.absorb("encode", key, err.into()),
        };

        match self.cache.set(&key.to_string(), encoded, self.ttl).await {
            Ok(()) => Ok(()),
            Err(err) => self.absorb("set", key, err),
        }
    }

    async fn invalidate(&self, key: CacheKey, reason: &'static str) -> Result<(), CacheError> {
        match self.cache.delete(&key.to_string()).await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATE, "shape" => key.shape(), "reason" => reason)
                    .increment(1);
                Ok(())
            }
            Err(err) => self.absorb("delete", key, err),
        }
    }

    /// Count a backend failure and decide whether it propagates.
    fn absorb(&self, op: &'static str, key: CacheKey, err: CacheError) -> Result<(), CacheError> {
        counter!(METRIC_CACHE_BACKEND_ERROR, "op" => op).increment(1);
        if self.strict {
            return Err(err);
        }

        warn!(
            target = "roster::students",
            op,
            key = %key,
            error = %err,
            "Cache backend call failed; continuing without cache"
        );
        Ok(())
    }

    async fn notify_created(&self, student_id: i64) {
        match self.notifier.notify_student_created(student_id).await {
            Ok(job_id) => {
                counter!(METRIC_NOTIFY_ENQUEUED).increment(1);
                debug!(
                    target = "roster::students",
                    student_id,
                    job_id = %job_id,
                    "Queued new student notification"
                );
            }
            Err(err) => {
                counter!(METRIC_NOTIFY_FAILED).increment(1);
                warn!(
                    target = "roster::students",
                    student_id,
                    error = %err,
                    "Failed to queue new student notification"
                );
            }
        }
    }
}
