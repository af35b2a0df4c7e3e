//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use roster::application::jobs::{QueueError, TaskQueue};
use roster::application::repos::{HealthRepo, RepoError, StudentsRepo};
use roster::application::students::StudentService;
use roster::cache::{CacheConfig, CacheError, ExpiringStore, MemoryStore};
use roster::domain::entities::{NewStudent, StudentRecord};

pub fn new_student(name: &str, email: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Student store with per-operation call counters.
#[derive(Default)]
pub struct InMemoryStudents {
    rows: Mutex<Vec<StudentRecord>>,
    next_id: AtomicI64,
    pub creates: AtomicUsize,
    pub finds: AtomicUsize,
    pub lists: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl InMemoryStudents {
    pub fn rows(&self) -> Vec<StudentRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StudentsRepo for InMemoryStudents {
    async fn create(&self, student: NewStudent) -> Result<StudentRecord, RepoError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.email == student.email) {
            return Err(RepoError::Duplicate {
                constraint: "students_email_key".to_string(),
            });
        }
        let record = StudentRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: student.name,
            email: student.email,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<StudentRecord, RepoError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>, RepoError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows())
    }

    async fn delete(&self, id: i64) -> Result<StudentRecord, RepoError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(rows.remove(index))
    }
}

#[async_trait]
impl HealthRepo for InMemoryStudents {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Task queue that records every notified id.
#[derive(Default)]
pub struct RecordingQueue {
    notified: Mutex<Vec<i64>>,
    pub fail: AtomicBool,
}

impl RecordingQueue {
    pub fn notified(&self) -> Vec<i64> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn notify_student_created(&self, student_id: i64) -> Result<String, QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Enqueue(RepoError::Timeout));
        }
        let mut notified = self.notified.lock().unwrap();
        notified.push(student_id);
        Ok(format!("job-{}", notified.len()))
    }
}

/// Memory store whose calls can be switched to fail, either all of them or only
/// writes to one key.
pub struct FlakyStore {
    inner: MemoryStore,
    pub failing: AtomicBool,
    failing_set_key: Mutex<Option<&'static str>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(&CacheConfig::default()),
            failing: AtomicBool::new(false),
            failing_set_key: Mutex::new(None),
        }
    }

    pub fn fail_sets_for(&self, key: &'static str) {
        *self.failing_set_key.lock().unwrap() = Some(key);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::backend("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpiringStore for FlakyStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        if *self.failing_set_key.lock().unwrap() == Some(key) {
            return Err(CacheError::backend("write rejected"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }
}

/// Memory store that holds the next `gated_reads` reads of `key` at a barrier after
/// reading, so concurrent read-modify-write sequences interleave deterministically.
pub struct GatedStore {
    inner: MemoryStore,
    key: &'static str,
    gated_reads: AtomicUsize,
    barrier: Barrier,
}

impl GatedStore {
    pub fn new(key: &'static str, parties: usize) -> Self {
        Self {
            inner: MemoryStore::new(&CacheConfig::default()),
            key,
            gated_reads: AtomicUsize::new(0),
            barrier: Barrier::new(parties),
        }
    }

    pub fn arm(&self, reads: usize) {
        self.gated_reads.store(reads, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExpiringStore for GatedStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self.inner.get(key).await?;
        if key == self.key
            && self
                .gated_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            self.barrier.wait().await;
        }
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }
}

/// A service wired to in-memory fakes, with handles to inspect each collaborator.
pub struct Harness<S: ExpiringStore + 'static = MemoryStore> {
    pub service: StudentService,
    pub students: Arc<InMemoryStudents>,
    pub queue: Arc<RecordingQueue>,
    pub cache: Arc<S>,
}

impl Harness<MemoryStore> {
    pub fn new() -> Self {
        let config = CacheConfig::default();
        Self::with_store(Arc::new(MemoryStore::new(&config)), config)
    }
}

impl<S: ExpiringStore + 'static> Harness<S> {
    pub fn with_store(cache: Arc<S>, config: CacheConfig) -> Self {
        let students = Arc::new(InMemoryStudents::default());
        let queue = Arc::new(RecordingQueue::default());
        let service = StudentService::new(
            students.clone(),
            cache.clone(),
            queue.clone(),
            &config,
        );
        Self {
            service,
            students,
            queue,
            cache,
        }
    }
}
