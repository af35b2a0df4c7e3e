//! Student records service.
//!
//! HTTP handlers call [`application::students::StudentService`], which keeps an
//! expiring read cache coherent with the Postgres store across create, read and
//! delete paths, and queues a background notification for new students.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
