//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod students;
pub mod types;
