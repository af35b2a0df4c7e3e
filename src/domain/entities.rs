//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};

/// A stored student. The id is assigned by the store on insert.
///
/// The serialized form `{id, name, email}` is also the snapshot shape kept in the
/// read cache, for single entries and for the listing alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Fields accepted when creating a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
}
