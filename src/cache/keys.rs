//! Cache key definitions.

use std::fmt;

const STUDENT_PREFIX: &str = "student:";
const STUDENT_LIST_KEY: &str = "students_list";

/// Keys used by the student access layer.
///
/// The rendered names are shared with any other process pointed at the same backend,
/// so they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One student snapshot, rendered as `student:<id>`.
    Student(i64),
    /// The full listing snapshot, rendered as `students_list`.
    StudentList,
}

impl CacheKey {
    /// Metric label for the cache shape this key belongs to.
    pub fn shape(self) -> &'static str {
        match self {
            CacheKey::Student(_) => "item",
            CacheKey::StudentList => "list",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Student(id) => write!(f, "{STUDENT_PREFIX}{id}"),
            CacheKey::StudentList => f.write_str(STUDENT_LIST_KEY),
        }
    }
}
