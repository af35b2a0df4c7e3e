use serde::{Deserialize, Serialize};

/// Background job kinds. The string form doubles as the apalis queue namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    StudentCreated,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::StudentCreated => "student_created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_namespace_matches_serialized_form() {
        let kind = JobType::StudentCreated;
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::json!(kind.as_str())
        );
    }
}
