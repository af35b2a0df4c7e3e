use serde::{Deserialize, Serialize};

use crate::domain::entities::{NewStudent, StudentRecord};

pub const DB_CONNECTED_MESSAGE: &str = "Db successfully connected";

#[derive(Debug, Deserialize, Serialize)]
pub struct StudentCreateRequest {
    pub name: String,
    pub email: String,
}

impl From<StudentCreateRequest> for NewStudent {
    fn from(request: StudentCreateRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StudentResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<StudentRecord> for StudentResponse {
    fn from(record: StudentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub message: String,
}
