use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::repos::RepoError;
use crate::application::students::StudentServiceError;

use super::error::{ApiError, codes};
use super::models::*;
use super::state::ApiState;

pub async fn root(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    state.db.health_check().await.map_err(|err| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_UNAVAILABLE,
            "Database unavailable",
            Some(err.to_string()),
        )
    })?;

    Ok(Json(StatusResponse {
        message: DB_CONNECTED_MESSAGE.to_string(),
    }))
}

pub async fn create_student(
    State(state): State<ApiState>,
    Json(payload): Json<StudentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state
        .students
        .create(payload.into())
        .await
        .map_err(service_to_api)?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn list_students(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let students = state.students.list_all().await.map_err(service_to_api)?;

    Ok(Json(
        students
            .into_iter()
            .map(StudentResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_student(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.students.get_by_id(id).await.map_err(service_to_api)?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn delete_student(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.students.delete(id).await.map_err(service_to_api)?;

    Ok(Json(StudentResponse::from(student)))
}

fn service_to_api(err: StudentServiceError) -> ApiError {
    match err {
        StudentServiceError::NotFound { id } => {
            ApiError::not_found("Student not found", Some(format!("no student with id {id}")))
        }
        StudentServiceError::Validation { message } => {
            ApiError::invalid_input("Invalid student", Some(message))
        }
        StudentServiceError::CacheUnavailable {
            operation,
            committed,
            source,
        } => {
            let hint = match committed {
                Some(student) => format!(
                    "{operation} already applied to student {} before the cache failed: {source}",
                    student.id
                ),
                None => format!("{operation}: {source}"),
            };
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE_UNAVAILABLE,
                "Cache unavailable",
                Some(hint),
            )
        }
        StudentServiceError::Repo(repo) => repo_to_api(repo),
    }
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => {
            ApiError::invalid_input("Duplicate record", Some(constraint))
        }
        RepoError::NotFound => ApiError::not_found("Resource not found", None),
        RepoError::InvalidInput { message } => {
            ApiError::invalid_input("Invalid input", Some(message))
        }
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::domain::entities::StudentRecord;

    #[test]
    fn service_errors_map_to_status_codes() {
        let not_found = service_to_api(StudentServiceError::NotFound { id: 3 });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), codes::NOT_FOUND);

        let invalid = service_to_api(StudentServiceError::Validation {
            message: "email must not be empty".to_string(),
        });
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code(), codes::INVALID_INPUT);

        let cache = service_to_api(StudentServiceError::CacheUnavailable {
            operation: "create",
            committed: Some(Box::new(StudentRecord {
                id: 5,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })),
            source: CacheError::backend("connection refused"),
        });
        assert_eq!(cache.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cache.code(), codes::CACHE_UNAVAILABLE);

        let timeout = service_to_api(StudentServiceError::Repo(RepoError::Timeout));
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.code(), codes::DB_TIMEOUT);
    }
}
