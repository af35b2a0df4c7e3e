use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// SQLSTATE `22001`: value too long for the column type.
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
/// SQLSTATE `57014`: statement cancelled, usually by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let db = match err {
        sqlx::Error::RowNotFound => return RepoError::NotFound,
        sqlx::Error::PoolTimedOut => return RepoError::Timeout,
        sqlx::Error::Database(db) => db,
        other => return RepoError::from_persistence(other),
    };

    match db.kind() {
        ErrorKind::UniqueViolation => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        ErrorKind::ForeignKeyViolation => RepoError::Integrity {
            message: db.message().to_string(),
        },
        _ => match db.code().as_deref() {
            Some(STRING_DATA_RIGHT_TRUNCATION) => RepoError::InvalidInput {
                message: db.message().to_string(),
            },
            Some(QUERY_CANCELED) => RepoError::Timeout,
            _ => RepoError::Persistence(db.message().to_string()),
        },
    }
}
