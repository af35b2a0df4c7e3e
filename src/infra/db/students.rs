use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, StudentsRepo},
    domain::entities::{NewStudent, StudentRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: i64,
    name: String,
    email: String,
}

impl From<StudentRow> for StudentRecord {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

#[async_trait]
impl StudentsRepo for PostgresRepositories {
    async fn create(&self, student: NewStudent) -> Result<StudentRecord, RepoError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            INSERT INTO students (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&student.name)
        .bind(&student.email)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<StudentRecord, RepoError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, name, email
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, name, email
            FROM students
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: i64) -> Result<StudentRecord, RepoError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            DELETE FROM students
            WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }
}
