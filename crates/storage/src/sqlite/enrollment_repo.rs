use async_trait::async_trait;
use learn_core::model::{Enrollment, ProgramSlug, UserId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{db_err, map_enrollment_row, user_i64};
use crate::repository::{EnrollmentRepository, StorageError};

/// Upsert shared by the plain repository call and the progress transactions.
pub(super) async fn write_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO enrollments (user_id, program_slug, status, current_day, started_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(user_id, program_slug) DO UPDATE SET
            status = excluded.status,
            current_day = excluded.current_day,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user_i64(enrollment.user_id())?)
    .bind(enrollment.program_slug().as_str())
    .bind(enrollment.status().as_str())
    .bind(i64::from(enrollment.current_day()))
    .bind(enrollment.started_at())
    .bind(enrollment.updated_at())
    .execute(conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn get_enrollment(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, program_slug, status, current_day, started_at, updated_at
            FROM enrollments
            WHERE user_id = ?1 AND program_slug = ?2
            ",
        )
        .bind(user_i64(user_id)?)
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        write_enrollment(&mut conn, enrollment).await
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, program_slug, status, current_day, started_at, updated_at
            FROM enrollments
            WHERE user_id = ?1
            ORDER BY updated_at DESC, program_slug ASC
            ",
        )
        .bind(user_i64(user_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_enrollment_row).collect()
    }
}
