use async_trait::async_trait;
use learn_core::model::{DayState, Enrollment, ProgramSlug, UserId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::enrollment_repo::write_enrollment;
use super::mapping::{db_err, map_day_state_row, to_json, user_i64};
use crate::repository::{DayStateRepository, ProgressStore, StorageError};

async fn write_day_state(conn: &mut SqliteConnection, state: &DayState) -> Result<(), StorageError> {
    let data = to_json(state.data())?;
    let sliders = to_json(state.sliders())?;
    sqlx::query(
        r"
        INSERT INTO day_states (
            user_id, program_slug, day, data, sliders,
            practiced, mantra3x, completed, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(user_id, program_slug, day) DO UPDATE SET
            data = excluded.data,
            sliders = excluded.sliders,
            practiced = excluded.practiced,
            mantra3x = excluded.mantra3x,
            completed = excluded.completed,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user_i64(state.user_id())?)
    .bind(state.program_slug().as_str())
    .bind(i64::from(state.day()))
    .bind(data)
    .bind(sliders)
    .bind(i64::from(state.practiced()))
    .bind(i64::from(state.mantra3x()))
    .bind(i64::from(state.completed()))
    .bind(state.updated_at())
    .execute(conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl DayStateRepository for SqliteRepository {
    async fn get_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<Option<DayState>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, program_slug, day, data, sliders,
                   practiced, mantra3x, completed, updated_at
            FROM day_states
            WHERE user_id = ?1 AND program_slug = ?2 AND day = ?3
            ",
        )
        .bind(user_i64(user_id)?)
        .bind(slug.as_str())
        .bind(i64::from(day))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_day_state_row).transpose()
    }

    async fn upsert_day_state(&self, state: &DayState) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        write_day_state(&mut conn, state).await
    }

    async fn list_day_states(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Vec<DayState>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, program_slug, day, data, sliders,
                   practiced, mantra3x, completed, updated_at
            FROM day_states
            WHERE user_id = ?1 AND program_slug = ?2
            ORDER BY day ASC
            ",
        )
        .bind(user_i64(user_id)?)
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_day_state_row).collect()
    }

    async fn delete_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
            DELETE FROM day_states
            WHERE user_id = ?1 AND program_slug = ?2 AND day = ?3
            ",
        )
        .bind(user_i64(user_id)?)
        .bind(slug.as_str())
        .bind(i64::from(day))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ProgressStore for SqliteRepository {
    async fn commit_day(
        &self,
        state: &DayState,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        write_day_state(&mut *tx, state).await?;
        write_enrollment(&mut *tx, enrollment).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn reset_program(&self, enrollment: &Enrollment) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let res = sqlx::query(
            r"
            DELETE FROM day_states
            WHERE user_id = ?1 AND program_slug = ?2
            ",
        )
        .bind(user_i64(enrollment.user_id())?)
        .bind(enrollment.program_slug().as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        write_enrollment(&mut *tx, enrollment).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(res.rows_affected())
    }
}
