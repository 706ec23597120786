use async_trait::async_trait;
use learn_core::model::{Program, ProgramId, ProgramSlug};

use super::SqliteRepository;
use super::mapping::{db_err, i64_from_u64, map_program_row, u64_from_i64};
use crate::repository::{ProgramRepository, StorageError};

#[async_trait]
impl ProgramRepository for SqliteRepository {
    async fn insert_program(&self, program: &Program) -> Result<ProgramId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO programs (slug, title, description, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(program.slug().as_str())
        .bind(program.title())
        .bind(program.description())
        .bind(program.status().as_str())
        .bind(program.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(ProgramId::new(u64_from_i64("id", res.last_insert_rowid())?))
    }

    async fn update_program(&self, program: &Program) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE programs
            SET title = ?2, description = ?3, status = ?4
            WHERE id = ?1
            ",
        )
        .bind(i64_from_u64("id", program.id().value())?)
        .bind(program.title())
        .bind(program.description())
        .bind(program.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_program(&self, slug: &ProgramSlug) -> Result<Option<Program>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, slug, title, description, status, created_at
            FROM programs
            WHERE slug = ?1
            ",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_program_row).transpose()
    }

    async fn list_programs(&self, limit: u32) -> Result<Vec<Program>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, slug, title, description, status, created_at
            FROM programs
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_program_row).collect()
    }
}
