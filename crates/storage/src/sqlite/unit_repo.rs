use async_trait::async_trait;
use learn_core::model::{ProgramSlug, Unit, UnitId};

use super::SqliteRepository;
use super::mapping::{db_err, i64_from_u64, map_unit_row, to_json, u64_from_i64};
use crate::repository::{StorageError, UnitRepository};

const UNIT_COLUMNS: &str = "id, program_slug, unit_type, unit_index, title, journal, status";

#[async_trait]
impl UnitRepository for SqliteRepository {
    async fn insert_unit(&self, unit: &Unit) -> Result<UnitId, StorageError> {
        let journal = to_json(unit.journal())?;
        let res = sqlx::query(
            r"
            INSERT INTO units (program_slug, unit_type, unit_index, title, journal, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(unit.program_slug().as_str())
        .bind(unit.unit_type().as_str())
        .bind(i64::from(unit.unit_index()))
        .bind(unit.title())
        .bind(journal)
        .bind(unit.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(UnitId::new(u64_from_i64("id", res.last_insert_rowid())?))
    }

    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        let journal = to_json(unit.journal())?;
        let res = sqlx::query(
            r"
            UPDATE units
            SET unit_type = ?2, unit_index = ?3, title = ?4, journal = ?5, status = ?6
            WHERE id = ?1
            ",
        )
        .bind(i64_from_u64("id", unit.id().value())?)
        .bind(unit.unit_type().as_str())
        .bind(i64::from(unit.unit_index()))
        .bind(unit.title())
        .bind(journal)
        .bind(unit.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError> {
        let sql = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(i64_from_u64("id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_unit_row).transpose()
    }

    async fn list_units(&self, slug: &ProgramSlug) -> Result<Vec<Unit>, StorageError> {
        let sql = format!(
            r"
            SELECT {UNIT_COLUMNS}
            FROM units
            WHERE program_slug = ?1
            ORDER BY
                CASE unit_type WHEN 'intro' THEN 0 WHEN 'day' THEN 1 ELSE 2 END,
                unit_index ASC
            "
        );
        let rows = sqlx::query(&sql)
            .bind(slug.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_unit_row).collect()
    }
}
