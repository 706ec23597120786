use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
        .bind(version)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Version 1: catalog (programs, units) and learner progress
/// (enrollments, day states).
const V1: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS programs (
        id INTEGER PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL CHECK (status IN ('draft', 'published')),
        created_at TEXT NOT NULL
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS units (
        id INTEGER PRIMARY KEY,
        program_slug TEXT NOT NULL,
        unit_type TEXT NOT NULL CHECK (unit_type IN ('intro', 'day', 'conclusion')),
        unit_index INTEGER NOT NULL CHECK (unit_index >= 1),
        title TEXT NOT NULL,
        journal TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('draft', 'published')),
        UNIQUE (program_slug, unit_type, unit_index),
        FOREIGN KEY (program_slug) REFERENCES programs(slug) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS enrollments (
        user_id INTEGER NOT NULL,
        program_slug TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('active', 'completed', 'paused')),
        current_day INTEGER NOT NULL CHECK (current_day >= 1),
        started_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, program_slug),
        FOREIGN KEY (program_slug) REFERENCES programs(slug) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS day_states (
        user_id INTEGER NOT NULL,
        program_slug TEXT NOT NULL,
        day INTEGER NOT NULL CHECK (day >= 1),
        data TEXT NOT NULL,
        sliders TEXT NOT NULL,
        practiced INTEGER NOT NULL,
        mantra3x INTEGER NOT NULL,
        completed INTEGER NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, program_slug, day),
        FOREIGN KEY (program_slug) REFERENCES programs(slug) ON DELETE CASCADE
    );
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_units_program_type_index
        ON units (program_slug, unit_type, unit_index);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_enrollments_user_updated
        ON enrollments (user_id, updated_at);
    ",
];

/// Applies pending schema versions, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    let versions: [(i64, &[&str]); 1] = [(1, V1)];
    for (version, statements) in versions {
        if is_applied(pool, version).await? {
            continue;
        }
        let mut tx = pool.begin().await?;
        for statement in statements {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(version, "applied schema migration");
    }

    Ok(())
}
