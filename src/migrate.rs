use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the schema on an existing pool. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Create people table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS people (
            id TEXT PRIMARY KEY,
            unique_id TEXT NOT NULL UNIQUE,
            standard_name TEXT NOT NULL,
            display_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            document_name TEXT NOT NULL,
            filename_on_disk TEXT NOT NULL UNIQUE,
            category TEXT,
            date_uploaded INTEGER NOT NULL,
            description TEXT,
            person_id TEXT NOT NULL,
            FOREIGN KEY (person_id) REFERENCES people(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_person_id ON documents(person_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_date_uploaded ON documents(date_uploaded)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
