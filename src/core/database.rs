// src/core/database.rs
//! SQLite storage for saved searches, keyed by user id

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use crate::types::SearchCriteria;

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create new database connection with automatic setup
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database, single connection so every query sees
    /// the same data
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get pool reference for custom operations
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_searches (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                criteria_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create saved_searches table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_saved_searches_user ON saved_searches(user_id);",
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Saved Search Models =====

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub criteria: SearchCriteria,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SavedSearchRow {
    id: String,
    name: String,
    criteria_json: String,
    created_at: DateTime<Utc>,
}

impl SavedSearchRow {
    fn into_saved_search(self) -> Result<SavedSearch> {
        let criteria = serde_json::from_str(&self.criteria_json)
            .with_context(|| format!("Corrupt criteria for saved search {}", self.id))?;
        Ok(SavedSearch {
            id: self.id,
            name: self.name,
            criteria,
            created_at: self.created_at,
        })
    }
}

// ===== Saved Search Repository =====

pub struct SavedSearchRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SavedSearchRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(
        &self,
        user_id: &str,
        name: &str,
        criteria: &SearchCriteria,
    ) -> Result<SavedSearch> {
        let saved = SavedSearch {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            criteria: criteria.clone(),
            created_at: Utc::now(),
        };
        let criteria_json =
            serde_json::to_string(criteria).context("Failed to serialize criteria")?;

        sqlx::query(
            "INSERT INTO saved_searches (id, user_id, name, criteria_json, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&saved.id)
        .bind(user_id)
        .bind(&saved.name)
        .bind(&criteria_json)
        .bind(saved.created_at)
        .execute(self.pool)
        .await
        .context("Failed to insert saved search")?;

        info!(user_id, search_id = %saved.id, "Saved search created");
        Ok(saved)
    }

    /// Newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        let rows = sqlx::query_as::<_, SavedSearchRow>(
            "SELECT id, name, criteria_json, created_at FROM saved_searches WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list saved searches")?;

        rows.into_iter()
            .map(SavedSearchRow::into_saved_search)
            .collect()
    }

    /// Returns false when the search does not exist or belongs to someone else
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_searches WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .context("Failed to delete saved search")?;

        Ok(result.rows_affected() > 0)
    }
}
