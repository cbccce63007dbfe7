//! PostgreSQL storage for shopping items and unfinished commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::dialogue::PendingCommandSession;
use crate::models::{NewShoppingItem, ShoppingItem};
use crate::storage::{SessionTracker, ShoppingListStore, StorageResult};
use crate::update::{ChatId, UserId};

/// Connect to the database
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to the database")
}

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applied schema version as recorded by the migrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub version: i64,
    /// The last migration started but did not finish
    pub dirty: bool,
}

/// Version of the newest migration shipped with this build
pub fn latest_migration_version() -> Option<i64> {
    MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .max()
}

/// Apply all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Applying database migrations...");

    MIGRATOR
        .run(pool)
        .await
        .context("Failed to apply database migrations")?;

    info!(version = ?latest_migration_version(), "Database schema is up to date");
    Ok(())
}

/// Revert applied migrations newer than `target`; `0` reverts everything
pub async fn revert_migrations(pool: &PgPool, target: i64) -> Result<()> {
    info!(target, "Reverting database migrations...");

    MIGRATOR
        .undo(pool, target)
        .await
        .with_context(|| format!("Failed to revert database migrations to version {target}"))?;

    info!(target, "Database migrations reverted");
    Ok(())
}

/// The newest applied migration, `None` on a database never migrated
pub async fn schema_version(pool: &PgPool) -> Result<Option<SchemaVersion>> {
    let table: Option<String> = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
        .fetch_one(pool)
        .await
        .context("Failed to look up the migrations table")?;
    if table.is_none() {
        return Ok(None);
    }

    let row = sqlx::query(
        "SELECT version, success FROM _sqlx_migrations ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("Failed to read the schema version")?;

    let version = match row {
        Some(row) => Some(SchemaVersion {
            version: row.try_get("version")?,
            dirty: !row.try_get::<bool, _>("success")?,
        }),
        None => None,
    };
    Ok(version)
}

/// Storage backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn session_from_row(row: &PgRow) -> Result<PendingCommandSession, sqlx::Error> {
    Ok(PendingCommandSession {
        command: row.try_get("command")?,
        chat_id: row.try_get("chat_id")?,
        user_id: row.try_get("created_by")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<ShoppingItem, sqlx::Error> {
    Ok(ShoppingItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        chat_id: row.try_get("chat_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl SessionTracker for PgStorage {
    async fn get_session(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> StorageResult<Option<PendingCommandSession>> {
        let row = sqlx::query(
            "SELECT command, chat_id, created_by, created_at
             FROM unfinished_commands
             WHERE chat_id = $1 AND created_by = $2",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row).transpose()?)
    }

    async fn put_session(&self, session: PendingCommandSession) -> StorageResult<()> {
        debug!(chat_id = session.chat_id, user_id = session.user_id, command = %session.command, "Storing unfinished command");

        sqlx::query(
            "INSERT INTO unfinished_commands (chat_id, created_by, command, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (chat_id, created_by)
             DO UPDATE SET command = EXCLUDED.command, created_at = EXCLUDED.created_at",
        )
        .bind(session.chat_id)
        .bind(session.user_id)
        .bind(&session.command)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_session(&self, chat_id: ChatId, user_id: UserId) -> StorageResult<()> {
        sqlx::query("DELETE FROM unfinished_commands WHERE chat_id = $1 AND created_by = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ShoppingListStore for PgStorage {
    async fn add_item(&self, item: NewShoppingItem) -> StorageResult<ShoppingItem> {
        let row = sqlx::query(
            "INSERT INTO shopping_items (name, chat_id, created_by)
             VALUES ($1, $2, $3)
             RETURNING id, name, chat_id, created_by, created_at",
        )
        .bind(&item.name)
        .bind(item.chat_id)
        .bind(item.created_by)
        .fetch_one(&self.pool)
        .await?;

        let stored = item_from_row(&row)?;
        info!(chat_id = stored.chat_id, item_id = stored.id, "Shopping item created");
        Ok(stored)
    }

    async fn items(&self, chat_id: ChatId) -> StorageResult<Vec<ShoppingItem>> {
        let rows = sqlx::query(
            "SELECT id, name, chat_id, created_by, created_at
             FROM shopping_items
             WHERE chat_id = $1
             ORDER BY id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<Option<ShoppingItem>> {
        let row = sqlx::query(
            "SELECT id, name, chat_id, created_by, created_at
             FROM shopping_items
             WHERE id = $1 AND chat_id = $2",
        )
        .bind(item_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn delete_item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE id = $1 AND chat_id = $2")
            .bind(item_id)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, chat_id: ChatId) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        info!(chat_id, deleted = result.rows_affected(), "Shopping list cleared");
        Ok(result.rows_affected())
    }
}
