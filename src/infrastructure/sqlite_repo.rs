use std::{path::Path, str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};

use crate::{
    config::DatabaseConfig,
    domain::{
        repository::TaskRepository,
        task::{DueDate, NewTask, Task, TaskId, TaskStatus},
    },
};

const SELECT_COLUMNS: &str = "SELECT id, title, description, status, due_date FROM tasks";

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTaskRepository {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("invalid database url {:?}", config.url))?
            .create_if_missing(true);

        let pool = if config.is_in_memory() {
            // Every connection to `:memory:` is a separate database, so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            ensure_parent_dir(&config.url)?;
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool.connect_with(options).await.with_context(|| format!("connecting to {}", config.url))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL,
                due_date TEXT
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn create(&self, input: NewTask) -> Result<Task> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("INSERT INTO tasks (title, description, status, due_date) VALUES (?1, ?2, ?3, ?4)")
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(input.due_date.map(|d| d.to_string()))
            .execute(&mut *conn)
            .await?;
        let id = TaskId(result.last_insert_rowid());
        tracing::debug!(%id, "task inserted");
        Ok(input.into_task(id))
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(row_to_task).transpose()
    }

    async fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let mut conn = self.pool.acquire().await?;
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!("{SELECT_COLUMNS} WHERE status = ?1 ORDER BY id"))
                    .bind(status.as_str())
                    .fetch_all(&mut *conn)
                    .await?
            }
            None => sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id")).fetch_all(&mut *conn).await?,
        };
        rows.into_iter().map(row_to_task).collect()
    }

    async fn update(&self, id: TaskId, input: NewTask) -> Result<Option<Task>> {
        let mut conn = self.pool.acquire().await?;
        // Check and write are separate statements; a concurrent delete in between
        // leaves the UPDATE touching zero rows.
        if !exists(&mut conn, id).await? { return Ok(None) }

        sqlx::query("UPDATE tasks SET title = ?2, description = ?3, status = ?4, due_date = ?5 WHERE id = ?1")
            .bind(id.0)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(input.due_date.map(|d| d.to_string()))
            .execute(&mut *conn)
            .await?;

        Ok(Some(input.into_task(id)))
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        if !exists(&mut conn, id).await? { return Ok(false) }

        sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.0)
            .execute(&mut *conn)
            .await?;
        tracing::debug!(%id, "task deleted");
        Ok(true)
    }
}

async fn exists(conn: &mut sqlx::pool::PoolConnection<Sqlite>, id: TaskId) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM tasks WHERE id = ?1")
        .bind(id.0)
        .fetch_optional(&mut **conn)
        .await?;
    Ok(row.is_some())
}

fn row_to_task(row: SqliteRow) -> Result<Task> {
    let id = TaskId(row.try_get("id")?);
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let status_str: String = row.try_get("status")?;
    let due_date_str: Option<String> = row.try_get("due_date")?;

    let status = status_str
        .parse::<TaskStatus>()
        .with_context(|| format!("task {id} has unknown status {status_str:?}"))?;
    // Empty text is what older rows hold when the client sent "".
    let due_date = match due_date_str.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<DueDate>().with_context(|| format!("task {id} has malformed due date {raw:?}"))?),
    };

    Ok(Task { id, title, description, status, due_date })
}

/// SQLite creates the file but not its directory.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://").or_else(|| database_url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
