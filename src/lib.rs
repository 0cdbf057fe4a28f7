pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod infrastructure;

use axum::Router;

use crate::application::task_service::TaskServiceImpl;
use crate::config::DatabaseConfig;
use crate::domain::repository::TaskRepository;
use crate::http::routing::{self, tasks};
use crate::infrastructure::sqlite_repo::SqliteTaskRepository;

/// Service over a connected store whose table is guaranteed to exist.
pub async fn open_service(database: &DatabaseConfig) -> anyhow::Result<TaskServiceImpl<SqliteTaskRepository>> {
    let repo = SqliteTaskRepository::connect(database).await?;
    repo.init().await?;
    Ok(TaskServiceImpl::new(repo))
}

pub fn build_router(service: TaskServiceImpl<SqliteTaskRepository>) -> Router {
    routing::app(tasks::router(tasks::AppState { service }))
}
