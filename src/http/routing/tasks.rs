use axum::extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State};
use axum::{http::StatusCode, routing::get, Json, Router};

use crate::{
    application::task_service::TaskService,
    domain::{
        error::{TaskError, TaskResult, ValidationError},
        task::{Task, TaskId, TaskPayload},
    },
    http::types::ApiMessage,
};

#[derive(Clone)]
pub struct AppState<S: TaskService> { pub service: S }

pub fn router<S: TaskService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/tarefas", get(list_tasks::<S>).post(create_task::<S>))
        .route("/tarefas/:id", get(get_task::<S>).put(update_task::<S>).delete(delete_task::<S>))
        .with_state(state)
}

async fn create_task<S: TaskService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> TaskResult<(StatusCode, Json<Task>)> {
    let Json(payload) = payload.map_err(malformed_body)?;
    let task = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

// Like a form lookup: the first `status` pair wins and an unreadable query means no filter.
async fn list_tasks<S: TaskService>(
    State(state): State<AppState<S>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> TaskResult<Json<Vec<Task>>> {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_else(|rejection| {
        tracing::debug!(%rejection, "unreadable query string, listing all tasks");
        Vec::new()
    });
    let status = pairs.into_iter().find(|(key, _)| key == "status").map(|(_, value)| value);
    Ok(Json(state.service.list(status).await?))
}

async fn get_task<S: TaskService>(State(state): State<AppState<S>>, id: Result<Path<String>, PathRejection>) -> TaskResult<Json<Task>> {
    let id = parse_id(id)?;
    Ok(Json(state.service.get(id).await?))
}

async fn update_task<S: TaskService>(
    State(state): State<AppState<S>>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> TaskResult<Json<Task>> {
    let id = parse_id(id)?;
    let Json(payload) = payload.map_err(malformed_body)?;
    Ok(Json(state.service.update(id, payload).await?))
}

async fn delete_task<S: TaskService>(State(state): State<AppState<S>>, id: Result<Path<String>, PathRejection>) -> TaskResult<Json<ApiMessage>> {
    let id = parse_id(id)?;
    state.service.delete(id).await?;
    Ok(Json(ApiMessage::task_deleted()))
}

// Only integer ids name a task; anything else is simply not found.
fn parse_id(raw: Result<Path<String>, PathRejection>) -> TaskResult<TaskId> {
    let Ok(Path(raw)) = raw else { return Err(TaskError::NotFound(TaskId(0))) };
    raw.parse().map_err(|_| TaskError::NotFound(TaskId(0)))
}

fn malformed_body(rejection: JsonRejection) -> TaskError {
    tracing::debug!(%rejection, "unreadable request body");
    ValidationError::MalformedBody.into()
}
