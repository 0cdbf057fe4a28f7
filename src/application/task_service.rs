use crate::domain::error::{TaskError, TaskResult};
use crate::domain::repository::TaskRepository;
use crate::domain::task::{Task, TaskId, TaskPayload, TaskStatus};
use async_trait::async_trait;

#[async_trait]
pub trait TaskService: Send + Sync + 'static {
    async fn create(&self, payload: TaskPayload) -> TaskResult<Task>;
    async fn get(&self, id: TaskId) -> TaskResult<Task>;
    /// A filter outside the status set is ignored and every task is returned.
    async fn list(&self, status: Option<String>) -> TaskResult<Vec<Task>>;
    async fn update(&self, id: TaskId, payload: TaskPayload) -> TaskResult<Task>;
    async fn delete(&self, id: TaskId) -> TaskResult<()>;
}

#[derive(Clone)]
pub struct TaskServiceImpl<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TaskRepository> TaskService for TaskServiceImpl<R> {
    async fn create(&self, payload: TaskPayload) -> TaskResult<Task> {
        let input = payload.validate()?;
        let task = self.repo.create(input).await?;
        tracing::info!(id = %task.id, status = %task.status, "task created");
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> TaskResult<Task> {
        self.repo.get(id).await?.ok_or(TaskError::NotFound(id))
    }

    async fn list(&self, status: Option<String>) -> TaskResult<Vec<Task>> {
        let filter = status.as_deref().and_then(|raw| match raw.parse::<TaskStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                tracing::debug!(filter = raw, "unrecognized status filter, listing all tasks");
                None
            }
        });
        Ok(self.repo.list(filter).await?)
    }

    async fn update(&self, id: TaskId, payload: TaskPayload) -> TaskResult<Task> {
        let input = payload.validate()?;
        let task = self.repo.update(id, input).await?.ok_or(TaskError::NotFound(id))?;
        tracing::info!(%id, status = %task.status, "task updated");
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> TaskResult<()> {
        if !self.repo.delete(id).await? { return Err(TaskError::NotFound(id)) }
        tracing::info!(%id, "task deleted");
        Ok(())
    }
}
