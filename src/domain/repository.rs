use async_trait::async_trait;
use super::task::{NewTask, Task, TaskId, TaskStatus};

#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn create(&self, input: NewTask) -> anyhow::Result<Task>;
    async fn get(&self, id: TaskId) -> anyhow::Result<Option<Task>>;
    /// All tasks in id order, or only those with `status` when given.
    async fn list(&self, status: Option<TaskStatus>) -> anyhow::Result<Vec<Task>>;
    /// Overwrites every mutable field. `None` when the id is unknown.
    async fn update(&self, id: TaskId, input: NewTask) -> anyhow::Result<Option<Task>>;
    async fn delete(&self, id: TaskId) -> anyhow::Result<bool>;
}
