use thiserror::Error;

use super::task::TaskId;

/// Rejections raised before the store is touched. The messages are the
/// wire contract and stay in Portuguese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Título e status são obrigatórios")]
    TitleAndStatusRequired,
    #[error("Status inválido")]
    InvalidStatus,
    #[error("Data de vencimento inválida")]
    InvalidDueDate,
    #[error("Corpo da requisição inválido")]
    MalformedBody,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Tarefa não encontrada")]
    NotFound(TaskId),
    /// Storage or runtime fault. The cause is kept for logging only.
    #[error("Erro interno no servidor")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self { Self::Internal(err) }
}

pub type TaskResult<T> = Result<T, TaskError>;
