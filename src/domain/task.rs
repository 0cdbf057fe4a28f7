use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(TaskId) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[serde(rename = "pendente")]
    Pendente,
    #[serde(rename = "realizando")]
    Realizando,
    #[serde(rename = "concluída")]
    Concluida,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pendente, TaskStatus::Realizando, TaskStatus::Concluida];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pendente => "pendente",
            TaskStatus::Realizando => "realizando",
            TaskStatus::Concluida => "concluída",
        }
    }

    /// pendente -> realizando -> concluída -> pendente
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Pendente => TaskStatus::Realizando,
            TaskStatus::Realizando => TaskStatus::Concluida,
            TaskStatus::Concluida => TaskStatus::Pendente,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    // Exact, case-sensitive match; no trimming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL.into_iter().find(|st| st.as_str() == s).ok_or(ValidationError::InvalidStatus)
    }
}

/// Calendar date written as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueDate(pub NaiveDate);

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

impl FromStr for DueDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts single-digit months and days, so the shape is checked first.
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i { 4 | 7 => *b == b'-', _ => b.is_ascii_digit() });
        if !well_formed { return Err(ValidationError::InvalidDueDate); }
        NaiveDate::parse_from_str(s, DUE_DATE_FORMAT).map(DueDate).map_err(|_| ValidationError::InvalidDueDate)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0.format(DUE_DATE_FORMAT)) }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.collect_str(self) }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "data_vencimento")]
    pub due_date: Option<DueDate>,
}

/// Request body of create and update, exactly as the client sent it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "data_vencimento")]
    pub due_date: Option<String>,
}

/// The four mutable fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DueDate>,
}

impl NewTask {
    pub fn into_task(self, id: TaskId) -> Task {
        Task { id, title: self.title, description: self.description, status: self.status, due_date: self.due_date }
    }
}

impl TaskPayload {
    /// Presence first, then status membership, then the due date. Stops at the first failure.
    pub fn validate(self) -> Result<NewTask, ValidationError> {
        let title = self.title.filter(|t| !t.is_empty());
        let status = self.status.filter(|s| !s.is_empty());
        let (Some(title), Some(status)) = (title, status) else {
            return Err(ValidationError::TitleAndStatusRequired);
        };
        let status: TaskStatus = status.parse()?;
        let due_date = match self.due_date.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<DueDate>()?),
        };
        Ok(NewTask { title, description: self.description, status, due_date })
    }
}
