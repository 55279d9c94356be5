use crate::model::TaskId;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not_found - task {0} not found")]
    NotFound(TaskId),
    #[error("persistence_failure - {source}")]
    Persistence {
        #[source]
        source: BoxError,
    },
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
}

impl AppError {
    pub fn not_found(id: TaskId) -> Self {
        Self::NotFound(id)
    }

    pub fn persistence<E: Into<BoxError>>(source: E) -> Self {
        Self::Persistence {
            source: source.into(),
        }
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Persistence { .. } => "persistence_failure",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotFound(id) => format!("task {id} not found"),
            Self::Persistence { source } => source.to_string(),
            Self::InvalidInput(message) => message.clone(),
            Self::InvalidData(message) => message.clone(),
        }
    }
}
