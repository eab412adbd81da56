use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{service} credentials are not configured")]
    CredentialsMissing { service: String },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Error making API request: {0}")]
    Transport(String),

    #[error("Error: {0}")]
    AnalysisData(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A price check is already in progress")]
    CycleInProgress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn credentials_missing(service: &str) -> Self {
        AppError::CredentialsMissing {
            service: service.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
