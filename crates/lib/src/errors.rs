use std::time::Duration;
use thiserror::Error;

/// The category of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    Timeout,
    Quota,
    Transport,
    InvalidRequest,
}

/// Errors raised by an `AiProvider` while producing a completion.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Generation call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider quota exhausted: {0}")]
    Quota(String),
    #[error("Transport failure talking to provider: {0}")]
    Transport(String),
    #[error("Provider rejected the request: {0}")]
    InvalidRequest(String),
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
}

impl ModelError {
    pub fn kind(&self) -> ModelErrorKind {
        match self {
            ModelError::Timeout(_) => ModelErrorKind::Timeout,
            ModelError::Quota(_) => ModelErrorKind::Quota,
            ModelError::InvalidRequest(_) => ModelErrorKind::InvalidRequest,
            ModelError::Transport(_) | ModelError::ReqwestClientBuild(_) => ModelErrorKind::Transport,
        }
    }

    /// Maps a non-success HTTP status and body into a `ModelError`.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ModelError::Quota(body)
        } else if status.is_client_error() {
            ModelError::InvalidRequest(format!("status {status}: {body}"))
        } else {
            ModelError::Transport(format!("status {status}: {body}"))
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Transport(format!("request timed out: {err}"))
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

/// A boundary-marked payload that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed structured payload at line {line}, column {column}: {message}")]
pub struct ParseError {
    /// The text that failed to decode.
    pub raw: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Fatal failures of the intent analysis stage.
#[derive(Error, Debug)]
pub enum IntentError {
    #[error("Entry title must not be empty")]
    EmptyTitle,
    #[error("Intent generation call failed: {0}")]
    Model(#[from] ModelError),
    #[error("Response is missing the <{0}> section")]
    MissingSection(&'static str),
    #[error("Intent analysis is missing mandatory field `{0}`")]
    MissingField(&'static str),
    #[error("Intent analysis could not be decoded: {0}")]
    Parse(#[from] ParseError),
}

/// Failures of a single search lookup. These never leave the research stage.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Search backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Search lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to parse search results: {0}")]
    Parse(String),
}

/// Failures of the external record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Failures while loading or validating the pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(String),
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Missing provider setting: {0}")]
    MissingProvider(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}
