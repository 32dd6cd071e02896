use std::fmt::Display;

use actix_web::HttpResponse;
use actix_web::error::{BlockingError, ResponseError};
use actix_web::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Store error: {0}")]
    Store(#[from] heritage_store_db::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Server startup failed: {reason}")]
    Startup { reason: String },

    #[error("Blocking task failed: {reason}")]
    Blocking { reason: String },
}

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Extension trait for adding context to IO errors
pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CatalogError::Io {
            context: context.into(),
            source: e,
        })
    }
}

/// Wraps a [`CatalogError`] escaping a request handler.
///
/// The client gets a JSON 500; the details go to the log.
#[derive(Debug)]
pub struct HttpError {
    err: CatalogError,
}

impl Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!("Request failed: {}", self.err);
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": "Internal server error" }))
    }
}

impl From<CatalogError> for HttpError {
    fn from(err: CatalogError) -> HttpError {
        HttpError { err }
    }
}

impl From<BlockingError> for HttpError {
    fn from(e: BlockingError) -> HttpError {
        HttpError {
            err: ServerError::Blocking {
                reason: e.to_string(),
            }
            .into(),
        }
    }
}

pub type ServerResult = std::result::Result<HttpResponse, HttpError>;
