use std::io;
use std::path::PathBuf;

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

/// Error types for the viewer
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("converter failed on {} (exit status {})", .path.display(), .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Conversion { path: PathBuf, code: Option<i32> },
    #[error("cannot launch converter `{program}`: {source}")]
    ConverterLaunch { program: String, source: io::Error },
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("no file masks given")]
    NoMasks,
    #[error("no files matched")]
    NoFiles,
    #[error("not found")]
    NotFound,
    #[error("invalid path")]
    InvalidPath,
    #[error("session state unavailable")]
    State,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewerError::NotFound => StatusCode::NOT_FOUND,
            ViewerError::InvalidPath | ViewerError::Unsupported(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
