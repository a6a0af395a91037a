use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache_policy::CachePolicy;

/// Fatal: the server must not start serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("build directory {} does not exist; build the client first", path.display())]
    BuildDirMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("build directory {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

/// Failure reading the entry document while answering a request.
#[derive(Debug, Error)]
pub enum EntryDocumentError {
    #[error("entry document {} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read entry document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EntryDocumentError {
    pub fn status(&self) -> StatusCode {
        match self {
            EntryDocumentError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntryDocumentError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EntryDocumentError {
    fn into_response(self) -> Response {
        // The path stays in the logs, not in the body.
        let mut response = self.status().into_response();
        CachePolicy::NoStore.apply(response.headers_mut());
        response
    }
}
