//! Error types for request handling and startup.

use std::{
    io,
    path::{Path, PathBuf},
};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Everything that can go wrong while serving a single request.
///
/// The `Display` output carries filesystem paths and OS error text and is
/// meant for the log. Clients only ever see [`ServeError::client_message`].
#[derive(Debug, Error)]
pub enum ServeError {
    /// The request path contains a malformed percent-escape, decodes to
    /// invalid UTF-8, or contains a NUL byte.
    #[error("malformed percent-encoding in request path {0:?}")]
    InvalidEncoding(String),

    /// The normalized path left the served root.
    #[error("request path {requested:?} resolves to {} outside the served root", resolved.display())]
    PathTraversal {
        /// The decoded request path.
        requested: String,
        /// Where the path ended up after normalization.
        resolved: PathBuf,
    },

    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is a directory", .0.display())]
    IsADirectory(PathBuf),

    #[error("permission denied for {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other I/O failure, including a transfer interrupted mid-way.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory behind a listing request could not be read.
    #[error("failed to list directory: {0}")]
    Listing(#[source] Box<ServeError>),
}

impl ServeError {
    /// Classifies an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => ServeError::NotFound(path),
            io::ErrorKind::PermissionDenied => ServeError::PermissionDenied(path),
            io::ErrorKind::NotADirectory => ServeError::NotADirectory(path),
            io::ErrorKind::IsADirectory => ServeError::IsADirectory(path),
            _ => ServeError::Io { path, source: err },
        }
    }

    /// Wraps a lister error; every listing failure is a server error.
    pub fn listing(err: ServeError) -> Self {
        ServeError::Listing(Box::new(err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::InvalidEncoding(_) => StatusCode::BAD_REQUEST,
            ServeError::PathTraversal { .. }
            | ServeError::NotFound(_)
            | ServeError::IsADirectory(_) => StatusCode::NOT_FOUND,
            ServeError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServeError::NotADirectory(_) | ServeError::Io { .. } | ServeError::Listing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short plain-text body sent to the client.
    ///
    /// A traversal attempt is indistinguishable from a missing file.
    pub fn client_message(&self) -> &'static str {
        match self {
            ServeError::InvalidEncoding(_) => "invalid file name",
            ServeError::PathTraversal { .. }
            | ServeError::NotFound(_)
            | ServeError::IsADirectory(_) => "file not found",
            ServeError::NotADirectory(_) => "not a directory",
            ServeError::PermissionDenied(_) => "permission denied",
            ServeError::Io { .. } => "failed to read from the filesystem",
            ServeError::Listing(_) => "failed to list directory",
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}

/// Startup failures. These are the only errors that terminate the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve root directory '{}': {source}", path.display())]
    UnresolvableRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("root path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
}
