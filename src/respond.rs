//! Streams a resolved file back to the client.

use std::{
    convert::Infallible,
    io::{self, SeekFrom},
    path::Path,
};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::io::ReaderStream;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::info;

use crate::{
    error::ServeError,
    sniff::{detect_content_type, SNIFF_LEN},
};

/// How the browser should treat the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Render in the browser, typed by sniffing.
    Inline,
    /// Force a download.
    Attachment,
}

impl Disposition {
    fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }

    /// `Content-Disposition` value carrying `filename`.
    ///
    /// Names that are not plain printable ASCII get an `_`-substituted
    /// `filename` plus an RFC 5987 `filename*` with the exact name.
    pub fn header_value(self, filename: &str) -> HeaderValue {
        let fallback: String = filename
            .chars()
            .map(|c| {
                if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let mut value = format!("{}; filename=\"{}\"", self.as_str(), fallback);
        if fallback != filename {
            value.push_str("; filename*=UTF-8''");
            value.push_str(&urlencoding::encode(filename));
        }
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(self.as_str()))
    }
}

/// Serves the regular file at `path`.
///
/// Directories are never served as content; they only exist as listings.
pub async fn respond(
    path: &Path,
    disposition: Disposition,
    request: Request,
) -> Result<Response, ServeError> {
    let metadata = fs::metadata(path).await.map_err(|e| match ServeError::from_io(path, e) {
        // A file used as a directory component, e.g. `a.txt/b`.
        ServeError::NotADirectory(p) => ServeError::NotFound(p),
        other => other,
    })?;
    if metadata.is_dir() {
        return Err(ServeError::IsADirectory(path.to_path_buf()));
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    info!("Serving {} ({})", path.display(), disposition.as_str());

    match disposition {
        Disposition::Attachment => serve_attachment(path, &filename, request).await,
        Disposition::Inline => serve_inline(path, &filename).await,
    }
}

async fn serve_attachment(
    path: &Path,
    filename: &str,
    request: Request,
) -> Result<Response, ServeError> {
    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        // The file vanished after it was checked.
        return Err(ServeError::NotFound(path.to_path_buf()));
    }

    let mut response = response.into_response();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        response.headers_mut().insert(
            header::CONTENT_DISPOSITION,
            Disposition::Attachment.header_value(filename),
        );
    }
    Ok(response)
}

async fn serve_inline(path: &Path, filename: &str) -> Result<Response, ServeError> {
    let io_err = |e: io::Error| ServeError::from_io(path, e);

    let mut file = File::open(path).await.map_err(io_err)?;
    let len = file.metadata().await.map_err(io_err)?.len();

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(io_err)?;
    let content_type = detect_content_type(&head);
    file.seek(SeekFrom::Start(0)).await.map_err(io_err)?;

    // Never send more than Content-Length promises, even if the file grows.
    let body = Body::from_stream(ReaderStream::new(file.take(len)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            Disposition::Inline.header_value(filename),
        )
        .body(body)
        .map_err(|e| ServeError::Io {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })
}
