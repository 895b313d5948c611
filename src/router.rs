//! Prefix dispatch and the axum application.

use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use http::Method;
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, warn};

use crate::{
    error::ServeError,
    links::{UrlPath, DOWNLOAD_PREFIX, VIEW_PREFIX},
    listing::{list_directory, ListingPage},
    render,
    resolve::{relative_segments, resolve},
    respond::{respond, Disposition},
};

/// What a request path is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Download,
    View,
    Listing,
}

#[derive(Debug, Clone)]
struct Route {
    prefix: &'static str,
    endpoint: Endpoint,
}

/// Ordered `(prefix, endpoint)` table; the first matching prefix wins and
/// anything unmatched is a listing.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
            .route(DOWNLOAD_PREFIX, Endpoint::Download)
            .route(VIEW_PREFIX, Endpoint::View)
    }
}

impl Dispatcher {
    /// An empty table: every path is a listing.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn route(mut self, prefix: &'static str, endpoint: Endpoint) -> Self {
        self.routes.push(Route { prefix, endpoint });
        self
    }

    /// Picks the endpoint for `path` and returns it with the remainder.
    ///
    /// A prefix only matches a whole leading segment, and the remainder keeps
    /// its leading `/` (`/view/a.txt` gives `/a.txt`).
    pub fn dispatch<'a>(&self, path: &'a str) -> (Endpoint, &'a str) {
        self.routes
            .iter()
            .find_map(|route| {
                path.strip_prefix(route.prefix)
                    .filter(|rest| rest.starts_with('/'))
                    .map(|rest| (route.endpoint, rest))
            })
            .unwrap_or((Endpoint::Listing, path))
    }
}

/// Immutable per-process state shared by every request.
#[derive(Debug)]
pub struct AppState {
    root: PathBuf,
    dispatcher: Dispatcher,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// `root` must be absolute and canonical; see [`crate::config`].
    pub fn new(root: PathBuf, dispatcher: Dispatcher) -> Self {
        Self { root, dispatcher }
    }
}

#[derive(Deserialize, Debug, Default)]
struct ListingQuery {
    format: Option<String>,
}

/// Builds the application serving `root`.
pub fn app(root: PathBuf) -> Router {
    let state = Arc::new(AppState::new(root, Dispatcher::default()));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD])
        .allow_origin(Any);

    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle(State(state): State<SharedState>, request: Request) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
            "method not allowed",
        )
            .into_response();
    }

    let path = request.uri().path().to_string();
    let (endpoint, rest) = state.dispatcher.dispatch(&path);
    debug!("{} dispatched to {:?} with {}", path, endpoint, rest);

    let result = match endpoint {
        Endpoint::Download => serve_file(&state, rest, Disposition::Attachment, request).await,
        Endpoint::View => serve_file(&state, rest, Disposition::Inline, request).await,
        Endpoint::Listing => serve_listing(&state, rest, request).await,
    };

    result.unwrap_or_else(|err| {
        match &err {
            ServeError::PathTraversal { .. } => warn!("Path traversal attempt: {}", err),
            ServeError::InvalidEncoding(_) | ServeError::NotFound(_) => debug!("{}", err),
            _ => error!("Failed to serve {}: {}", path, err),
        }
        err.into_response()
    })
}

async fn serve_file(
    state: &AppState,
    rest: &str,
    disposition: Disposition,
    request: Request,
) -> Result<Response, ServeError> {
    let path = resolve(&state.root, rest)?;
    respond(&path, disposition, request).await
}

async fn serve_listing(
    state: &AppState,
    rest: &str,
    request: Request,
) -> Result<Response, ServeError> {
    let dir = resolve(&state.root, rest)?;
    let entries = list_directory(&dir)
        .await
        .map_err(ServeError::listing)?;
    let location = UrlPath::new(relative_segments(&state.root, &dir));
    let page = ListingPage::new(&location, entries);

    let query = Query::<ListingQuery>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    if query.format.as_deref() == Some("json") {
        return Ok(Json(page).into_response());
    }
    Ok(render::listing_page(&page).into_response())
}
