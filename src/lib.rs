//! Browse, view and download a directory tree over HTTP.
//!
//! Requests are dispatched by path prefix: `/download/...` streams a file as
//! an attachment, `/view/...` streams it inline with a sniffed content type,
//! and every other path renders a listing of the matching directory. All
//! paths are resolved against a single root and can never leave it.

pub mod config;
pub mod error;
pub mod links;
pub mod listing;
pub mod render;
pub mod resolve;
pub mod respond;
pub mod router;
pub mod sniff;

pub use config::{Args, Config};
pub use error::{ConfigError, ServeError};
pub use router::app;
