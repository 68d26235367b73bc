//! HTTP surface of the comic generator

pub mod error;
pub mod http_server;

pub use error::ApiError;
pub use http_server::{build_router, start_server, AppState};
