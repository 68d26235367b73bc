//! Service layer shared by the CLI and the HTTP server

pub mod comic_service;

pub use comic_service::{generate_comic, ComicInput, ComicOutput, EncodedImage};
