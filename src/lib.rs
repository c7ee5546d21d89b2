// Library exports for photoshare
// This allows integration tests and the binary to share the same modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod photos;
pub mod routes;
pub mod state;
