pub mod config;
pub mod credentials;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod model;
pub mod provider;
pub mod resources;
pub mod routes;
pub mod schema;
