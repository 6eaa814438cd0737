//! HTTP surface: health endpoint, WebSocket upgrade, static assets

pub mod routes;

pub use routes::build_router;
