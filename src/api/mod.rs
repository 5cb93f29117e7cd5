//! API Module
//!
//! HTTP handlers and routing for the edge cache admin API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value in one or more regions
//! - `GET /get/:region/:key` - Read a value from a region
//! - `DELETE /del/:key` - Delete a key
//! - `POST /invalidate/tag/:tag` - Tag invalidation
//! - `POST /invalidate/pattern` - Glob pattern invalidation
//! - `GET /stats` - Per-region statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
