//! API Module
//!
//! HTTP transport for the hub and its regions.
//!
//! # Endpoints
//! - `PUT /regions/:region/set` - Store a key-value pair
//! - `GET /regions/:region/get/:key` - Retrieve a value by key
//! - `DELETE /regions/:region/del/:key` - Delete a key
//! - `GET /regions/:region/stats` - Region statistics
//! - `GET /regions` - List regions
//! - `POST /regions/:region` / `DELETE /regions/:region` - Join / leave
//! - `GET /replication/stats` - Hub statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
