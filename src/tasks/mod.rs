//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - TTL Expiry: one driver per region, removes entries as deadlines pass

mod expiry;

pub use expiry::spawn_expiry_task;
