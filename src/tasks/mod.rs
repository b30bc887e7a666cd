//! Background Tasks Module
//!
//! # Tasks
//! - Housekeeping: sweeps expired cache entries and stale admission records

mod cleanup;

pub use cleanup::spawn_cleanup_task;
