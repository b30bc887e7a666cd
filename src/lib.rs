//! Recipe Gate - request admission control and a bounded entity cache
//!
//! A fixed-window rate limiter guarding authentication and AI-generation
//! endpoints, plus an LRU/TTL recipe cache with optional durable backing.

pub mod admission;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use admission::{AdmissionController, AdmissionResult, ResourceClass};
pub use api::AppState;
pub use cache::EntityCache;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
