//! Admission Control Module
//!
//! Fixed-window request admission keyed by caller identity and resource class.

mod class;
mod controller;

#[cfg(test)]
mod property_tests;

pub use class::{AdmissionPolicy, ResourceClass};
pub use controller::{AdmissionController, AdmissionResult};

// == Public Constants ==
/// Identity used when no caller address can be resolved
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Default soft cap on tracked (identity, class) records
pub const DEFAULT_MAX_TRACKED: usize = 1000;
