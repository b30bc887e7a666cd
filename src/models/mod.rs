//! Domain entity and HTTP request/response models

pub mod recipe;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use recipe::{Difficulty, Recipe};
pub use requests::{
    validate_id, validate_recipe, BatchGetRequest, BatchSetRequest, MAX_BATCH_SIZE,
};
pub use responses::{
    BatchGetResponse, BatchSetResponse, DeleteResponse, HealthResponse, SetResponse,
    StatsResponse,
};
