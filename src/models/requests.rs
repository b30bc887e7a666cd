//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::MAX_ID_LENGTH;
use crate::models::Recipe;

/// Maximum number of items accepted by a batch request
pub const MAX_BATCH_SIZE: usize = 100;

/// Validates a recipe id taken from a path or request body.
pub fn validate_id(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("Recipe id cannot be empty".to_string());
    }
    if id.len() > MAX_ID_LENGTH {
        return Some(format!(
            "Recipe id exceeds maximum length of {} bytes",
            MAX_ID_LENGTH
        ));
    }
    None
}

fn validate_batch_size(len: usize) -> Option<String> {
    if len > MAX_BATCH_SIZE {
        return Some(format!("Batch exceeds maximum size of {}", MAX_BATCH_SIZE));
    }
    None
}

/// Validates a recipe before it is cached.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_recipe(recipe: &Recipe) -> Option<String> {
    validate_id(&recipe.id)
}

/// Request body for `POST /api/recipes/batch/get`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchGetRequest {
    pub ids: Vec<String>,
}

impl BatchGetRequest {
    pub fn validate(&self) -> Option<String> {
        validate_batch_size(self.ids.len()).or_else(|| self.ids.iter().find_map(|id| validate_id(id)))
    }
}

/// Request body for `PUT /api/recipes/batch`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSetRequest {
    pub recipes: Vec<Recipe>,
}

impl BatchSetRequest {
    pub fn validate(&self) -> Option<String> {
        validate_batch_size(self.recipes.len())
            .or_else(|| self.recipes.iter().find_map(validate_recipe))
    }
}
