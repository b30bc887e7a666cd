//! Recipe entity
//!
//! The record cached after a database fetch or an AI generation.

use serde::{Deserialize, Serialize};

use crate::cache::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A recipe as stored by the application, in its camelCase wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub servings: u32,
    /// Minutes
    pub prep_time: u32,
    /// Minutes
    pub cook_time: u32,
    pub difficulty: Difficulty,
    pub cuisine: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl Entity for Recipe {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
impl Recipe {
    /// Minimal recipe for tests.
    pub fn sample(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            description: format!("{} for two", title),
            ingredients: vec!["2 eggs".to_string(), "1 tomato".to_string()],
            instructions: vec!["Cook it.".to_string()],
            servings: 2,
            prep_time: 10,
            cook_time: 20,
            difficulty: Difficulty::Easy,
            cuisine: "Mediterranean".to_string(),
            tags: vec![],
            image_url: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            is_favorite: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_wire_shape_is_camel_case() {
        let json = serde_json::to_value(Recipe::sample("r1", "Shakshuka")).unwrap();

        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["prepTime"], 10);
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_recipe_deserialize_defaults() {
        let json = r#"{
            "id": "r9", "userId": "u", "title": "Toast", "description": "",
            "ingredients": ["bread"], "instructions": ["toast"], "servings": 1,
            "prepTime": 1, "cookTime": 2, "difficulty": "hard", "cuisine": "none",
            "createdAt": "x", "updatedAt": "y"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();

        assert_eq!(recipe.id(), "r9");
        assert_eq!(recipe.difficulty, Difficulty::Hard);
        assert!(recipe.tags.is_empty());
        assert_eq!(recipe.is_favorite, None);
    }
}
