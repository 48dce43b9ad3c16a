use serde::{Deserialize, Serialize};

const SUMMARY_CHARS: usize = 150;

/// Recipe record as exchanged with the `/recipes` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub short_description: String,
    pub cook_time: f64, // minutes
    pub products: Vec<String>,
    pub picture: String,
    pub long_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Recipe {
    /// Short description cut down for list views.
    pub fn summary(&self) -> String {
        let mut chars = self.short_description.chars();
        let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Form input for a new recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub short_description: String,
    pub cook_time: f64,
    pub products: Vec<String>,
    pub picture: String,
    pub long_description: String,
    pub tags: Vec<String>,
}
