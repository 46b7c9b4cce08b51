//! Conversation state for reviewing captured recipes.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::recipe_model::RecipeDraft;

/// Where a chat is in the capture review flow
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum RecipeDialogueState {
    #[default]
    Start,
    /// A captured draft is shown with confirm / rename / cancel buttons
    ReviewRecipe {
        draft: RecipeDraft,
        language_code: Option<String>,
        message_id: Option<i32>,
    },
    /// Waiting for a new title for the draft under review
    WaitingForRecipeName {
        draft: RecipeDraft,
        language_code: Option<String>,
    },
}

pub type RecipeDialogue = Dialogue<RecipeDialogueState, InMemStorage<RecipeDialogueState>>;

/// Validates a recipe name input
pub fn validate_recipe_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > 255 {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_name_validation() {
        assert!(validate_recipe_name("Chocolate Chip Cookies").is_ok());
        assert!(validate_recipe_name("  Mom's Lasagna  ").is_ok());

        assert_eq!(validate_recipe_name(""), Err("empty"));
        assert_eq!(validate_recipe_name("   "), Err("empty"));
        assert_eq!(validate_recipe_name(&"a".repeat(256)), Err("too_long"));
    }

    #[test]
    fn test_recipe_name_trimming() {
        assert_eq!(validate_recipe_name("  Crêpes  ").unwrap(), "Crêpes");
        assert!(validate_recipe_name(&"é".repeat(200)).is_ok());
    }
}
