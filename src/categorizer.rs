//! Generative-model implementation of [`Categorizer`].

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ai_client::{ContentPart, TextGenerator};
use crate::category::GroceryCategory;
use crate::errors::AiError;
use crate::grocery::{CategoryAssignment, Categorizer};
use crate::response_parsing::{parse_json_response, JsonShape};

/// Categorizer that prompts the model with the recipe titles and category vocabulary
pub struct AiCategorizer {
    generator: Arc<dyn TextGenerator>,
}

impl AiCategorizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

/// Build the categorization prompt
pub fn categorization_prompt(ingredients: &[String], recipe_titles: &[String]) -> String {
    let mut prompt = String::from(
        "You are a professional chef organizing a grocery list. Categorize these ingredients into appropriate culinary categories.\n\n",
    );

    prompt.push_str("The recipes I'm planning to make include:\n");
    for title in recipe_titles {
        let _ = writeln!(prompt, "- {title}");
    }

    prompt.push_str("\nIngredients to categorize:\n");
    for ingredient in ingredients {
        let _ = writeln!(prompt, "{ingredient}");
    }

    prompt.push_str(
        "\nReturn ONLY a raw JSON array, without markdown formatting or explanation text. \
         Each object MUST have these exact fields:\n\
         - \"ingredient\": the exact ingredient name from my list (copy exactly, preserve casing)\n\
         - \"category\": one of these categories (copy exactly, preserve casing):\n",
    );
    for category in GroceryCategory::ALL {
        match category.hint() {
            Some(hint) => {
                let _ = writeln!(prompt, "  - {} ({hint})", category.label());
            }
            None => {
                let _ = writeln!(prompt, "  - {}", category.label());
            }
        }
    }

    prompt.push_str(
        "\nThe category should match how these items are organized in a grocery store and consider the cuisines of the recipes.",
    );
    prompt
}

#[async_trait]
impl Categorizer for AiCategorizer {
    #[instrument(skip_all, fields(ingredients = ingredients.len(), recipes = recipe_titles.len()))]
    async fn categorize(
        &self,
        ingredients: &[String],
        recipe_titles: &[String],
    ) -> Result<Vec<CategoryAssignment>, AiError> {
        let prompt = categorization_prompt(ingredients, recipe_titles);
        let text = self.generator.generate(vec![ContentPart::text(prompt)]).await?;

        let assignments: Vec<CategoryAssignment> = parse_json_response(&text, JsonShape::Array)?;
        debug!(assignments = assignments.len(), "Received category assignments");
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_everything() {
        let prompt = categorization_prompt(
            &["flour".to_string(), "sugar (g)".to_string()],
            &["Pancakes".to_string()],
        );
        assert!(prompt.contains("- Pancakes\n"));
        assert!(prompt.contains("\nsugar (g)\n"));
        assert!(prompt.contains("  - Produce (fresh fruits and vegetables)\n"));
        assert!(prompt.contains("  - Spices & Herbs\n"));
        assert!(prompt.contains("  - Other\n"));
    }
}
