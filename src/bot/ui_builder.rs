//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::grocery::CategorizationOutcome;
use crate::grocery_list::{GroceryListView, GroceryPhase, GroceryScreen};
use crate::localization::{t_args_lang, t_lang};
use crate::meal_plan::PlannedMeal;
use crate::recipe_model::{MealPlanEntry, Recipe, RecipeDraft, RecipeId};
use std::collections::HashMap;

/// Telegram allows at most 100 buttons per keyboard; two rows go to the actions
pub const MAX_GROCERY_BUTTONS: usize = 90;

const BUTTON_LABEL_LIMIT: usize = 32;

fn truncate_label(text: &str) -> String {
    if text.chars().count() > BUTTON_LABEL_LIMIT {
        let head: String = text.chars().take(BUTTON_LABEL_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Format a captured draft for review
pub fn format_recipe_review(draft: &RecipeDraft, language_code: Option<&str>) -> String {
    let mut result = format!(
        "📝 {}\n\n🍽️ {}\n\n{}\n",
        t_lang("review-title", language_code),
        draft.title,
        t_lang("review-ingredients", language_code)
    );

    for ingredient in &draft.ingredients {
        if ingredient.quantity.is_empty() {
            result.push_str(&format!("• {}\n", ingredient.name));
        } else {
            result.push_str(&format!("• {} → {}\n", ingredient.quantity, ingredient.name));
        }
    }

    if !draft.procedure.is_empty() {
        result.push_str(&format!("\n{}\n", t_lang("review-procedure", language_code)));
        for (i, step) in draft.procedure.iter().enumerate() {
            let step_number = i + 1;
            let link = draft
                .timestamps
                .iter()
                .find(|t| t.step as usize == step_number)
                .and_then(|t| t.url.as_deref());
            match link {
                Some(url) => result.push_str(&format!("{step_number}. {step} ({url})\n")),
                None => result.push_str(&format!("{step_number}. {step}\n")),
            }
        }
    }

    if !draft.suggested_tags.is_empty() {
        result.push_str(&format!(
            "\n🏷️ {}\n",
            draft.suggested_tags.join(", ")
        ));
    }

    result
}

/// Confirm / rename / cancel keyboard for a captured draft
pub fn create_recipe_review_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(
                format!("✅ {}", t_lang("review-confirm", language_code)),
                "recipe_confirm",
            ),
            InlineKeyboardButton::callback(
                format!("✏️ {}", t_lang("review-rename", language_code)),
                "recipe_rename",
            ),
        ],
        vec![InlineKeyboardButton::callback(
            format!("❌ {}", t_lang("cancel", language_code)),
            "recipe_cancel",
        )],
    ])
}

/// Numbered list of a user's recipes
pub fn format_recipe_list(recipes: &[Recipe], language_code: Option<&str>) -> String {
    if recipes.is_empty() {
        return t_lang("recipes-empty", language_code);
    }

    let mut result = format!("📚 {}\n\n", t_lang("recipes-title", language_code));
    for recipe in recipes {
        let star = if recipe.is_favorite { "⭐ " } else { "" };
        let servings = recipe.servings.to_string();
        let meals = recipe.number_of_meals.to_string();
        result.push_str(&format!(
            "{star}#{} {} ({})\n",
            recipe.id,
            recipe.title,
            t_args_lang(
                "recipes-servings",
                &[("servings", servings.as_str()), ("meals", meals.as_str())],
                language_code
            )
        ));
    }
    result.push_str(&format!("\n{}", t_lang("recipes-hint", language_code)));
    result
}

/// Today's meals with their ingredients and steps
pub fn format_todays_meals(meals: &[PlannedMeal], language_code: Option<&str>) -> String {
    if meals.is_empty() {
        return format!(
            "{}\n\n{}",
            t_lang("today-empty", language_code),
            t_lang("today-empty-hint", language_code)
        );
    }

    let mut result = format!("🍳 {}\n", t_lang("today-title", language_code));
    for meal in meals {
        let servings = meal.servings.to_string();
        result.push_str(&format!(
            "\n{} · {} ({})\n",
            t_lang(&format!("slot-{}", meal.slot.as_str()), language_code),
            meal.recipe.title,
            t_args_lang("today-serves", &[("servings", servings.as_str())], language_code)
        ));
        for ingredient in &meal.recipe.ingredients {
            result.push_str(&format!("  • {} {}\n", ingredient.quantity, ingredient.name));
        }
        for (i, step) in meal.recipe.procedure.iter().enumerate() {
            result.push_str(&format!("  {}. {}\n", i + 1, step));
        }
        if let Some(url) = &meal.recipe.url {
            result.push_str(&format!("  ▶️ {url}\n"));
        }
    }
    result
}

/// Entries planned on one date, with entry ids for `/unplan`
pub fn format_meals_for_date(
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    language_code: Option<&str>,
) -> String {
    if entries.is_empty() {
        return t_lang("meals-empty", language_code);
    }

    let mut sorted: Vec<&MealPlanEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.slot);

    let mut result = String::new();
    for entry in sorted {
        let title = recipes
            .get(&entry.recipe_id)
            .map(|r| r.title.clone())
            .unwrap_or_else(|| t_lang("meals-deleted-recipe", language_code));
        let servings = entry
            .servings
            .map(|s| format!(" ×{s}"))
            .unwrap_or_default();
        result.push_str(&format!(
            "[{}] {} · {}{}\n",
            entry.id.unwrap_or_default(),
            t_lang(&format!("slot-{}", entry.slot.as_str()), language_code),
            title,
            servings
        ));
    }
    result
}

/// Full grocery screen message
pub fn format_grocery_screen(screen: &GroceryScreen, language_code: Option<&str>) -> String {
    let Some(view) = screen.view() else {
        return t_lang("grocery-expired", language_code);
    };

    let range = screen.range().map(|r| r.to_string()).unwrap_or_default();
    let mut result = format!(
        "🛒 {}\n",
        t_args_lang("grocery-title", &[("range", range.as_str())], language_code)
    );

    let meals = screen.included_meals();
    if !meals.is_empty() {
        let items = view.len().to_string();
        let count = meals.len().to_string();
        result.push_str(&format!(
            "{}\n",
            t_args_lang(
                "grocery-summary",
                &[("items", items.as_str()), ("meals", count.as_str())],
                language_code
            )
        ));
        for meal in meals {
            result.push_str(&format!(
                "  {} · {} · {} ×{}\n",
                meal.date.format("%a %b %-d"),
                t_lang(&format!("slot-{}", meal.slot.as_str()), language_code),
                meal.recipe_title,
                meal.servings
            ));
        }
    }

    if let GroceryPhase::Ready { outcome } = screen.phase() {
        match outcome {
            CategorizationOutcome::Complete => {}
            CategorizationOutcome::Partial { uncategorized } => {
                let count = uncategorized.to_string();
                result.push_str(&format!(
                    "\n⚠️ {}\n",
                    t_args_lang("grocery-partial", &[("count", count.as_str())], language_code)
                ));
            }
            CategorizationOutcome::Failed { .. } => {
                result.push_str(&format!("\n⚠️ {}\n", t_lang("grocery-uncategorized", language_code)));
            }
        }
    }

    if view.is_empty() {
        result.push_str(&format!("\n{}", t_lang("grocery-no-items", language_code)));
        return result;
    }

    result.push_str(&format_grocery_lines(view));
    result
}

/// Lines grouped under category headers, checked lines marked
pub fn format_grocery_lines(view: &GroceryListView) -> String {
    let mut result = String::new();
    for (category, items) in view.grouped() {
        result.push_str(&format!("\n{}\n", category.label()));
        for (index, line) in items {
            let mark = if view.is_checked(index) { "✅" } else { "▫️" };
            result.push_str(&format!("{mark} {} ({})\n", line.name, line.formatted_quantity()));
        }
    }
    result
}

/// One toggle button per line plus clear / export actions
pub fn create_grocery_keyboard(view: &GroceryListView, language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = view
        .lines()
        .iter()
        .enumerate()
        .take(MAX_GROCERY_BUTTONS)
        .map(|(index, line)| {
            let mark = if view.is_checked(index) { "☑" } else { "☐" };
            let label = truncate_label(&format!("{} ({})", line.name, line.formatted_quantity()));
            vec![InlineKeyboardButton::callback(
                format!("{mark} {label}"),
                format!("grocery_toggle_{index}"),
            )]
        })
        .collect();

    buttons.push(vec![
        InlineKeyboardButton::callback(
            format!("🧹 {}", t_lang("grocery-clear-checked", language_code)),
            "grocery_clear",
        ),
        InlineKeyboardButton::callback(
            format!("📋 {}", t_lang("grocery-export", language_code)),
            "grocery_export",
        ),
    ]);

    InlineKeyboardMarkup::new(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("flour (1 cup)"), "flour (1 cup)");
        let long = "extra virgin olive oil from a small farm (2 tbsp)";
        let truncated = truncate_label(long);
        assert_eq!(truncated.chars().count(), BUTTON_LABEL_LIMIT);
        assert!(truncated.ends_with("..."));
    }
}
