//! Meal plan queries over in-memory snapshots of entries and recipes.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

use crate::config::GroceryConfig;
use crate::recipe_model::{DateRange, MealPlanEntry, MealSlot, Recipe, RecipeId};

/// A planned meal resolved against its recipe
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMeal {
    pub entry_id: Option<i64>,
    pub slot: MealSlot,
    pub recipe: Recipe,
    /// Planned servings, or the configured default
    pub servings: u32,
}

/// One meal counted in a grocery list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedMeal {
    pub date: NaiveDate,
    pub slot: MealSlot,
    pub recipe_title: String,
    pub servings: u32,
}

/// Entries whose date falls inside the range, in their original order
pub fn entries_in_range(entries: &[MealPlanEntry], range: &DateRange) -> Vec<MealPlanEntry> {
    entries
        .iter()
        .filter(|e| range.contains(e.date))
        .cloned()
        .collect()
}

fn planned_servings(entry: &MealPlanEntry, config: &GroceryConfig) -> u32 {
    entry
        .servings
        .filter(|s| *s > 0)
        .unwrap_or(config.default_planned_servings)
}

/// Meals planned for a day, ordered breakfast, lunch, dinner
///
/// Entries pointing at deleted recipes are dropped.
pub fn todays_meals(
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    today: NaiveDate,
    config: &GroceryConfig,
) -> Vec<PlannedMeal> {
    let mut meals: Vec<PlannedMeal> = entries
        .iter()
        .filter(|e| e.date == today)
        .filter_map(|entry| match recipes.get(&entry.recipe_id) {
            Some(recipe) => Some(PlannedMeal {
                entry_id: entry.id,
                slot: entry.slot,
                recipe: recipe.clone(),
                servings: planned_servings(entry, config),
            }),
            None => {
                debug!(recipe_id = entry.recipe_id, "Skipping meal with deleted recipe");
                None
            }
        })
        .collect();

    // Stable sort keeps insertion order within a slot
    meals.sort_by_key(|m| m.slot);
    meals
}

/// Meals that contribute to a grocery list, newest date first then slot order
pub fn included_meals(
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    config: &GroceryConfig,
) -> Vec<IncludedMeal> {
    let mut meals: Vec<IncludedMeal> = entries
        .iter()
        .filter_map(|entry| {
            recipes.get(&entry.recipe_id).map(|recipe| IncludedMeal {
                date: entry.date,
                slot: entry.slot,
                recipe_title: recipe.title.clone(),
                servings: planned_servings(entry, config),
            })
        })
        .collect();

    meals.sort_by(|a, b| b.date.cmp(&a.date).then(a.slot.cmp(&b.slot)));
    meals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_model::{Ingredient, RecipeDraft};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn recipes() -> HashMap<RecipeId, Recipe> {
        let mut map = HashMap::new();
        for (id, title) in [(1, "Omelette"), (2, "Curry")] {
            let draft = RecipeDraft::new(title, vec![Ingredient::new("eggs", "2")], vec![]);
            map.insert(id, Recipe::from_draft(id, 7, draft));
        }
        map
    }

    #[test]
    fn test_todays_meals_sorted_by_slot() {
        let entries = vec![
            MealPlanEntry::new(date(3), MealSlot::Dinner, 2),
            MealPlanEntry::new(date(3), MealSlot::Breakfast, 1).with_servings(3),
            MealPlanEntry::new(date(4), MealSlot::Lunch, 1),
            MealPlanEntry::new(date(3), MealSlot::Lunch, 99),
        ];
        let meals = todays_meals(&entries, &recipes(), date(3), &GroceryConfig::default());

        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].recipe.title, "Omelette");
        assert_eq!(meals[0].servings, 3);
        assert_eq!(meals[1].slot, MealSlot::Dinner);
        assert_eq!(meals[1].servings, 2);
    }

    #[test]
    fn test_included_meals_newest_first() {
        let entries = vec![
            MealPlanEntry::new(date(1), MealSlot::Dinner, 2),
            MealPlanEntry::new(date(2), MealSlot::Dinner, 2),
            MealPlanEntry::new(date(2), MealSlot::Breakfast, 1),
        ];
        let meals = included_meals(&entries, &recipes(), &GroceryConfig::default());

        let order: Vec<(u32, MealSlot)> = meals
            .iter()
            .map(|m| (chrono::Datelike::day(&m.date), m.slot))
            .collect();
        assert_eq!(
            order,
            vec![(2, MealSlot::Breakfast), (2, MealSlot::Dinner), (1, MealSlot::Dinner)]
        );
    }

    #[test]
    fn test_entries_in_range() {
        let entries = vec![
            MealPlanEntry::new(date(1), MealSlot::Lunch, 1),
            MealPlanEntry::new(date(5), MealSlot::Lunch, 1),
            MealPlanEntry::new(date(9), MealSlot::Lunch, 1),
        ];
        let range = DateRange::new(date(2), date(9));
        assert_eq!(entries_in_range(&entries, &range).len(), 2);
    }
}
