//! # Grocery List Generation
//!
//! Folds the meals planned in a date range into merged, categorized grocery lines.
//!
//! ## Pipeline
//!
//! 1. [`prepare`]: validate the range, select its entries and [`aggregate`] them (pure, no I/O)
//! 2. [`categorize_lines`]: ask a [`Categorizer`] for store sections, falling back to
//!    [`GroceryCategory::Other`] for anything it does not answer
//! 3. [`crate::grocery_list::GroceryListView`]: sort and track checked state for display
//!
//! ## Merging
//!
//! Lines are keyed by normalized name (trimmed, lowercased) and unit. The same name with
//! the same unit sums quantities; a different unit opens a separate line displayed as
//! `name (unit)`, so unlike units are never added together.
//!
//! ```rust
//! use easycook::config::GroceryConfig;
//! use easycook::grocery::aggregate;
//! use easycook::recipe_model::{Ingredient, MealPlanEntry, MealSlot, Recipe, RecipeDraft};
//! use chrono::NaiveDate;
//! use std::collections::HashMap;
//!
//! let draft = RecipeDraft::new("Pancakes", vec![Ingredient::new("flour", "2 cups")], vec![]);
//! let recipes = HashMap::from([(1, Recipe::from_draft(1, 1, draft))]);
//! let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let entries = vec![MealPlanEntry::new(date, MealSlot::Breakfast, 1).with_servings(2)];
//!
//! let lines = aggregate(&entries, &recipes, &GroceryConfig::default());
//! assert_eq!(lines[0].formatted_quantity(), "1 cup");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::category::GroceryCategory;
use crate::config::GroceryConfig;
use crate::errors::{AiError, GroceryError};
use crate::meal_plan::{entries_in_range, included_meals, IncludedMeal};
use crate::quantity::{extract_unit, format_quantity, parse_quantity};
use crate::recipe_model::{DateRange, MealPlanEntry, Recipe, RecipeId};

/// One merged line of the grocery list
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedIngredientLine {
    /// Normalized name, suffixed with the unit when another line owns the plain name
    pub name: String,
    /// Normalized name used as the merge key
    pub key: String,
    pub quantity: f64,
    pub unit: String,
    /// Titles of the recipes that contributed to this line
    pub recipes: BTreeSet<String>,
    pub category: GroceryCategory,
}

impl AggregatedIngredientLine {
    /// Quantity and unit as shown to users ("1 cup", "0.5 tsp")
    pub fn formatted_quantity(&self) -> String {
        format_quantity(self.quantity, &self.unit)
    }
}

/// Normalized merge key of an ingredient name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merge every ingredient of every entry into grocery lines, in first-seen order
///
/// Entries whose recipe is missing contribute nothing.
pub fn aggregate(
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    config: &GroceryConfig,
) -> Vec<AggregatedIngredientLine> {
    let mut lines: Vec<AggregatedIngredientLine> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut plain_names: HashSet<String> = HashSet::new();

    for entry in entries {
        let Some(recipe) = recipes.get(&entry.recipe_id) else {
            debug!(recipe_id = entry.recipe_id, date = %entry.date, "Skipping meal with deleted recipe");
            continue;
        };

        let multiplier = config.servings_multiplier(entry.servings);

        for ingredient in &recipe.ingredients {
            let key = normalize_name(&ingredient.name);
            if key.is_empty() {
                continue;
            }
            let quantity = parse_quantity(&ingredient.quantity) * multiplier;
            let unit = extract_unit(&ingredient.quantity);

            match index.get(&(key.clone(), unit.clone())) {
                Some(&position) => {
                    let line = &mut lines[position];
                    line.quantity += quantity;
                    line.recipes.insert(recipe.title.clone());
                }
                None => {
                    let name = if plain_names.insert(key.clone()) || unit.is_empty() {
                        key.clone()
                    } else {
                        format!("{key} ({unit})")
                    };
                    index.insert((key.clone(), unit.clone()), lines.len());
                    lines.push(AggregatedIngredientLine {
                        name,
                        key,
                        quantity,
                        unit,
                        recipes: BTreeSet::from([recipe.title.clone()]),
                        category: GroceryCategory::Other,
                    });
                }
            }
        }
    }

    lines
}

/// Category answered for one ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub ingredient: String,
    pub category: String,
}

/// Assigns store sections to ingredient names
#[async_trait]
pub trait Categorizer: Send + Sync {
    async fn categorize(
        &self,
        ingredients: &[String],
        recipe_titles: &[String],
    ) -> Result<Vec<CategoryAssignment>, AiError>;
}

/// How categorization went, reported alongside the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorizationOutcome {
    /// Every line got an answer
    Complete,
    /// Some lines got no answer and fell back to `Other`
    Partial { uncategorized: usize },
    /// The categorizer failed; every line is `Other`
    Failed { reason: String },
}

/// Apply assignments to lines, returning how many lines got no answer
///
/// Lookup tries the exact name first, then a case-insensitive trimmed match.
pub fn apply_categories(lines: &mut [AggregatedIngredientLine], assignments: &[CategoryAssignment]) -> usize {
    let exact: HashMap<&str, &str> = assignments
        .iter()
        .map(|a| (a.ingredient.as_str(), a.category.as_str()))
        .collect();
    let relaxed: HashMap<String, &str> = assignments
        .iter()
        .map(|a| (a.ingredient.trim().to_lowercase(), a.category.as_str()))
        .collect();

    let mut uncategorized = 0;
    for line in lines.iter_mut() {
        let label = exact
            .get(line.name.as_str())
            .copied()
            .or_else(|| relaxed.get(&line.name.trim().to_lowercase()).copied());

        line.category = match label {
            Some(label) => GroceryCategory::from_label(label),
            None => {
                uncategorized += 1;
                GroceryCategory::Other
            }
        };
    }
    uncategorized
}

/// Categorize lines in place; never fails past this point
#[instrument(skip_all, fields(lines = lines.len()))]
pub async fn categorize_lines(
    categorizer: &dyn Categorizer,
    lines: &mut [AggregatedIngredientLine],
    recipe_titles: &[String],
) -> CategorizationOutcome {
    if lines.is_empty() {
        return CategorizationOutcome::Complete;
    }

    let mut names: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines.iter() {
        if !names.contains(&line.name) {
            names.push(line.name.clone());
        }
    }

    match categorizer.categorize(&names, recipe_titles).await {
        Ok(assignments) => {
            let uncategorized = apply_categories(lines, &assignments);
            if uncategorized == 0 {
                debug!("Every grocery line categorized");
                CategorizationOutcome::Complete
            } else {
                info!(uncategorized, "Some grocery lines left uncategorized");
                CategorizationOutcome::Partial { uncategorized }
            }
        }
        Err(e) => {
            warn!(error = %e, "Categorization failed, using Other for every line");
            for line in lines.iter_mut() {
                line.category = GroceryCategory::Other;
            }
            CategorizationOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Aggregated lines ready for categorization
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedGroceryList {
    pub range: DateRange,
    pub lines: Vec<AggregatedIngredientLine>,
    /// Distinct titles of the recipes in range, in plan order
    pub recipe_titles: Vec<String>,
    pub included_meals: Vec<IncludedMeal>,
}

/// Validate the input and aggregate the meals in range
///
/// # Errors
///
/// - [`GroceryError::NoDateRange`] without a range
/// - [`GroceryError::NoMealsInRange`] when no entry falls inside it
pub fn prepare(
    range: Option<DateRange>,
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    config: &GroceryConfig,
) -> Result<PreparedGroceryList, GroceryError> {
    let range = range.ok_or(GroceryError::NoDateRange)?;

    let selected = entries_in_range(entries, &range);
    if selected.is_empty() {
        return Err(GroceryError::NoMealsInRange);
    }

    let mut recipe_titles: Vec<String> = Vec::new();
    for entry in &selected {
        if let Some(recipe) = recipes.get(&entry.recipe_id) {
            if !recipe_titles.contains(&recipe.title) {
                recipe_titles.push(recipe.title.clone());
            }
        }
    }

    let lines = aggregate(&selected, recipes, config);
    debug!(entries = selected.len(), lines = lines.len(), "Aggregated meal plan");

    Ok(PreparedGroceryList {
        range,
        lines,
        recipe_titles,
        included_meals: included_meals(&selected, recipes, config),
    })
}

/// A generated, categorized grocery list
#[derive(Debug, Clone, PartialEq)]
pub struct GroceryList {
    pub range: DateRange,
    pub lines: Vec<AggregatedIngredientLine>,
    pub included_meals: Vec<IncludedMeal>,
    pub outcome: CategorizationOutcome,
}

/// Run the whole pipeline for a range
pub async fn generate_grocery_list(
    categorizer: &dyn Categorizer,
    range: Option<DateRange>,
    entries: &[MealPlanEntry],
    recipes: &HashMap<RecipeId, Recipe>,
    config: &GroceryConfig,
) -> Result<GroceryList, GroceryError> {
    let prepared = prepare(range, entries, recipes, config)?;
    Ok(finish(categorizer, prepared).await)
}

/// Categorize a prepared list
pub async fn finish(categorizer: &dyn Categorizer, prepared: PreparedGroceryList) -> GroceryList {
    let PreparedGroceryList {
        range,
        mut lines,
        recipe_titles,
        included_meals,
    } = prepared;

    let outcome = categorize_lines(categorizer, &mut lines, &recipe_titles).await;

    GroceryList {
        range,
        lines,
        included_meals,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_model::{Ingredient, MealSlot, RecipeDraft};
    use chrono::NaiveDate;

    fn recipe(id: RecipeId, title: &str, ingredients: &[(&str, &str)]) -> Recipe {
        let ingredients = ingredients
            .iter()
            .map(|(name, quantity)| Ingredient::new(*name, *quantity))
            .collect();
        Recipe::from_draft(id, 1, RecipeDraft::new(title, ingredients, vec![]))
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn line(name: &str) -> AggregatedIngredientLine {
        AggregatedIngredientLine {
            name: name.to_string(),
            key: name.to_string(),
            quantity: 1.0,
            unit: String::new(),
            recipes: BTreeSet::new(),
            category: GroceryCategory::Other,
        }
    }

    #[test]
    fn test_names_are_normalized() {
        let recipes = HashMap::from([(1, recipe(1, "Soup", &[("  Carrot ", "2"), ("carrot", "1")]))]);
        let entries = vec![MealPlanEntry::new(day(), MealSlot::Lunch, 1).with_servings(4)];

        let lines = aggregate(&entries, &recipes, &GroceryConfig::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "carrot");
        assert_eq!(lines[0].quantity, 3.0);
    }

    #[test]
    fn test_unitless_secondary_line_keeps_plain_name() {
        let recipes = HashMap::from([(1, recipe(1, "Salad", &[("salt", "1 tsp"), ("salt", "to taste")]))]);
        let entries = vec![MealPlanEntry::new(day(), MealSlot::Lunch, 1).with_servings(4)];

        let lines = aggregate(&entries, &recipes, &GroceryConfig::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "salt");
        assert_eq!(lines[1].name, "salt");
        assert_eq!(lines[1].unit, "");
    }

    #[test]
    fn test_apply_categories_relaxed_match() {
        let mut lines = vec![line("flour"), line("olive oil"), line("saffron")];
        let assignments = vec![
            CategoryAssignment {
                ingredient: "flour".to_string(),
                category: "Baking Supplies".to_string(),
            },
            CategoryAssignment {
                ingredient: " Olive Oil ".to_string(),
                category: "oils & vinegars".to_string(),
            },
        ];

        let uncategorized = apply_categories(&mut lines, &assignments);
        assert_eq!(uncategorized, 1);
        assert_eq!(lines[0].category, GroceryCategory::BakingSupplies);
        assert_eq!(lines[1].category, GroceryCategory::OilsVinegars);
        assert_eq!(lines[2].category, GroceryCategory::Other);
    }

    #[test]
    fn test_unknown_label_becomes_other() {
        let mut lines = vec![line("tofu")];
        let assignments = vec![CategoryAssignment {
            ingredient: "tofu".to_string(),
            category: "Plant Protein".to_string(),
        }];
        assert_eq!(apply_categories(&mut lines, &assignments), 0);
        assert_eq!(lines[0].category, GroceryCategory::Other);
    }

    #[test]
    fn test_prepare_requires_range() {
        let err = prepare(None, &[], &HashMap::new(), &GroceryConfig::default()).unwrap_err();
        assert_eq!(err, GroceryError::NoDateRange);
    }

    #[test]
    fn test_prepare_collects_titles_once() {
        let recipes = HashMap::from([(1, recipe(1, "Pancakes", &[("flour", "2 cups")]))]);
        let entries = vec![
            MealPlanEntry::new(day(), MealSlot::Breakfast, 1),
            MealPlanEntry::new(day(), MealSlot::Dinner, 1),
        ];
        let prepared = prepare(
            Some(DateRange::new(day(), day())),
            &entries,
            &recipes,
            &GroceryConfig::default(),
        )
        .unwrap();

        assert_eq!(prepared.recipe_titles, vec!["Pancakes"]);
        assert_eq!(prepared.included_meals.len(), 2);
        assert_eq!(prepared.lines[0].formatted_quantity(), "2 cups");
    }
}
