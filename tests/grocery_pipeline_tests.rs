//! # Grocery Pipeline Tests
//!
//! End-to-end tests of grocery list generation: aggregation of planned meals,
//! categorization through a fake categorizer, and the screen state around it.

use async_trait::async_trait;
use chrono::NaiveDate;
use easycook::category::GroceryCategory;
use easycook::checklist::checklist_text;
use easycook::config::GroceryConfig;
use easycook::errors::{AiError, GroceryError};
use easycook::grocery::{
    generate_grocery_list, CategorizationOutcome, Categorizer, CategoryAssignment,
};
use easycook::grocery_list::{GroceryPhase, GroceryScreen};
use easycook::recipe_model::{DateRange, Ingredient, MealPlanEntry, MealSlot, Recipe, RecipeDraft, RecipeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Answers from a fixed table and records every call
struct FakeCategorizer {
    answers: HashMap<String, String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<String>>>,
}

impl FakeCategorizer {
    fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, category)| (name.to_string(), category.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Categorizer for FakeCategorizer {
    async fn categorize(
        &self,
        ingredients: &[String],
        _recipe_titles: &[String],
    ) -> Result<Vec<CategoryAssignment>, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(ingredients.to_vec());
        Ok(ingredients
            .iter()
            .filter_map(|name| {
                self.answers.get(name).map(|category| CategoryAssignment {
                    ingredient: name.clone(),
                    category: category.clone(),
                })
            })
            .collect())
    }
}

/// Always fails like an unreachable model
struct FailingCategorizer;

#[async_trait]
impl Categorizer for FailingCategorizer {
    async fn categorize(&self, _: &[String], _: &[String]) -> Result<Vec<CategoryAssignment>, AiError> {
        Err(AiError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

fn week() -> DateRange {
    DateRange::new(date(1), date(7))
}

fn recipe(id: RecipeId, title: &str, ingredients: &[(&str, &str)]) -> (RecipeId, Recipe) {
    let ingredients = ingredients
        .iter()
        .map(|(name, quantity)| Ingredient::new(*name, *quantity))
        .collect();
    (id, Recipe::from_draft(id, 1, RecipeDraft::new(title, ingredients, vec![])))
}

fn pancakes() -> (RecipeId, Recipe) {
    recipe(1, "Pancakes", &[("flour", "2 cups")])
}

#[tokio::test]
async fn test_servings_scale_against_baseline() {
    let recipes = HashMap::from([pancakes()]);
    let entries = vec![MealPlanEntry::new(date(2), MealSlot::Breakfast, 1).with_servings(2)];
    let categorizer = FakeCategorizer::new(&[("flour", "Baking Supplies")]);

    let list = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.lines.len(), 1);
    assert_eq!(list.lines[0].name, "flour");
    assert_eq!(list.lines[0].formatted_quantity(), "1 cup");
    assert_eq!(list.lines[0].category, GroceryCategory::BakingSupplies);
    assert_eq!(list.outcome, CategorizationOutcome::Complete);
}

#[tokio::test]
async fn test_same_recipe_twice_merges_into_one_line() {
    let recipes = HashMap::from([pancakes()]);
    let entries = vec![
        MealPlanEntry::new(date(2), MealSlot::Breakfast, 1).with_servings(4),
        MealPlanEntry::new(date(3), MealSlot::Breakfast, 1).with_servings(4),
    ];
    let categorizer = FakeCategorizer::new(&[("flour", "Baking Supplies")]);

    let list = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.lines.len(), 1);
    assert_eq!(list.lines[0].formatted_quantity(), "4 cups");
    assert_eq!(list.lines[0].recipes, BTreeSet::from(["Pancakes".to_string()]));
    assert_eq!(list.included_meals.len(), 2);
}

#[tokio::test]
async fn test_different_units_stay_separate() {
    let recipes = HashMap::from([
        recipe(1, "Cake", &[("sugar", "1 cup")]),
        recipe(2, "Jam", &[("Sugar ", "200 g")]),
    ]);
    let entries = vec![
        MealPlanEntry::new(date(2), MealSlot::Lunch, 1).with_servings(4),
        MealPlanEntry::new(date(2), MealSlot::Dinner, 2).with_servings(4),
    ];
    let categorizer = FakeCategorizer::new(&[("sugar", "Baking Supplies"), ("sugar (g)", "Baking Supplies")]);

    let list = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.lines.len(), 2);
    assert_eq!(list.lines[0].name, "sugar");
    assert_eq!(list.lines[0].formatted_quantity(), "1 cup");
    assert_eq!(list.lines[0].recipes, BTreeSet::from(["Cake".to_string()]));
    assert_eq!(list.lines[1].name, "sugar (g)");
    assert_eq!(list.lines[1].formatted_quantity(), "200 g");
    assert_eq!(list.lines[1].recipes, BTreeSet::from(["Jam".to_string()]));
}

#[tokio::test]
async fn test_empty_range_skips_categorization() {
    let recipes = HashMap::from([pancakes()]);
    let entries = vec![MealPlanEntry::new(date(20), MealSlot::Breakfast, 1)];
    let categorizer = FakeCategorizer::new(&[]);

    let result = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default()).await;

    assert_eq!(result.unwrap_err(), GroceryError::NoMealsInRange);
    assert_eq!(categorizer.calls(), 0);
}

#[tokio::test]
async fn test_missing_range_is_rejected() {
    let categorizer = FakeCategorizer::new(&[]);
    let result = generate_grocery_list(&categorizer, None, &[], &HashMap::new(), &GroceryConfig::default()).await;

    assert_eq!(result.unwrap_err(), GroceryError::NoDateRange);
    assert_eq!(categorizer.calls(), 0);
}

#[tokio::test]
async fn test_unanswered_lines_fall_back_to_other() {
    let recipes = HashMap::from([recipe(1, "Curry", &[("chicken", "500 g"), ("garam masala", "2 tsp")])]);
    let entries = vec![MealPlanEntry::new(date(4), MealSlot::Dinner, 1).with_servings(4)];
    let categorizer = FakeCategorizer::new(&[("chicken", "Proteins")]);

    let list = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.outcome, CategorizationOutcome::Partial { uncategorized: 1 });
    assert_eq!(list.lines[0].category, GroceryCategory::Proteins);
    assert_eq!(list.lines[1].category, GroceryCategory::Other);
}

#[tokio::test]
async fn test_failed_categorizer_keeps_the_list() {
    let recipes = HashMap::from([recipe(1, "Salad", &[("lettuce", "1"), ("olive oil", "2 tbsp")])]);
    let entries = vec![MealPlanEntry::new(date(5), MealSlot::Lunch, 1).with_servings(4)];

    let list = generate_grocery_list(&FailingCategorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.lines.len(), 2);
    assert!(list.lines.iter().all(|line| line.category == GroceryCategory::Other));
    assert!(matches!(list.outcome, CategorizationOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_deleted_recipe_contributes_nothing() {
    let recipes = HashMap::from([pancakes()]);
    let entries = vec![
        MealPlanEntry::new(date(2), MealSlot::Breakfast, 1).with_servings(4),
        MealPlanEntry::new(date(2), MealSlot::Dinner, 99).with_servings(4),
    ];
    let categorizer = FakeCategorizer::new(&[("flour", "Baking Supplies")]);

    let list = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();

    assert_eq!(list.lines.len(), 1);
    assert_eq!(list.included_meals.len(), 1);
}

#[tokio::test]
async fn test_regeneration_is_idempotent() {
    let recipes = HashMap::from([
        pancakes(),
        recipe(2, "Omelette", &[("eggs", "3"), ("milk", "50 ml")]),
    ]);
    let entries = vec![
        MealPlanEntry::new(date(2), MealSlot::Breakfast, 1),
        MealPlanEntry::new(date(3), MealSlot::Breakfast, 2).with_servings(8),
    ];
    let categorizer = FakeCategorizer::new(&[("flour", "Baking Supplies"), ("eggs", "Dairy"), ("milk", "Dairy")]);
    let config = GroceryConfig::default();

    let first = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &config).await.unwrap();
    let second = generate_grocery_list(&categorizer, Some(week()), &entries, &recipes, &config).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(categorizer.calls(), 2);
    // Each distinct line name is requested once per generation
    let requested = categorizer.requested.lock().unwrap();
    assert_eq!(requested[0], vec!["flour", "eggs", "milk"]);
}

#[tokio::test]
async fn test_screen_flow_with_checked_lines() {
    let recipes = HashMap::from([recipe(
        1,
        "Breakfast bowl",
        &[("milk", "200 ml"), ("apple", "1"), ("oats", "80 g")],
    )]);
    let entries = vec![MealPlanEntry::new(date(2), MealSlot::Breakfast, 1).with_servings(4)];
    let categorizer = FakeCategorizer::new(&[("milk", "Dairy"), ("apple", "Produce"), ("oats", "Grains")]);

    let mut screen = GroceryScreen::new();
    let range = screen.begin_generation(Some(week())).unwrap();
    assert_eq!(screen.begin_generation(Some(week())), Err(GroceryError::AlreadyGenerating));

    let list = generate_grocery_list(&categorizer, Some(range), &entries, &recipes, &GroceryConfig::default())
        .await
        .unwrap();
    screen.complete(list);
    assert_eq!(screen.phase(), &GroceryPhase::Ready { outcome: CategorizationOutcome::Complete });

    let order: Vec<String> = screen.view().unwrap().lines().iter().map(|l| l.name.clone()).collect();
    assert_eq!(order, vec!["milk", "oats", "apple"]);

    // Checking never reorders lines
    let view = screen.view_mut().unwrap();
    view.toggle(0);
    let after: Vec<String> = view.lines().iter().map(|l| l.name.clone()).collect();
    assert_eq!(after, order);

    let checklist = checklist_text("Groceries", view.lines());
    assert!(checklist.contains("Dairy:"));
    assert!(checklist.contains("□ milk (200 ml)"));

    assert_eq!(view.clear_checked(), 1);
    assert_eq!(view.len(), 2);

    // A new generation starts from a fresh view
    screen.begin_generation(Some(week())).unwrap();
    assert!(screen.view().is_none());
}
