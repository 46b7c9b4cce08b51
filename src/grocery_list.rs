//! # Grocery List Presentation
//!
//! [`GroceryListView`] sorts generated lines and tracks which ones the user has
//! checked off. [`GroceryScreen`] is the per-chat state machine around generation:
//!
//! ```text
//! Idle ──begin──▶ Categorizing ──complete──▶ Ready{outcome}
//!   ▲                  │                          │
//!   └──── fail ────────┘◀──────── begin ──────────┘
//! ```
//!
//! Checked state is presentation only: it never changes order or quantities, and a
//! regeneration starts from a fresh, unchecked view.

use tracing::debug;

use crate::category::GroceryCategory;
use crate::errors::GroceryError;
use crate::grocery::{AggregatedIngredientLine, CategorizationOutcome, GroceryList};
use crate::meal_plan::IncludedMeal;
use crate::recipe_model::DateRange;

/// Sorted grocery lines with a checked flag per line
#[derive(Debug, Clone, PartialEq)]
pub struct GroceryListView {
    lines: Vec<AggregatedIngredientLine>,
    checked: Vec<bool>,
}

impl GroceryListView {
    /// Sort by category label, then by display name
    pub fn new(mut lines: Vec<AggregatedIngredientLine>) -> Self {
        lines.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        let checked = vec![false; lines.len()];
        Self { lines, checked }
    }

    pub fn lines(&self) -> &[AggregatedIngredientLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Flip the checked flag of a line; returns the new state, `None` when out of range
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let flag = self.checked.get_mut(index)?;
        *flag = !*flag;
        Some(*flag)
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }

    /// Remove exactly the checked lines, returning how many were removed
    pub fn clear_checked(&mut self) -> usize {
        let before = self.lines.len();
        let mut flags = self.checked.iter();
        self.lines.retain(|_| !flags.next().copied().unwrap_or(false));
        self.checked = vec![false; self.lines.len()];
        before - self.lines.len()
    }

    /// Lines grouped by category, with their index in the view
    pub fn grouped(&self) -> Vec<(GroceryCategory, Vec<(usize, &AggregatedIngredientLine)>)> {
        let mut groups: Vec<(GroceryCategory, Vec<(usize, &AggregatedIngredientLine)>)> = Vec::new();
        for (index, line) in self.lines.iter().enumerate() {
            match groups.last_mut() {
                Some((category, items)) if *category == line.category => items.push((index, line)),
                _ => groups.push((line.category, vec![(index, line)])),
            }
        }
        groups
    }
}

/// Where a chat's grocery screen is in the generation flow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroceryPhase {
    #[default]
    Idle,
    Categorizing,
    Ready { outcome: CategorizationOutcome },
}

/// Per-chat grocery screen state
#[derive(Debug, Clone, Default)]
pub struct GroceryScreen {
    phase: GroceryPhase,
    range: Option<DateRange>,
    view: Option<GroceryListView>,
    included_meals: Vec<IncludedMeal>,
    feedback: Option<GroceryError>,
}

impl GroceryScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &GroceryPhase {
        &self.phase
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn view(&self) -> Option<&GroceryListView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut GroceryListView> {
        self.view.as_mut()
    }

    pub fn included_meals(&self) -> &[IncludedMeal] {
        &self.included_meals
    }

    /// Last input error shown to the user
    pub fn feedback(&self) -> Option<GroceryError> {
        self.feedback
    }

    /// Enter `Categorizing` for a new generation
    ///
    /// A generation already in flight is rejected and left untouched. A missing range
    /// returns the screen to `Idle` with feedback.
    pub fn begin_generation(&mut self, range: Option<DateRange>) -> Result<DateRange, GroceryError> {
        if self.phase == GroceryPhase::Categorizing {
            debug!("Rejecting duplicate grocery generation");
            return Err(GroceryError::AlreadyGenerating);
        }

        let Some(range) = range else {
            self.fail(GroceryError::NoDateRange);
            return Err(GroceryError::NoDateRange);
        };

        self.phase = GroceryPhase::Categorizing;
        self.range = Some(range);
        self.view = None;
        self.included_meals.clear();
        self.feedback = None;
        Ok(range)
    }

    /// Back to `Idle` with a user-visible error
    pub fn fail(&mut self, error: GroceryError) {
        self.phase = GroceryPhase::Idle;
        self.view = None;
        self.included_meals.clear();
        self.feedback = Some(error);
    }

    /// Back to `Idle` after an infrastructure failure (database, transport)
    pub fn abort(&mut self) {
        self.phase = GroceryPhase::Idle;
        self.feedback = None;
    }

    /// Show a generated list
    pub fn complete(&mut self, list: GroceryList) {
        self.range = Some(list.range);
        self.view = Some(GroceryListView::new(list.lines));
        self.included_meals = list.included_meals;
        self.feedback = None;
        self.phase = GroceryPhase::Ready {
            outcome: list.outcome,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn line(name: &str, category: GroceryCategory) -> AggregatedIngredientLine {
        AggregatedIngredientLine {
            name: name.to_string(),
            key: name.to_string(),
            quantity: 1.0,
            unit: String::new(),
            recipes: BTreeSet::new(),
            category,
        }
    }

    fn sample_view() -> GroceryListView {
        GroceryListView::new(vec![
            line("milk", GroceryCategory::Dairy),
            line("apple", GroceryCategory::Produce),
            line("butter", GroceryCategory::Dairy),
            line("saffron", GroceryCategory::Other),
        ])
    }

    #[test]
    fn test_sorted_by_category_then_name() {
        let view = sample_view();
        let names: Vec<&str> = view.lines().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["butter", "milk", "saffron", "apple"]);
    }

    #[test]
    fn test_toggle_and_clear_checked() {
        let mut view = sample_view();
        assert_eq!(view.toggle(1), Some(true));
        assert_eq!(view.toggle(3), Some(true));
        assert_eq!(view.toggle(3), Some(false));
        assert_eq!(view.toggle(9), None);
        assert!(view.is_checked(1));

        assert_eq!(view.clear_checked(), 1);
        let names: Vec<&str> = view.lines().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["butter", "saffron", "apple"]);
        assert_eq!(view.checked_count(), 0);
    }

    #[test]
    fn test_grouped() {
        let view = sample_view();
        let groups = view.grouped();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, GroceryCategory::Dairy);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[2].1[0].0, 3);
    }

    #[test]
    fn test_duplicate_generation_rejected() {
        let mut screen = GroceryScreen::new();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        screen.begin_generation(Some(DateRange::week_from(date))).unwrap();
        assert_eq!(
            screen.begin_generation(Some(DateRange::week_from(date))),
            Err(GroceryError::AlreadyGenerating)
        );
        assert_eq!(screen.phase(), &GroceryPhase::Categorizing);
    }

    #[test]
    fn test_abort_allows_a_new_generation() {
        let mut screen = GroceryScreen::new();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        screen.begin_generation(Some(DateRange::week_from(date))).unwrap();

        screen.abort();
        assert_eq!(screen.phase(), &GroceryPhase::Idle);
        assert_eq!(screen.feedback(), None);

        let next = DateRange::week_from(date + chrono::Duration::days(7));
        assert_eq!(screen.begin_generation(Some(next)), Ok(next));
        assert_eq!(screen.phase(), &GroceryPhase::Categorizing);
    }

    #[test]
    fn test_missing_range_returns_to_idle() {
        let mut screen = GroceryScreen::new();
        assert_eq!(screen.begin_generation(None), Err(GroceryError::NoDateRange));
        assert_eq!(screen.phase(), &GroceryPhase::Idle);
        assert_eq!(screen.feedback(), Some(GroceryError::NoDateRange));
    }
}
