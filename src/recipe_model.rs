//! # Recipe and Meal Plan Data Model
//!
//! This module defines the data structures shared by recipe capture, meal planning
//! and grocery list generation.
//!
//! ## Core Concepts
//!
//! - **Recipe**: a titled list of ingredients and procedure steps owned by a user
//! - **Ingredient**: a name plus a free-text quantity ("2 cups", "1/2 tsp", "to taste")
//! - **MealPlanEntry**: a recipe planned for a date and meal slot
//! - **DateRange**: an inclusive range of dates selected for the grocery list
//!
//! ## Usage
//!
//! ```rust
//! use easycook::recipe_model::{DateRange, Ingredient, MealPlanEntry, MealSlot};
//! use chrono::NaiveDate;
//!
//! let flour = Ingredient::new("flour", "2 cups");
//! let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let entry = MealPlanEntry::new(date, MealSlot::Breakfast, 1).with_servings(4);
//!
//! let range = DateRange::new(date, date);
//! assert!(range.contains(entry.date));
//! assert_eq!(flour.quantity, "2 cups");
//! ```

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database identifier of a recipe
pub type RecipeId = i64;

/// A single ingredient as captured from the recipe source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name (e.g., "all-purpose flour")
    pub name: String,
    /// Free-text quantity (e.g., "2 cups", "1/2 tsp", "to taste")
    pub quantity: String,
}

impl Ingredient {
    /// Create a new ingredient from a name and a free-text quantity
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
        }
    }
}

/// Where a recipe was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    /// A pasted YouTube link
    Youtube,
    /// A free-text description
    Text,
    /// A voice recording
    Audio,
}

/// Capture metadata kept alongside a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub source: RecipeSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_input: Option<String>,
    pub processing_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Video position for a procedure step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTimestamp {
    /// 1-based procedure step number
    pub step: u32,
    /// Position in the video as reported by the model ("02:30", "1:02:03")
    pub timestamp: String,
    /// Direct link to the position, when the video id is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A recipe that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub procedure: Vec<String>,
    pub servings: u32,
    pub number_of_meals: u32,
    pub tags: Vec<String>,
    pub suggested_tags: Vec<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub ai_response: Option<String>,
    pub timestamps: Vec<StepTimestamp>,
    pub metadata: Option<RecipeMetadata>,
}

impl RecipeDraft {
    /// Create a draft with default servings and no optional data
    pub fn new(title: impl Into<String>, ingredients: Vec<Ingredient>, procedure: Vec<String>) -> Self {
        Self {
            title: title.into(),
            ingredients,
            procedure,
            servings: 1,
            number_of_meals: 1,
            tags: Vec::new(),
            suggested_tags: Vec::new(),
            url: None,
            thumbnail_url: None,
            ai_response: None,
            timestamps: Vec::new(),
            metadata: None,
        }
    }
}

/// A persisted recipe owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub user_id: i64,
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub procedure: Vec<String>,
    pub servings: u32,
    pub number_of_meals: u32,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub ai_response: Option<String>,
    pub suggested_tags: Vec<String>,
    pub timestamps: Vec<StepTimestamp>,
    pub metadata: Option<RecipeMetadata>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Build an in-memory recipe from a draft, mainly for tests and previews
    pub fn from_draft(id: RecipeId, user_id: i64, draft: RecipeDraft) -> Self {
        Self {
            id,
            user_id,
            title: draft.title,
            ingredients: draft.ingredients,
            procedure: draft.procedure,
            servings: draft.servings,
            number_of_meals: draft.number_of_meals,
            tags: draft.tags,
            is_favorite: false,
            url: draft.url,
            thumbnail_url: draft.thumbnail_url,
            ai_response: draft.ai_response,
            suggested_tags: draft.suggested_tags,
            timestamps: draft.timestamps,
            metadata: draft.metadata,
            created_at: Utc::now(),
        }
    }
}

/// Meal slot within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    /// All slots in display order
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    /// Lowercase storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    /// Capitalized display label
    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(format!("unknown meal slot: {other}")),
        }
    }
}

/// A recipe planned for a given date and slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEntry {
    /// Database id, `None` until persisted
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub slot: MealSlot,
    pub recipe_id: RecipeId,
    /// Servings planned for this occasion, `None` uses the configured default
    pub servings: Option<u32>,
}

impl MealPlanEntry {
    /// Create an entry without a servings override
    pub fn new(date: NaiveDate, slot: MealSlot, recipe_id: RecipeId) -> Self {
        Self {
            id: None,
            date,
            slot,
            recipe_id,
            servings: None,
        }
    }

    /// Set the planned servings
    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = Some(servings);
        self
    }
}

/// Inclusive range of dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; a range whose start is after its end contains no dates
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The week starting at `start` (start plus six days)
    pub fn week_from(start: NaiveDate) -> Self {
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Iterate every date in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start.format("%b %-d"), self.end.format("%b %-d"))
    }
}
