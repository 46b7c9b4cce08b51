//! # Grocery Categories
//!
//! The fixed store-section vocabulary used to group grocery lines. `Other` is the
//! uncategorized variant assigned whenever the categorizer gives no usable answer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Store section a grocery line belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroceryCategory {
    Produce,
    Proteins,
    Dairy,
    Bakery,
    Grains,
    CannedJarred,
    SpicesHerbs,
    OilsVinegars,
    CondimentsSauces,
    BakingSupplies,
    Snacks,
    FrozenFoods,
    Beverages,
    EthnicFoods,
    /// Uncategorized: no assignment, an unknown label, or a failed categorizer call
    #[default]
    Other,
}

impl GroceryCategory {
    /// Every category, in prompt order
    pub const ALL: [GroceryCategory; 15] = [
        GroceryCategory::Produce,
        GroceryCategory::Proteins,
        GroceryCategory::Dairy,
        GroceryCategory::Bakery,
        GroceryCategory::Grains,
        GroceryCategory::CannedJarred,
        GroceryCategory::SpicesHerbs,
        GroceryCategory::OilsVinegars,
        GroceryCategory::CondimentsSauces,
        GroceryCategory::BakingSupplies,
        GroceryCategory::Snacks,
        GroceryCategory::FrozenFoods,
        GroceryCategory::Beverages,
        GroceryCategory::EthnicFoods,
        GroceryCategory::Other,
    ];

    /// Label shown to users and exchanged with the categorizer
    pub fn label(&self) -> &'static str {
        match self {
            GroceryCategory::Produce => "Produce",
            GroceryCategory::Proteins => "Proteins",
            GroceryCategory::Dairy => "Dairy",
            GroceryCategory::Bakery => "Bakery",
            GroceryCategory::Grains => "Grains",
            GroceryCategory::CannedJarred => "Canned/Jarred Goods",
            GroceryCategory::SpicesHerbs => "Spices & Herbs",
            GroceryCategory::OilsVinegars => "Oils & Vinegars",
            GroceryCategory::CondimentsSauces => "Condiments & Sauces",
            GroceryCategory::BakingSupplies => "Baking Supplies",
            GroceryCategory::Snacks => "Snacks",
            GroceryCategory::FrozenFoods => "Frozen Foods",
            GroceryCategory::Beverages => "Beverages",
            GroceryCategory::EthnicFoods => "Ethnic Foods",
            GroceryCategory::Other => "Other",
        }
    }

    /// Short description used in the categorization prompt
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GroceryCategory::Produce => Some("fresh fruits and vegetables"),
            GroceryCategory::Proteins => Some("meat, poultry, seafood, tofu, tempeh"),
            GroceryCategory::Dairy => Some("milk, cheese, yogurt, butter"),
            GroceryCategory::Bakery => Some("bread, pastries, baked goods"),
            GroceryCategory::Grains => Some("rice, pasta, quinoa, oats"),
            GroceryCategory::CannedJarred => Some("canned beans, sauces, preserves"),
            GroceryCategory::EthnicFoods => Some("ingredients specific to particular cuisines"),
            _ => None,
        }
    }

    /// Map a label returned by the categorizer; unknown labels are `Other`
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .unwrap_or(GroceryCategory::Other)
    }

    pub fn is_uncategorized(&self) -> bool {
        *self == GroceryCategory::Other
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl PartialOrd for GroceryCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Categories order lexicographically by label
impl Ord for GroceryCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}
