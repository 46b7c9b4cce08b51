//! Keyword-based tag suggestions for captured recipes.

use crate::recipe_model::Ingredient;

struct TagRule {
    tag: &'static str,
    keywords: &'static [&'static str],
    /// Tag applies when none of the keywords appear
    absent: bool,
}

const TAG_RULES: &[TagRule] = &[
    TagRule { tag: "breakfast", keywords: &["breakfast", "pancake", "eggs", "toast"], absent: false },
    TagRule { tag: "lunch", keywords: &["lunch", "sandwich", "salad"], absent: false },
    TagRule { tag: "dinner", keywords: &["dinner", "curry", "roast"], absent: false },
    TagRule { tag: "snack", keywords: &["snack", "chips", "cookies"], absent: false },
    TagRule { tag: "high protein", keywords: &["protein", "chicken", "fish", "meat"], absent: false },
    TagRule { tag: "low carb", keywords: &["sugar", "bread", "pasta"], absent: true },
    TagRule { tag: "vegetarian", keywords: &["meat", "chicken", "fish"], absent: true },
    TagRule { tag: "quick & easy", keywords: &["quick", "easy", "minutes"], absent: false },
    TagRule { tag: "healthy", keywords: &["healthy", "salad", "grilled"], absent: false },
];

/// Suggest tags from the title, ingredient names and procedure of a recipe
///
/// Matching is substring based on lowercased text, so "roasted" counts as "roast".
pub fn suggest_tags(title: &str, ingredients: &[Ingredient], procedure: &[String]) -> Vec<String> {
    let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
    let content = format!("{} {} {}", title, names.join(" "), procedure.join(" ")).to_lowercase();

    TAG_RULES
        .iter()
        .filter(|rule| {
            let found = rule.keywords.iter().any(|k| content.contains(k));
            found != rule.absent
        })
        .map(|rule| rule.tag.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_chicken_curry_tags() {
        let tags = suggest_tags(
            "Chicken Curry",
            &[Ingredient::new("chicken thighs", "500 g"), Ingredient::new("rice", "2 cups")],
            &steps(&["Simmer for 30 minutes"]),
        );
        assert_eq!(tags, vec!["dinner", "high protein", "low carb", "quick & easy"]);
    }

    #[test]
    fn test_vegetarian_breakfast() {
        let tags = suggest_tags(
            "Pancakes",
            &[Ingredient::new("flour", "1 cup"), Ingredient::new("sugar", "2 tbsp")],
            &steps(&["Whisk and fry"]),
        );
        assert_eq!(tags, vec!["breakfast", "vegetarian"]);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let tags = suggest_tags("GRILLED Salad", &[], &[]);
        assert!(tags.contains(&"lunch".to_string()));
        assert!(tags.contains(&"healthy".to_string()));
        assert_eq!(tags.iter().filter(|t| *t == "healthy").count(), 1);
    }
}
