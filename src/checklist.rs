//! Plain-text checklist export for pasting into a notes app.

use std::collections::BTreeMap;

use crate::grocery::AggregatedIngredientLine;

pub const CHECKLIST_FOOTER: &str = "--- Created with EasyCook ---";

fn capitalize_header(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Render lines as a `□ name (quantity)` checklist grouped under category headers
///
/// ```rust
/// use easycook::checklist::checklist_text;
///
/// let text = checklist_text("Groceries", &[]);
/// assert_eq!(text, "Groceries\n\n--- Created with EasyCook ---");
/// ```
pub fn checklist_text(title: &str, lines: &[AggregatedIngredientLine]) -> String {
    let mut groups: BTreeMap<String, Vec<&AggregatedIngredientLine>> = BTreeMap::new();
    for line in lines {
        groups
            .entry(capitalize_header(line.category.label()))
            .or_default()
            .push(line);
    }

    let mut content = format!("{title}\n\n");
    for (header, mut items) in groups {
        items.sort_by(|a, b| a.name.cmp(&b.name));
        content.push_str(&header);
        content.push_str(":\n");
        for item in items {
            content.push_str(&format!("□ {} ({})\n", item.name, item.formatted_quantity()));
        }
        content.push('\n');
    }
    content.push_str(CHECKLIST_FOOTER);
    content
}
