//! # Response Parsing Module
//!
//! Generative models are asked for raw JSON but often wrap it in prose or markdown
//! code fences. This module locates the JSON payload in free text and deserializes it.
//!
//! Candidates are tried in order and the first one that deserializes wins:
//!
//! 1. The body of a fenced code block (```` ```json ... ``` ````)
//! 2. The outermost `{...}` (or `[...]`) span
//! 3. A span starting at the expected first key (`{"title": ...` or `[{"ingredient": ...`)
//!
//! There is no field-scraping fallback: text without a usable JSON payload is an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::AiError;

lazy_static! {
    static ref FENCED_BLOCK_REGEX: Regex = Regex::new(r"```(?:json|JSON)?\s*\n([\s\S]*?)\n\s*```")
        .expect("Fenced block pattern should be valid");
    static ref TITLE_OBJECT_REGEX: Regex =
        Regex::new(r#"(?s)\{\s*"title"\s*:.+\}"#).expect("Title object pattern should be valid");
    static ref INGREDIENT_ARRAY_REGEX: Regex =
        Regex::new(r#"(?s)\[\s*\{\s*"ingredient"\s*:.+\}\s*\]"#)
            .expect("Ingredient array pattern should be valid");
}

/// The top-level JSON shape expected from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// A recipe object
    Object,
    /// A list of category assignments
    Array,
}

impl JsonShape {
    fn delimiters(&self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }

    fn keyed_pattern(&self) -> &'static Regex {
        match self {
            JsonShape::Object => &TITLE_OBJECT_REGEX,
            JsonShape::Array => &INGREDIENT_ARRAY_REGEX,
        }
    }
}

/// Collect JSON candidates from model text, most preferred first
pub fn json_candidates(text: &str, shape: JsonShape) -> Vec<&str> {
    let mut candidates = Vec::new();

    if let Some(body) = FENCED_BLOCK_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    {
        if !body.is_empty() {
            candidates.push(body);
        }
    }

    let (open, close) = shape.delimiters();
    if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
        if start < end {
            candidates.push(text[start..=end].trim());
        }
    }

    if let Some(m) = shape.keyed_pattern().find(text) {
        candidates.push(m.as_str());
    }

    candidates.dedup();
    candidates
}

/// Locate and deserialize the JSON payload of a model response
///
/// # Errors
///
/// - [`AiError::EmptyResponse`] for blank text
/// - [`AiError::NoJsonFound`] when no candidate span exists
/// - [`AiError::InvalidJson`] when every candidate fails to deserialize
///
/// # Examples
///
/// ```rust
/// use easycook::response_parsing::{parse_json_response, JsonShape};
/// use serde_json::Value;
///
/// let text = "Here is your recipe:\n```json\n{\"title\": \"Soup\"}\n```\nEnjoy!";
/// let value: Value = parse_json_response(text, JsonShape::Object).unwrap();
/// assert_eq!(value["title"], "Soup");
/// ```
pub fn parse_json_response<T: DeserializeOwned>(text: &str, shape: JsonShape) -> Result<T, AiError> {
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let candidates = json_candidates(text, shape);
    if candidates.is_empty() {
        warn!(response_length = text.len(), "No JSON structure found in model response");
        return Err(AiError::NoJsonFound);
    }

    let mut last_error = None;
    for (attempt, candidate) in candidates.iter().enumerate() {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => {
                debug!(attempt, candidate_length = candidate.len(), "Extracted JSON from model response");
                return Ok(value);
            }
            Err(e) => {
                debug!(attempt, error = %e, "JSON candidate rejected");
                last_error = Some(e);
            }
        }
    }

    let message = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no candidate parsed".to_string());
    warn!(error = %message, "Every JSON candidate in the model response was invalid");
    Err(AiError::InvalidJson(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_raw_json_object() {
        let value: Value = parse_json_response(r#"{"title": "Pancakes"}"#, JsonShape::Object).unwrap();
        assert_eq!(value["title"], "Pancakes");
    }

    #[test]
    fn test_fenced_block_is_preferred() {
        let text = "Sure! {not json}\n```json\n{\"title\": \"Fenced\"}\n```\n";
        let value: Value = parse_json_response(text, JsonShape::Object).unwrap();
        assert_eq!(value["title"], "Fenced");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let text = "```\n[{\"ingredient\": \"flour\", \"category\": \"Baking Supplies\"}]\n```";
        let value: Value = parse_json_response(text, JsonShape::Array).unwrap();
        assert_eq!(value[0]["ingredient"], "flour");
    }

    #[test]
    fn test_outermost_braces_in_prose() {
        let text = "The recipe is {\"title\": \"Stew\", \"procedure\": [\"Simmer {low}\"]} as requested.";
        let value: Value = parse_json_response(text, JsonShape::Object).unwrap();
        assert_eq!(value["title"], "Stew");
    }

    #[test]
    fn test_invalid_fence_falls_back_to_braces() {
        let text = "```json\nsorry, see below\n```\nActually: {\"title\": \"Fixed\"}";
        let candidates = json_candidates(text, JsonShape::Object);
        assert_eq!(candidates[0], "sorry, see below");
        let value: Value = parse_json_response(text, JsonShape::Object).unwrap();
        assert_eq!(value["title"], "Fixed");
    }

    #[test]
    fn test_no_json_is_an_error() {
        let err = parse_json_response::<Value>("I could not find a recipe.", JsonShape::Object).unwrap_err();
        assert_eq!(err, AiError::NoJsonFound);
    }

    #[test]
    fn test_unparsable_json_is_an_error() {
        let err = parse_json_response::<Value>("{title: no quotes}", JsonShape::Object).unwrap_err();
        assert!(matches!(err, AiError::InvalidJson(_)));
    }

    #[test]
    fn test_empty_text() {
        let err = parse_json_response::<Value>("   ", JsonShape::Array).unwrap_err();
        assert_eq!(err, AiError::EmptyResponse);
    }
}
