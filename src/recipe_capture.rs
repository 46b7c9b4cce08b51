//! # Recipe Capture Module
//!
//! Turns a free-text description, a YouTube link or a voice recording into a
//! [`RecipeDraft`] by prompting the generative model and validating its JSON answer.
//!
//! ## Flow
//!
//! 1. Build the prompt (system prompt plus an input-specific instruction)
//! 2. Send it through a [`TextGenerator`]
//! 3. Locate the JSON payload in the answer (see [`crate::response_parsing`])
//! 4. Validate title and ingredients, then enrich with tags, links and metadata
//!
//! A payload without a title or without ingredients is rejected; there is no
//! best-effort scraping of malformed answers.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::ai_client::{ContentPart, TextGenerator};
use crate::errors::CaptureError;
use crate::recipe_model::{Ingredient, RecipeDraft, RecipeMetadata, RecipeSource, StepTimestamp};
use crate::response_parsing::{parse_json_response, JsonShape};
use crate::tags::suggest_tags;
use crate::youtube;

pub const SYSTEM_PROMPT: &str = r#"You are a professional chef and recipe expert. Create a detailed recipe in JSON format.

Return ONLY a valid JSON object without any markdown formatting, explanations, or extra text. Use this exact structure:
{
  "title": "Recipe name",
  "ingredients": [
    {
      "name": "ingredient name (be specific)",
      "quantity": "amount (e.g., '2 medium-sized', '1 cup', '2 tablespoons')"
    }
  ],
  "procedure": [
    "Step 1: Detailed cooking instruction",
    "Step 2: Include timing, temperature, and technique details"
  ],
  "timestamps": [
    {
      "step": 1,
      "timestamp": "00:00"
    }
  ]
}

Formatting rules:
1. Output just the raw JSON object, no markdown code blocks
2. No explanation text before or after the JSON
3. Never return "Not specified" or empty values
4. If exact quantities aren't given, provide reasonable estimates
5. Include every cooking step with timing and temperature details
6. For YouTube videos, include a timestamp for each step when possible"#;

const VIDEO_INSTRUCTION: &str = "Extract recipe from this video";
const AUDIO_INSTRUCTION: &str =
    "Listen to this audio recording and extract the recipe details. Format the response as a JSON object according to the structure above.";

lazy_static! {
    static ref STEP_PREFIX_REGEX: Regex =
        Regex::new(r"(?i)^\s*step\s*\d+\s*[:.)-]\s*").expect("Step prefix pattern should be valid");
}

#[derive(Debug, Deserialize)]
struct RecipePayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    ingredients: Vec<IngredientPayload>,
    #[serde(default)]
    procedure: Vec<String>,
    #[serde(default)]
    timestamps: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct IngredientPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    quantity: Value,
}

#[derive(Debug, Deserialize)]
struct TimestampPayload {
    step: u32,
    timestamp: String,
}

// Timestamps are optional extras, a malformed entry is dropped on its own
fn timestamp_payload(value: Value) -> Option<TimestampPayload> {
    match serde_json::from_value::<TimestampPayload>(value) {
        Ok(t) if t.step >= 1 => Some(t),
        Ok(t) => {
            debug!(step = t.step, "Dropping timestamp for step 0");
            None
        }
        Err(e) => {
            debug!(error = %e, "Dropping malformed step timestamp");
            None
        }
    }
}

/// Capture a recipe from a free-text description or a YouTube link
#[instrument(skip(generator, input), fields(input_length = input.len()))]
pub async fn parse_recipe(generator: &dyn TextGenerator, input: &str) -> Result<RecipeDraft, CaptureError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CaptureError::EmptyInput);
    }

    let is_video = youtube::is_youtube_url(input);
    let parts = if is_video {
        vec![
            ContentPart::text(format!("{SYSTEM_PROMPT}\n\n{VIDEO_INSTRUCTION}")),
            ContentPart::file_uri(input),
        ]
    } else {
        vec![ContentPart::text(format!(
            "{SYSTEM_PROMPT}\n\nParse recipe from this description: {input}"
        ))]
    };

    let text = generator.generate(parts).await?;

    let (source, video_id) = if is_video {
        (RecipeSource::Youtube, youtube::extract_video_id(input))
    } else {
        (RecipeSource::Text, None)
    };

    let mut draft = build_draft(&text, source, Some(input.to_string()), video_id.as_deref())?;
    if is_video {
        draft.url = Some(input.to_string());
    }

    info!(title = %draft.title, ingredients = draft.ingredients.len(), source = ?source, "Recipe captured");
    Ok(draft)
}

/// Capture a recipe from a voice recording sent inline to the model
#[instrument(skip(generator, audio, mime_type), fields(audio_bytes = audio.len(), mime_type = %mime_type))]
pub async fn parse_recipe_from_audio(
    generator: &dyn TextGenerator,
    audio: &[u8],
    mime_type: &str,
) -> Result<RecipeDraft, CaptureError> {
    if audio.is_empty() {
        return Err(CaptureError::EmptyInput);
    }

    let parts = vec![
        ContentPart::text(format!("{SYSTEM_PROMPT}\n\n{AUDIO_INSTRUCTION}")),
        ContentPart::inline_bytes(mime_type, audio),
    ];

    let text = generator.generate(parts).await?;
    let draft = build_draft(&text, RecipeSource::Audio, None, None)?;

    info!(title = %draft.title, ingredients = draft.ingredients.len(), "Recipe captured from audio");
    Ok(draft)
}

/// Validate the model answer and turn it into a draft
pub fn build_draft(
    response_text: &str,
    source: RecipeSource,
    original_input: Option<String>,
    video_id: Option<&str>,
) -> Result<RecipeDraft, CaptureError> {
    let payload: RecipePayload = parse_json_response(response_text, JsonShape::Object)?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        warn!("Model answer has no recipe title");
        return Err(CaptureError::IncompleteRecipe("missing title".to_string()));
    }

    let ingredients: Vec<Ingredient> = payload
        .ingredients
        .into_iter()
        .filter(|i| !i.name.trim().is_empty())
        .map(|i| Ingredient::new(i.name.trim(), quantity_text(&i.quantity)))
        .collect();
    if ingredients.is_empty() {
        warn!(title = %title, "Model answer has no ingredients");
        return Err(CaptureError::IncompleteRecipe("no ingredients".to_string()));
    }

    let procedure: Vec<String> = payload
        .procedure
        .iter()
        .map(|step| STEP_PREFIX_REGEX.replace(step, "").trim().to_string())
        .filter(|step| !step.is_empty())
        .collect();

    let timestamps = payload
        .timestamps
        .into_iter()
        .filter_map(timestamp_payload)
        .map(|t| StepTimestamp {
            url: video_id.and_then(|id| youtube::timestamp_url(id, &t.timestamp)),
            step: t.step,
            timestamp: t.timestamp,
        })
        .collect();

    let mut draft = RecipeDraft::new(title, ingredients, procedure);
    draft.suggested_tags = suggest_tags(&draft.title, &draft.ingredients, &draft.procedure);
    draft.timestamps = timestamps;
    draft.thumbnail_url = video_id.map(youtube::thumbnail_url);
    draft.ai_response = Some(response_text.to_string());
    draft.metadata = Some(RecipeMetadata {
        source,
        original_input,
        processing_date: Utc::now(),
        video_id: video_id.map(str::to_string),
    });

    Ok(draft)
}

// Models occasionally answer with a bare number for the quantity
fn quantity_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AiError;

    #[test]
    fn test_build_draft_from_fenced_answer() {
        let text = "Here you go:\n```json\n{\"title\": \"Pancakes\", \"ingredients\": [{\"name\": \"flour\", \"quantity\": \"2 cups\"}, {\"name\": \"eggs\", \"quantity\": 2}], \"procedure\": [\"Step 1: Mix\", \"Step 2: Fry\"]}\n```";
        let draft = build_draft(text, RecipeSource::Text, Some("pancakes".into()), None).unwrap();

        assert_eq!(draft.title, "Pancakes");
        assert_eq!(draft.ingredients[1], Ingredient::new("eggs", "2"));
        assert_eq!(draft.procedure, vec!["Mix", "Fry"]);
        assert!(draft.suggested_tags.contains(&"breakfast".to_string()));
        assert_eq!(draft.ai_response.as_deref(), Some(text));
        assert_eq!(draft.metadata.unwrap().source, RecipeSource::Text);
    }

    #[test]
    fn test_build_draft_links_timestamps() {
        let text = r#"{"title": "Stew", "ingredients": [{"name": "beef", "quantity": "1 kg"}], "procedure": ["Brown", "Simmer"], "timestamps": [{"step": 1, "timestamp": "00:45"}, {"step": 2, "timestamp": "soon"}]}"#;
        let draft = build_draft(text, RecipeSource::Youtube, None, Some("vid")).unwrap();

        assert_eq!(
            draft.timestamps[0].url.as_deref(),
            Some("https://www.youtube.com/watch?v=vid&t=45s")
        );
        assert_eq!(draft.timestamps[1].url, None);
        assert_eq!(
            draft.thumbnail_url.as_deref(),
            Some("https://img.youtube.com/vi/vid/hqdefault.jpg")
        );
    }

    #[test]
    fn test_malformed_timestamps_are_dropped() {
        let text = r#"{"title": "Stew", "ingredients": [{"name": "beef", "quantity": "1 kg"}], "procedure": ["Brown", "Simmer", "Rest"], "timestamps": [{"step": 1, "timestamp": 90}, {"step": "2", "timestamp": "1:00"}, {"step": 3, "timestamp": "2:30"}, "later"]}"#;
        let draft = build_draft(text, RecipeSource::Youtube, None, Some("vid")).unwrap();

        assert_eq!(draft.title, "Stew");
        assert_eq!(draft.timestamps.len(), 1);
        assert_eq!(draft.timestamps[0].step, 3);
        assert_eq!(
            draft.timestamps[0].url.as_deref(),
            Some("https://www.youtube.com/watch?v=vid&t=150s")
        );
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let text = r#"{"title": "  ", "ingredients": [{"name": "salt", "quantity": "1 tsp"}]}"#;
        assert!(matches!(
            build_draft(text, RecipeSource::Text, None, None),
            Err(CaptureError::IncompleteRecipe(_))
        ));
    }

    #[test]
    fn test_missing_ingredients_are_rejected() {
        let text = r#"{"title": "Air", "ingredients": [{"name": "", "quantity": "1"}]}"#;
        assert!(matches!(
            build_draft(text, RecipeSource::Text, None, None),
            Err(CaptureError::IncompleteRecipe(_))
        ));
    }

    #[test]
    fn test_prose_answer_is_an_error() {
        let err = build_draft("Title: Soup. Ingredients: water.", RecipeSource::Text, None, None).unwrap_err();
        assert_eq!(err, CaptureError::Ai(AiError::NoJsonFound));
    }
}
