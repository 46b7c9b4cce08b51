//! Message Handler module for processing incoming Telegram messages

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::capture_tracker::CaptureToken;
use crate::dialogue::{RecipeDialogue, RecipeDialogueState};
use crate::errors::CaptureError;
use crate::localization::t_lang;
use crate::recipe_capture::{parse_recipe, parse_recipe_from_audio};
use crate::recipe_model::RecipeDraft;

use super::command_handler::handle_command;
use super::commands::parse_command;
use super::dialogue_manager::{handle_recipe_name_input, send_recipe_review};

/// Audio larger than this is refused before download
const MAX_AUDIO_BYTES: u32 = 20 * 1024 * 1024;

/// Telegram language code of the sender
pub fn language_code(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url)
        .await
        .context("Failed to download file")?
        .error_for_status()
        .context("Telegram refused the file download")?;
    let bytes = response.bytes().await.context("Failed to read file body")?;
    Ok(bytes.to_vec())
}

/// User-facing key for a failed capture
fn capture_error_key(error: &CaptureError) -> &'static str {
    match error {
        CaptureError::EmptyInput => "capture-empty",
        CaptureError::IncompleteRecipe(_) => "capture-incomplete",
        CaptureError::Ai(crate::errors::AiError::CircuitOpen) => "capture-unavailable",
        CaptureError::Ai(crate::errors::AiError::Timeout(_)) => "capture-timeout",
        CaptureError::Ai(_) => "capture-failed",
    }
}

/// Deliver a capture result unless a newer capture replaced it
async fn deliver_capture(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    token: CaptureToken,
    dialogue: &RecipeDialogue,
    result: Result<RecipeDraft, CaptureError>,
    language_code: Option<&str>,
) -> Result<()> {
    if !state.captures.finish(chat_id, token) {
        info!(user_id = %chat_id, "Dropping stale capture result");
        return Ok(());
    }

    match result {
        Ok(draft) => send_recipe_review(bot, chat_id, dialogue, draft, language_code).await,
        Err(e) => {
            warn!(user_id = %chat_id, error = %e, "Recipe capture failed");
            bot.send_message(chat_id, t_lang(capture_error_key(&e), language_code))
                .await?;
            Ok(())
        }
    }
}

/// Start a capture from text or a video link in a background task
async fn start_text_capture(
    bot: &Bot,
    msg: &Message,
    dialogue: RecipeDialogue,
    state: Arc<AppState>,
    text: &str,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = language_code(msg).map(str::to_string);
    let is_video = crate::youtube::is_youtube_url(text);

    let token = state.captures.begin(chat_id);
    info!(user_id = %chat_id, is_video, "Starting recipe capture");

    let key = if is_video { "capture-started-video" } else { "capture-started" };
    bot.send_message(chat_id, t_lang(key, language_code.as_deref()))
        .await?;

    let bot = bot.clone();
    let input = text.to_string();
    tokio::spawn(async move {
        let result = parse_recipe(state.generator.as_ref(), &input).await;
        if let Err(e) = deliver_capture(
            &bot,
            &state,
            chat_id,
            token,
            &dialogue,
            result,
            language_code.as_deref(),
        )
        .await
        {
            error!(user_id = %chat_id, error = %e, "Failed to deliver capture result");
        }
    });

    Ok(())
}

/// Start a capture from a voice message or audio file
async fn start_audio_capture(
    bot: &Bot,
    msg: &Message,
    dialogue: RecipeDialogue,
    state: Arc<AppState>,
    file_id: FileId,
    file_size: u32,
    mime_type: String,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = language_code(msg).map(str::to_string);

    if file_size > MAX_AUDIO_BYTES {
        warn!(user_id = %chat_id, file_size, "Audio too large");
        bot.send_message(chat_id, t_lang("capture-audio-too-large", language_code.as_deref()))
            .await?;
        return Ok(());
    }

    let token = state.captures.begin(chat_id);
    info!(user_id = %chat_id, mime_type = %mime_type, "Starting audio recipe capture");
    bot.send_message(chat_id, t_lang("capture-started-audio", language_code.as_deref()))
        .await?;

    let bot = bot.clone();
    tokio::spawn(async move {
        let result = match download_file(&bot, file_id).await {
            Ok(bytes) => parse_recipe_from_audio(state.generator.as_ref(), &bytes, &mime_type).await,
            Err(e) => {
                error!(user_id = %chat_id, error = %e, "Failed to download audio");
                Err(CaptureError::EmptyInput)
            }
        };
        if let Err(e) = deliver_capture(
            &bot,
            &state,
            chat_id,
            token,
            &dialogue,
            result,
            language_code.as_deref(),
        )
        .await
        {
            error!(user_id = %chat_id, error = %e, "Failed to deliver capture result");
        }
    });

    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    dialogue: RecipeDialogue,
    state: Arc<AppState>,
    text: &str,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");
    let message_language = language_code(msg);

    if let Some(command) = parse_command(text) {
        return match command {
            Ok(command) => handle_command(bot, msg, dialogue, state, command).await,
            Err(e) => {
                bot.send_message(msg.chat.id, t_lang(e.message_key(), message_language))
                    .await?;
                Ok(())
            }
        };
    }

    match dialogue.get().await? {
        Some(RecipeDialogueState::WaitingForRecipeName {
            draft,
            language_code: dialogue_lang_code,
        }) => {
            let effective_language_code = dialogue_lang_code.as_deref().or(message_language);
            handle_recipe_name_input(bot, msg, &dialogue, text, draft, effective_language_code).await
        }
        Some(RecipeDialogueState::ReviewRecipe {
            language_code: dialogue_lang_code,
            ..
        }) => {
            let effective_language_code = dialogue_lang_code.as_deref().or(message_language);
            bot.send_message(msg.chat.id, t_lang("review-pending", effective_language_code))
                .await?;
            Ok(())
        }
        Some(RecipeDialogueState::Start) | None => {
            start_text_capture(bot, msg, dialogue, state, text).await
        }
    }
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    let language_code = language_code(msg);
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");

    let help_message = format!(
        "{}\n\n{}",
        t_lang("unsupported-title", language_code),
        t_lang("unsupported-description", language_code)
    );
    bot.send_message(msg.chat.id, help_message).await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    dialogue: RecipeDialogue,
) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, dialogue, state, text).await?;
    } else if let Some(voice) = msg.voice() {
        let mime_type = voice
            .mime_type
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "audio/ogg".to_string());
        start_audio_capture(&bot, &msg, dialogue, state, voice.file.id.clone(), voice.file.size, mime_type)
            .await?;
    } else if let Some(audio) = msg.audio() {
        let mime_type = audio
            .mime_type
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "audio/mpeg".to_string());
        start_audio_capture(&bot, &msg, dialogue, state, audio.file.id.clone(), audio.file.size, mime_type)
            .await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AiError;

    #[test]
    fn test_capture_error_keys() {
        assert_eq!(capture_error_key(&CaptureError::EmptyInput), "capture-empty");
        assert_eq!(
            capture_error_key(&CaptureError::IncompleteRecipe("no ingredients".into())),
            "capture-incomplete"
        );
        assert_eq!(capture_error_key(&CaptureError::Ai(AiError::CircuitOpen)), "capture-unavailable");
        assert_eq!(capture_error_key(&CaptureError::Ai(AiError::NoJsonFound)), "capture-failed");
    }
}
