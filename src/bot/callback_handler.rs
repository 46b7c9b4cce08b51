//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::dialogue::{RecipeDialogue, RecipeDialogueState};
use crate::localization::t_lang;

use super::dialogue_manager::{cancel_review, confirm_recipe, start_rename};
use super::grocery_handler::{clear_checked_lines, export_checklist, toggle_grocery_line};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
    dialogue: RecipeDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let data = q.data.as_deref().unwrap_or("");
    let language_code = q.from.language_code.as_deref();

    if let Some(msg) = &q.message {
        let chat_id = msg.chat().id;

        if data.starts_with("recipe_") {
            handle_review_callback(&bot, chat_id, data, &dialogue, state, language_code).await?;
        } else if let Some(index) = data.strip_prefix("grocery_toggle_") {
            match index.parse::<usize>() {
                Ok(index) => {
                    toggle_grocery_line(&bot, chat_id, msg.id(), &state, index, language_code).await?
                }
                Err(_) => warn!(user_id = %q.from.id, data, "Malformed grocery toggle"),
            }
        } else if data == "grocery_clear" {
            clear_checked_lines(&bot, chat_id, msg.id(), &state, language_code).await?;
        } else if data == "grocery_export" {
            export_checklist(&bot, chat_id, &state, language_code).await?;
        } else {
            warn!(user_id = %q.from.id, data, "Unknown callback data");
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_review_callback(
    bot: &Bot,
    chat_id: ChatId,
    data: &str,
    dialogue: &RecipeDialogue,
    state: Arc<AppState>,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(RecipeDialogueState::ReviewRecipe {
        draft,
        language_code: dialogue_lang_code,
        ..
    }) = dialogue.get().await?
    else {
        // Buttons of an old review stay visible after it ended
        bot.send_message(chat_id, t_lang("review-expired", language_code))
            .await?;
        return Ok(());
    };
    let language_code = dialogue_lang_code.as_deref().or(language_code);

    match data {
        "recipe_confirm" => confirm_recipe(bot, chat_id, dialogue, state, draft, language_code).await,
        "recipe_rename" => start_rename(bot, chat_id, dialogue, draft, language_code).await,
        "recipe_cancel" => cancel_review(bot, chat_id, dialogue, language_code).await,
        other => {
            warn!(user_id = %chat_id, data = other, "Unknown review callback");
            Ok(())
        }
    }
}
