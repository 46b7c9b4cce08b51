//! Dialogue Manager module for the capture review flow
//!
//! A captured draft is shown for review; the user confirms it (saved to the
//! database), renames it (next text message becomes the title) or cancels it.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::db;
use crate::dialogue::{validate_recipe_name, RecipeDialogue, RecipeDialogueState};
use crate::localization::{t_args_lang, t_lang};
use crate::recipe_model::{RecipeDraft, RecipeId};

use super::ui_builder::{create_recipe_review_keyboard, format_recipe_review};

/// Show a draft for review and enter the review state
pub async fn send_recipe_review(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &RecipeDialogue,
    draft: RecipeDraft,
    language_code: Option<&str>,
) -> Result<()> {
    let sent = bot
        .send_message(chat_id, format_recipe_review(&draft, language_code))
        .reply_markup(create_recipe_review_keyboard(language_code))
        .await?;

    dialogue
        .update(RecipeDialogueState::ReviewRecipe {
            draft,
            language_code: language_code.map(str::to_string),
            message_id: Some(sent.id.0),
        })
        .await?;

    debug!(user_id = %chat_id, "Recipe review sent");
    Ok(())
}

/// Persist a reviewed draft for the chat's user
pub async fn save_recipe_draft(
    state: &AppState,
    chat_id: ChatId,
    draft: &RecipeDraft,
    language_code: Option<&str>,
) -> Result<RecipeId> {
    let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
    let recipe_id = db::create_recipe(&state.pool, user.id, draft).await?;
    info!(user_id = %chat_id, recipe_id, "Recipe confirmed and saved");
    Ok(recipe_id)
}

/// Save the draft under review and end the dialogue
pub async fn confirm_recipe(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &RecipeDialogue,
    state: Arc<AppState>,
    draft: RecipeDraft,
    language_code: Option<&str>,
) -> Result<()> {
    match save_recipe_draft(&state, chat_id, &draft, language_code).await {
        Ok(recipe_id) => {
            let id = recipe_id.to_string();
            bot.send_message(
                chat_id,
                t_args_lang(
                    "recipe-saved",
                    &[("recipe_name", draft.title.as_str()), ("recipe_id", id.as_str())],
                    language_code,
                ),
            )
            .await?;
            dialogue.exit().await?;
        }
        Err(e) => {
            warn!(user_id = %chat_id, error = %e, "Failed to save recipe");
            // Stay in review so the user can retry
            bot.send_message(chat_id, t_lang("error-saving-recipe", language_code))
                .await?;
        }
    }
    Ok(())
}

/// Ask for a new title for the draft under review
pub async fn start_rename(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &RecipeDialogue,
    draft: RecipeDraft,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(
        chat_id,
        format!(
            "🏷️ {}\n\n{}",
            t_lang("recipe-name-prompt", language_code),
            t_lang("recipe-name-prompt-hint", language_code)
        ),
    )
    .await?;

    dialogue
        .update(RecipeDialogueState::WaitingForRecipeName {
            draft,
            language_code: language_code.map(str::to_string),
        })
        .await?;
    Ok(())
}

/// Handle the new title typed by the user
pub async fn handle_recipe_name_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &RecipeDialogue,
    text: &str,
    mut draft: RecipeDraft,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_recipe_name(text) {
        Ok(name) => {
            debug!(user_id = %msg.chat.id, "Recipe renamed");
            draft.title = name;
            send_recipe_review(bot, msg.chat.id, dialogue, draft, language_code).await
        }
        Err(reason) => {
            let key = if reason == "too_long" {
                "recipe-name-too-long"
            } else {
                "recipe-name-empty"
            };
            bot.send_message(msg.chat.id, t_lang(key, language_code)).await?;
            Ok(())
        }
    }
}

/// Drop the draft under review
pub async fn cancel_review(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &RecipeDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(chat_id, t_lang("review-cancelled", language_code))
        .await?;
    dialogue.exit().await?;
    Ok(())
}
