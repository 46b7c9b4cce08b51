//! Grocery Handler module for generating and editing grocery lists in chat
//!
//! Generation runs in a background task so a chat can be told that a list is
//! already on its way. The per-chat screen lock is never held across a
//! database or model call.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::checklist::checklist_text;
use crate::db;
use crate::errors::GroceryError;
use crate::grocery::{finish, prepare};
use crate::grocery_list::GroceryScreen;
use crate::localization::{t_args_lang, t_lang};
use crate::recipe_model::DateRange;

use super::ui_builder::{create_grocery_keyboard, format_grocery_screen};

/// Range for `/grocery [start] [end]`
///
/// No dates means the week starting today, a single date the week starting
/// there. A reversed range is treated as no range.
pub fn resolve_range(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Option<DateRange> {
    match (start, end) {
        (None, _) => Some(DateRange::week_from(today)),
        (Some(start), None) => Some(DateRange::week_from(start)),
        (Some(start), Some(end)) if start <= end => Some(DateRange::new(start, end)),
        (Some(_), Some(_)) => None,
    }
}

async fn send_grocery_error(bot: &Bot, chat_id: ChatId, error: GroceryError, language_code: Option<&str>) -> Result<()> {
    bot.send_message(chat_id, t_lang(error.message_key(), language_code))
        .await?;
    Ok(())
}

/// Start generating a grocery list for a chat
pub async fn start_grocery_generation(
    bot: &Bot,
    chat_id: ChatId,
    state: Arc<AppState>,
    range: Option<DateRange>,
    language_code: Option<&str>,
) -> Result<()> {
    let begun = state
        .with_grocery_screen(chat_id, |screen| screen.begin_generation(range))
        .await;

    let range = match begun {
        Ok(range) => range,
        Err(e) => {
            debug!(user_id = %chat_id, error = %e, "Grocery generation not started");
            return send_grocery_error(bot, chat_id, e, language_code).await;
        }
    };

    info!(user_id = %chat_id, range = %range, "Generating grocery list");
    if let Err(e) = bot
        .send_message(chat_id, t_lang("grocery-generating", language_code))
        .await
    {
        state.with_grocery_screen(chat_id, GroceryScreen::abort).await;
        return Err(e.into());
    }

    let bot = bot.clone();
    let language_code = language_code.map(str::to_string);
    tokio::spawn(async move {
        if let Err(e) = run_grocery_generation(&bot, chat_id, &state, range, language_code.as_deref()).await {
            error!(user_id = %chat_id, error = %e, "Grocery generation failed");
            state.with_grocery_screen(chat_id, GroceryScreen::abort).await;
            if let Err(e) = bot
                .send_message(chat_id, t_lang("error-grocery-failed", language_code.as_deref()))
                .await
            {
                error!(user_id = %chat_id, error = %e, "Failed to report grocery failure");
            }
        }
    });

    Ok(())
}

async fn run_grocery_generation(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    range: DateRange,
    language_code: Option<&str>,
) -> Result<()> {
    let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
    let entries = db::meal_plan_entries_in_range(&state.pool, user.id, &range).await?;
    let recipes = db::recipes_by_id(&state.pool, user.id).await?;

    let prepared = match prepare(Some(range), &entries, &recipes, &state.grocery) {
        Ok(prepared) => prepared,
        Err(e) => {
            state.with_grocery_screen(chat_id, |screen| screen.fail(e)).await;
            return send_grocery_error(bot, chat_id, e, language_code).await;
        }
    };

    let list = finish(state.categorizer.as_ref(), prepared).await;
    debug!(user_id = %chat_id, lines = list.lines.len(), outcome = ?list.outcome, "Grocery list ready");

    let (text, keyboard) = state
        .with_grocery_screen(chat_id, |screen| {
            screen.complete(list);
            render(screen, language_code)
        })
        .await;

    let request = bot.send_message(chat_id, text);
    match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}

fn render(
    screen: &GroceryScreen,
    language_code: Option<&str>,
) -> (String, Option<teloxide::types::InlineKeyboardMarkup>) {
    let text = format_grocery_screen(screen, language_code);
    let keyboard = screen
        .view()
        .filter(|view| !view.is_empty())
        .map(|view| create_grocery_keyboard(view, language_code));
    (text, keyboard)
}

async fn edit_screen(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
) {
    let request = bot.edit_message_text(chat_id, message_id, text);
    let result = match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await,
        None => request.await,
    };
    if let Err(e) = result {
        error!(user_id = %chat_id, error = %e, "Failed to edit grocery message");
    }
}

/// Toggle one line from its keyboard button
pub async fn toggle_grocery_line(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &AppState,
    index: usize,
    language_code: Option<&str>,
) -> Result<()> {
    let rendered = state
        .with_grocery_screen(chat_id, |screen| {
            let toggled = screen.view_mut().and_then(|view| view.toggle(index));
            toggled.map(|_| render(screen, language_code))
        })
        .await;

    match rendered {
        Some((text, keyboard)) => edit_screen(bot, chat_id, message_id, text, keyboard).await,
        None => {
            warn!(user_id = %chat_id, index, "Toggle for a grocery line that no longer exists");
            bot.send_message(chat_id, t_lang("grocery-expired", language_code))
                .await?;
        }
    }
    Ok(())
}

/// Remove every checked line
pub async fn clear_checked_lines(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &AppState,
    language_code: Option<&str>,
) -> Result<()> {
    let cleared = state
        .with_grocery_screen(chat_id, |screen| {
            let removed = screen.view_mut().map(|view| view.clear_checked());
            removed.map(|removed| (removed, render(screen, language_code)))
        })
        .await;

    let Some((removed, (text, keyboard))) = cleared else {
        bot.send_message(chat_id, t_lang("grocery-expired", language_code))
            .await?;
        return Ok(());
    };

    debug!(user_id = %chat_id, removed, "Cleared checked grocery lines");
    edit_screen(bot, chat_id, message_id, text, keyboard).await;
    let count = removed.to_string();
    bot.send_message(
        chat_id,
        t_args_lang("grocery-cleared", &[("count", count.as_str())], language_code),
    )
    .await?;
    Ok(())
}

/// Send the current list as a plain checklist note
pub async fn export_checklist(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    language_code: Option<&str>,
) -> Result<()> {
    let exported = state
        .with_grocery_screen(chat_id, |screen| {
            let range = screen.range()?;
            let view = screen.view()?;
            let title = t_args_lang(
                "checklist-title",
                &[("range", range.to_string().as_str())],
                language_code,
            );
            Some(checklist_text(&title, view.lines()))
        })
        .await;

    match exported {
        Some(text) => {
            info!(user_id = %chat_id, "Exported grocery checklist");
            bot.send_message(chat_id, text).await?;
        }
        None => {
            bot.send_message(chat_id, t_lang("grocery-expired", language_code))
                .await?;
        }
    }
    Ok(())
}
