//! Command Handler module executing parsed slash commands

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::db;
use crate::localization::{t_args_lang, t_lang};
use crate::meal_plan::todays_meals;
use crate::recipe_model::MealPlanEntry;
use crate::dialogue::RecipeDialogue;

use super::commands::BotCommand;
use super::grocery_handler::{resolve_range, start_grocery_generation};
use super::message_handler::language_code;
use super::ui_builder::{format_meals_for_date, format_recipe_list, format_todays_meals};

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn reply(bot: &Bot, msg: &Message, text: String) -> Result<()> {
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub async fn handle_command(
    bot: &Bot,
    msg: &Message,
    dialogue: RecipeDialogue,
    state: Arc<AppState>,
    command: BotCommand,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = language_code(msg);
    debug!(user_id = %chat_id, command = ?command, "Handling command");

    match command {
        BotCommand::Start => {
            db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let welcome = format!(
                "👋 {}\n\n{}\n\n{}\n• {}\n• {}\n• {}\n\n{}",
                t_lang("welcome-title", language_code),
                t_lang("welcome-description", language_code),
                t_lang("welcome-features", language_code),
                t_lang("welcome-text", language_code),
                t_lang("welcome-video", language_code),
                t_lang("welcome-voice", language_code),
                t_lang("welcome-commands", language_code)
            );
            reply(bot, msg, welcome).await
        }
        BotCommand::Help => {
            let help = [
                "help-title",
                "help-capture",
                "help-commands",
                "help-recipes",
                "help-today",
                "help-plan",
                "help-unplan",
                "help-meals",
                "help-grocery",
                "help-favorite",
                "help-servings",
                "help-delete",
                "help-cancel",
            ]
            .iter()
            .map(|key| t_lang(key, language_code))
            .collect::<Vec<_>>()
            .join("\n");
            reply(bot, msg, help).await
        }
        BotCommand::Recipes => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let recipes = db::list_user_recipes(&state.pool, user.id).await?;
            reply(bot, msg, format_recipe_list(&recipes, language_code)).await
        }
        BotCommand::Today => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let today = today();
            let entries = db::meal_plan_entries_for_date(&state.pool, user.id, today).await?;
            let recipes = db::recipes_by_id(&state.pool, user.id).await?;
            let meals = todays_meals(&entries, &recipes, today, &state.grocery);
            reply(bot, msg, format_todays_meals(&meals, language_code)).await
        }
        BotCommand::Plan {
            date,
            slot,
            recipe_id,
            servings,
        } => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let recipe = db::read_recipe(&state.pool, recipe_id)
                .await?
                .filter(|recipe| recipe.user_id == user.id);
            let Some(recipe) = recipe else {
                return reply(bot, msg, t_lang("recipe-not-found", language_code)).await;
            };

            let mut entry = MealPlanEntry::new(date, slot, recipe_id);
            if let Some(servings) = servings {
                entry = entry.with_servings(servings);
            }
            let entry_id = db::add_meal_plan_entry(&state.pool, user.id, &entry).await?;
            info!(user_id = %chat_id, entry_id, recipe_id, "Meal planned");

            let entry_id = entry_id.to_string();
            let date = date.format("%Y-%m-%d").to_string();
            let slot = t_lang(&format!("slot-{}", slot.as_str()), language_code);
            reply(
                bot,
                msg,
                t_args_lang(
                    "plan-added",
                    &[
                        ("recipe_name", recipe.title.as_str()),
                        ("date", date.as_str()),
                        ("slot", slot.as_str()),
                        ("entry_id", entry_id.as_str()),
                    ],
                    language_code,
                ),
            )
            .await
        }
        BotCommand::Unplan(entry_id) => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let key = if db::remove_meal_plan_entry(&state.pool, user.id, entry_id).await? {
                "plan-removed"
            } else {
                "plan-not-found"
            };
            reply(bot, msg, t_lang(key, language_code)).await
        }
        BotCommand::Meals(date) => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let entries = db::meal_plan_entries_for_date(&state.pool, user.id, date).await?;
            let recipes = db::recipes_by_id(&state.pool, user.id).await?;
            let day = date.format("%Y-%m-%d").to_string();
            let text = format!(
                "📅 {}\n\n{}",
                t_args_lang("meals-title", &[("date", day.as_str())], language_code),
                format_meals_for_date(&entries, &recipes, language_code)
            );
            reply(bot, msg, text).await
        }
        BotCommand::Grocery { start, end } => {
            let range = resolve_range(start, end, today());
            start_grocery_generation(bot, chat_id, state, range, language_code).await
        }
        BotCommand::Favorite(recipe_id) => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let recipe = db::read_recipe(&state.pool, recipe_id)
                .await?
                .filter(|recipe| recipe.user_id == user.id);
            let Some(recipe) = recipe else {
                return reply(bot, msg, t_lang("recipe-not-found", language_code)).await;
            };

            let favorite = !recipe.is_favorite;
            db::set_favorite(&state.pool, user.id, recipe_id, favorite).await?;
            let key = if favorite { "favorite-on" } else { "favorite-off" };
            reply(
                bot,
                msg,
                t_args_lang(key, &[("recipe_name", recipe.title.as_str())], language_code),
            )
            .await
        }
        BotCommand::Servings {
            recipe_id,
            servings,
            number_of_meals,
        } => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let number_of_meals = number_of_meals.unwrap_or(1);
            if !db::update_servings(&state.pool, user.id, recipe_id, servings, number_of_meals).await? {
                return reply(bot, msg, t_lang("recipe-not-found", language_code)).await;
            }
            let servings = servings.to_string();
            let meals = number_of_meals.to_string();
            reply(
                bot,
                msg,
                t_args_lang(
                    "servings-updated",
                    &[("servings", servings.as_str()), ("meals", meals.as_str())],
                    language_code,
                ),
            )
            .await
        }
        BotCommand::Delete(recipe_id) => {
            let user = db::get_or_create_user(&state.pool, chat_id.0, language_code).await?;
            let key = if db::delete_recipe(&state.pool, user.id, recipe_id).await? {
                info!(user_id = %chat_id, recipe_id, "Recipe deleted");
                "recipe-deleted"
            } else {
                "recipe-not-found"
            };
            reply(bot, msg, t_lang(key, language_code)).await
        }
        BotCommand::Cancel => {
            state.captures.cancel(chat_id);
            dialogue.exit().await?;
            reply(bot, msg, t_lang("cancelled", language_code)).await
        }
    }
}
