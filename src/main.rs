use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use easycook::ai_client::{GeminiClient, TextGenerator};
use easycook::app_state::AppState;
use easycook::bot;
use easycook::categorizer::AiCategorizer;
use easycook::config::{AppConfig, LogFormat};
use easycook::db;
use easycook::dialogue::RecipeDialogueState;
use easycook::grocery::Categorizer;
use easycook::localization;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting EasyCook Telegram Bot");

    localization::init_localization_from(&config.locales_dir)
        .with_context(|| format!("Failed to load locales from {}", config.locales_dir.display()))?;

    info!("Connecting to database");
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    db::init_database_schema(&pool).await?;

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(config.ai.clone())?);
    let categorizer: Arc<dyn Categorizer> = Arc::new(AiCategorizer::new(Arc::clone(&generator)));
    let state = Arc::new(AppState::new(pool, generator, categorizer, config.grocery));

    let bot = Bot::new(config.telegram_bot_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<RecipeDialogueState>, RecipeDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<RecipeDialogueState>, RecipeDialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<RecipeDialogueState>::new(), state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
