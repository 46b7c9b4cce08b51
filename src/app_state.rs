//! Application state shared by every handler.

use sqlx::postgres::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use crate::ai_client::TextGenerator;
use crate::capture_tracker::CaptureTracker;
use crate::config::GroceryConfig;
use crate::grocery::Categorizer;
use crate::grocery_list::GroceryScreen;

/// Injected into handlers through the dispatcher dependencies
pub struct AppState {
    pub pool: PgPool,
    pub generator: Arc<dyn TextGenerator>,
    pub categorizer: Arc<dyn Categorizer>,
    pub grocery: GroceryConfig,
    pub captures: CaptureTracker,
    grocery_screens: Mutex<HashMap<ChatId, GroceryScreen>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        generator: Arc<dyn TextGenerator>,
        categorizer: Arc<dyn Categorizer>,
        grocery: GroceryConfig,
    ) -> Self {
        Self {
            pool,
            generator,
            categorizer,
            grocery,
            captures: CaptureTracker::new(),
            grocery_screens: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against the grocery screen of a chat, creating it when needed
    ///
    /// The lock is held only for the duration of `f`, never across a network call.
    pub async fn with_grocery_screen<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut GroceryScreen) -> R) -> R {
        let mut screens = self.grocery_screens.lock().await;
        f(screens.entry(chat_id).or_default())
    }
}
