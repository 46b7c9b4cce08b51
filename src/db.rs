//! # Database Module
//!
//! PostgreSQL persistence for users, recipes and meal plan entries.
//!
//! Recipes keep their list-shaped fields (ingredients, procedure, tags, timestamps,
//! metadata) in JSONB columns. Meal plan entries reference recipes without a foreign
//! key, so deleting a recipe leaves its entries dangling; readers skip them.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info};

use crate::recipe_model::{
    DateRange, Ingredient, MealPlanEntry, MealSlot, Recipe, RecipeDraft, RecipeId, RecipeMetadata,
    StepTimestamp,
};

/// A bot user
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub language_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    user_id: i64,
    title: String,
    ingredients: Json<Vec<Ingredient>>,
    procedure: Json<Vec<String>>,
    servings: i32,
    number_of_meals: i32,
    tags: Json<Vec<String>>,
    is_favorite: bool,
    url: Option<String>,
    thumbnail_url: Option<String>,
    ai_response: Option<String>,
    suggested_tags: Json<Vec<String>>,
    timestamps: Json<Vec<StepTimestamp>>,
    metadata: Option<Json<RecipeMetadata>>,
    created_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            ingredients: row.ingredients.0,
            procedure: row.procedure.0,
            servings: u32::try_from(row.servings).unwrap_or(1).max(1),
            number_of_meals: u32::try_from(row.number_of_meals).unwrap_or(1).max(1),
            tags: row.tags.0,
            is_favorite: row.is_favorite,
            url: row.url,
            thumbnail_url: row.thumbnail_url,
            ai_response: row.ai_response,
            suggested_tags: row.suggested_tags.0,
            timestamps: row.timestamps.0,
            metadata: row.metadata.map(|m| m.0),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MealPlanRow {
    id: i64,
    plan_date: NaiveDate,
    meal_slot: String,
    recipe_id: i64,
    servings: Option<i32>,
}

impl TryFrom<MealPlanRow> for MealPlanEntry {
    type Error = anyhow::Error;

    fn try_from(row: MealPlanRow) -> Result<Self> {
        let slot: MealSlot = row.meal_slot.parse().map_err(anyhow::Error::msg)?;
        Ok(MealPlanEntry {
            id: Some(row.id),
            date: row.plan_date,
            slot,
            recipe_id: row.recipe_id,
            servings: row.servings.and_then(|s| u32::try_from(s).ok()),
        })
    }
}

const RECIPE_COLUMNS: &str = "id, user_id, title, ingredients, procedure, servings, number_of_meals, tags, \
     is_favorite, url, thumbnail_url, ai_response, suggested_tags, timestamps, metadata, created_at";

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT UNIQUE NOT NULL,
            language_code TEXT NOT NULL DEFAULT 'en',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            ingredients JSONB NOT NULL DEFAULT '[]',
            procedure JSONB NOT NULL DEFAULT '[]',
            servings INTEGER NOT NULL DEFAULT 1,
            number_of_meals INTEGER NOT NULL DEFAULT 1,
            tags JSONB NOT NULL DEFAULT '[]',
            is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
            url TEXT,
            thumbnail_url TEXT,
            ai_response TEXT,
            suggested_tags JSONB NOT NULL DEFAULT '[]',
            timestamps JSONB NOT NULL DEFAULT '[]',
            metadata JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    // recipe_id deliberately carries no foreign key
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_plan_entries (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            plan_date DATE NOT NULL,
            meal_slot TEXT NOT NULL,
            recipe_id BIGINT NOT NULL,
            servings INTEGER,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plan_entries table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_user ON recipes(user_id)")
        .execute(pool)
        .await
        .context("Failed to create recipes index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_meal_plan_user_date ON meal_plan_entries(user_id, plan_date)",
    )
    .execute(pool)
    .await
    .context("Failed to create meal plan index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Get a user by Telegram id, creating it on first contact
///
/// The language code is only recorded at creation.
pub async fn get_or_create_user(pool: &PgPool, telegram_id: i64, language_code: Option<&str>) -> Result<User> {
    if let Some(user) = get_user_by_telegram_id(pool, telegram_id).await? {
        return Ok(user);
    }

    let language = crate::localization::detect_language(language_code);
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (telegram_id, language_code) VALUES ($1, $2)
         ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
         RETURNING id, telegram_id, language_code, created_at",
    )
    .bind(telegram_id)
    .bind(language)
    .fetch_one(pool)
    .await
    .context("Failed to create user")?;

    info!(user_id = user.id, telegram_id, "Created user");
    Ok(user)
}

pub async fn get_user_by_telegram_id(pool: &PgPool, telegram_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT id, telegram_id, language_code, created_at FROM users WHERE telegram_id = $1",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user by telegram id")
}

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, telegram_id, language_code, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read user by id")
}

/// Store a captured recipe
pub async fn create_recipe(pool: &PgPool, user_id: i64, draft: &RecipeDraft) -> Result<RecipeId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO recipes (user_id, title, ingredients, procedure, servings, number_of_meals, tags,
             url, thumbnail_url, ai_response, suggested_tags, timestamps, metadata)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING id",
    )
    .bind(user_id)
    .bind(&draft.title)
    .bind(Json(&draft.ingredients))
    .bind(Json(&draft.procedure))
    .bind(i32::try_from(draft.servings).unwrap_or(i32::MAX))
    .bind(i32::try_from(draft.number_of_meals).unwrap_or(i32::MAX))
    .bind(Json(&draft.tags))
    .bind(&draft.url)
    .bind(&draft.thumbnail_url)
    .bind(&draft.ai_response)
    .bind(Json(&draft.suggested_tags))
    .bind(Json(&draft.timestamps))
    .bind(draft.metadata.as_ref().map(Json))
    .fetch_one(pool)
    .await
    .context("Failed to insert recipe")?;

    info!(user_id, recipe_id = id, title = %draft.title, "Recipe saved");
    Ok(id)
}

pub async fn read_recipe(pool: &PgPool, recipe_id: RecipeId) -> Result<Option<Recipe>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"))
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read recipe")?;
    Ok(row.map(Recipe::from))
}

/// Recipes of a user, favorites first then newest first
pub async fn list_user_recipes(pool: &PgPool, user_id: i64) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 ORDER BY is_favorite DESC, created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")?;

    debug!(user_id, count = rows.len(), "Listed recipes");
    Ok(rows.into_iter().map(Recipe::from).collect())
}

pub async fn set_favorite(pool: &PgPool, user_id: i64, recipe_id: RecipeId, is_favorite: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE recipes SET is_favorite = $1 WHERE id = $2 AND user_id = $3")
        .bind(is_favorite)
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update favorite flag")?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_servings(
    pool: &PgPool,
    user_id: i64,
    recipe_id: RecipeId,
    servings: u32,
    number_of_meals: u32,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE recipes SET servings = $1, number_of_meals = $2 WHERE id = $3 AND user_id = $4",
    )
    .bind(i32::try_from(servings.max(1)).unwrap_or(i32::MAX))
    .bind(i32::try_from(number_of_meals.max(1)).unwrap_or(i32::MAX))
    .bind(recipe_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update servings")?;
    Ok(result.rows_affected() > 0)
}

/// Delete a recipe; meal plan entries that reference it are left in place
pub async fn delete_recipe(pool: &PgPool, user_id: i64, recipe_id: RecipeId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete recipe")?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        info!(user_id, recipe_id, "Recipe deleted");
    }
    Ok(deleted)
}

pub async fn add_meal_plan_entry(pool: &PgPool, user_id: i64, entry: &MealPlanEntry) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meal_plan_entries (user_id, plan_date, meal_slot, recipe_id, servings)
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(user_id)
    .bind(entry.date)
    .bind(entry.slot.as_str())
    .bind(entry.recipe_id)
    .bind(entry.servings.and_then(|s| i32::try_from(s).ok()))
    .fetch_one(pool)
    .await
    .context("Failed to insert meal plan entry")?;

    info!(user_id, entry_id = id, date = %entry.date, slot = %entry.slot, "Meal planned");
    Ok(id)
}

pub async fn remove_meal_plan_entry(pool: &PgPool, user_id: i64, entry_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM meal_plan_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete meal plan entry")?;
    Ok(result.rows_affected() > 0)
}

/// Entries of a user inside an inclusive range, ordered by date then insertion
pub async fn meal_plan_entries_in_range(pool: &PgPool, user_id: i64, range: &DateRange) -> Result<Vec<MealPlanEntry>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(
        "SELECT id, plan_date, meal_slot, recipe_id, servings FROM meal_plan_entries
         WHERE user_id = $1 AND plan_date BETWEEN $2 AND $3
         ORDER BY plan_date, id",
    )
    .bind(user_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await
    .context("Failed to read meal plan entries")?;

    rows.into_iter().map(MealPlanEntry::try_from).collect()
}

pub async fn meal_plan_entries_for_date(pool: &PgPool, user_id: i64, date: NaiveDate) -> Result<Vec<MealPlanEntry>> {
    meal_plan_entries_in_range(pool, user_id, &DateRange::new(date, date)).await
}

/// Recipes of a user by id, for resolving meal plan entries
pub async fn recipes_by_id(pool: &PgPool, user_id: i64) -> Result<std::collections::HashMap<RecipeId, Recipe>> {
    Ok(list_user_recipes(pool, user_id)
        .await?
        .into_iter()
        .map(|recipe| (recipe.id, recipe))
        .collect())
}
