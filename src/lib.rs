//! # EasyCook Telegram Bot
//!
//! A Telegram bot that captures recipes from text, video links and voice notes
//! with a generative model, plans meals on a calendar and turns the plan into a
//! categorized grocery list.

pub mod ai_client;
pub mod app_state;
pub mod bot;
pub mod capture_tracker;
pub mod categorizer;
pub mod category;
pub mod checklist;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod grocery;
pub mod grocery_list;
pub mod localization;
pub mod meal_plan;
pub mod quantity;
pub mod recipe_capture;
pub mod recipe_model;
pub mod response_parsing;
pub mod tags;
pub mod youtube;
