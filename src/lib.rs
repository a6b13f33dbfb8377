//! # Meal-planning Telegram Bot
//!
//! A Telegram bot that collects a nutrition profile through a short dialog,
//! computes daily calorie and macro targets, and serves menus, shopping
//! lists and product substitutions, optionally backed by a generative-text
//! assistant.

pub mod ai;
pub mod bot;
pub mod commands;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod meal_plan;
pub mod nutrition;
pub mod profile;
pub mod session;
pub mod storage;
pub mod update;
