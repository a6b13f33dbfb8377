//! Callback Handler module for processing inline keyboard callback queries
//!
//! Payloads follow the `action:value` convention; the action picks the
//! handler and the value is handler-specific.

use teloxide::types::ChatId;
use tracing::{debug, info, warn};

use crate::dialogue::DialogState;
use crate::errors::BotError;
use crate::profile::{is_profile_complete, Goal, ProfileField};
use crate::update::IncomingCallback;

use super::context::BotContext;
use super::dialogue_manager::{
    cancel_dialog, handle_activity_selection, handle_sex_selection, offer_assistant, start_ai_dialog,
    start_field_edit,
};
use super::profile_completion::trigger_nutrition_calculation;
use super::ui_builder::{goal_keyboard, main_menu_keyboard, reset_confirmation_keyboard, shopping_list_keyboard};

pub const ACTION_SET_GOAL: &str = "set_goal";
pub const ACTION_SET_SEX: &str = "set_sex";
pub const ACTION_SET_ACTIVITY: &str = "set_activity";
pub const ACTION_TOGGLE_ITEM: &str = "toggle_item";
pub const ACTION_SETTINGS: &str = "settings";
pub const ACTION_CONFIRM: &str = "confirm";
pub const ACTION_CANCEL: &str = "cancel";
pub const ACTION_AI: &str = "ai";
pub const ACTION_DIALOG: &str = "dialog";

/// Split an `action:value` payload; the value may itself contain colons
pub fn parse_payload(data: &str) -> Option<(&str, &str)> {
    let (action, value) = data.split_once(':')?;
    let action = action.trim();
    if action.is_empty() {
        return None;
    }
    Some((action, value.trim()))
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(ctx: &BotContext, callback: IncomingCallback) -> Result<(), BotError> {
    let chat_id = callback.chat_id;
    let lang = callback.from.language_code.as_deref();

    // Acknowledge first so the client stops its spinner even if handling fails
    if let Err(e) = ctx.messenger.answer_callback(&callback.id).await {
        warn!(chat_id = %chat_id, error = %e, "Failed to answer callback query");
    }

    let data = callback.data.as_deref().unwrap_or("");
    debug!(chat_id = %chat_id, data, "Received callback query");

    let Some((action, value)) = parse_payload(data) else {
        ctx.say(chat_id, "callback-unknown", lang).await;
        return Ok(());
    };

    match (action, value) {
        (ACTION_SET_GOAL, value) => handle_goal_selection(ctx, chat_id, value, lang).await,
        (ACTION_SET_SEX, value) => {
            let session = ctx.sessions.get(chat_id).await;
            handle_sex_selection(ctx, session, value, lang).await
        }
        (ACTION_SET_ACTIVITY, value) => {
            let session = ctx.sessions.get(chat_id).await;
            handle_activity_selection(ctx, session, value, lang).await
        }
        (ACTION_TOGGLE_ITEM, value) => handle_toggle_item(ctx, &callback, value, lang).await,
        (ACTION_SETTINGS, value) => handle_settings(ctx, chat_id, value, lang).await,
        (ACTION_CONFIRM, "reset") => {
            ctx.profiles.reset_profile(chat_id).await?;
            ctx.sessions.clear(chat_id).await?;
            info!(chat_id = %chat_id, "Profile reset");
            ctx.say_with_menu(chat_id, "reset-done", lang).await;
            Ok(())
        }
        (ACTION_CANCEL, "reset") => {
            ctx.say_with_menu(chat_id, "reset-cancelled", lang).await;
            Ok(())
        }
        (ACTION_AI, "ask") => start_ai_dialog(ctx, chat_id, DialogState::AskAi, lang).await,
        (ACTION_AI, "intro") => start_ai_dialog(ctx, chat_id, DialogState::IntroResponse, lang).await,
        (ACTION_DIALOG, "cancel") => cancel_dialog(ctx, chat_id, lang).await,
        _ => {
            warn!(chat_id = %chat_id, action, value, "Unknown callback action");
            ctx.say(chat_id, "callback-unknown", lang).await;
            Ok(())
        }
    }
}

async fn handle_goal_selection(
    ctx: &BotContext,
    chat_id: ChatId,
    value: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let Ok(goal) = value.parse::<Goal>() else {
        ctx.say(chat_id, "callback-unknown", lang).await;
        return Ok(());
    };

    let profile = ctx
        .profiles
        .save_profile_field(chat_id, ProfileField::Goal(goal))
        .await?;

    if is_profile_complete(&profile) {
        let text = ctx.localizer.t_args("goal-saved", &[("goal", goal.as_str())], lang);
        ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
        trigger_nutrition_calculation(ctx, chat_id, &profile, lang).await?;
        offer_assistant(ctx, chat_id, lang).await;
    } else {
        let text = ctx
            .localizer
            .t_args("goal-saved-incomplete", &[("goal", goal.as_str())], lang);
        ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
    }
    Ok(())
}

async fn handle_toggle_item(
    ctx: &BotContext,
    callback: &IncomingCallback,
    value: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = callback.chat_id;

    let Ok(index) = value.parse::<usize>() else {
        ctx.say(chat_id, "callback-unknown", lang).await;
        return Ok(());
    };

    let Some(list) = ctx.meal_plans.toggle_shopping_item(chat_id, index).await? else {
        ctx.say(chat_id, "stale-action", lang).await;
        return Ok(());
    };

    let title = ctx.localizer.t("shopping-title", lang);
    let keyboard = shopping_list_keyboard(&list);
    match callback.message_id {
        Some(message_id) => {
            if let Err(e) = ctx
                .messenger
                .edit_message_text(chat_id, message_id, &title, Some(keyboard))
                .await
            {
                warn!(chat_id = %chat_id, error = %e, "Failed to edit shopping list");
            }
        }
        None => {
            ctx.say_inline(chat_id, "shopping-title", lang, keyboard).await;
        }
    }
    Ok(())
}

async fn handle_settings(
    ctx: &BotContext,
    chat_id: ChatId,
    value: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    match value {
        "weight" => start_field_edit(ctx, chat_id, DialogState::Weight, lang).await,
        "height" => start_field_edit(ctx, chat_id, DialogState::Height, lang).await,
        "age" => start_field_edit(ctx, chat_id, DialogState::Age, lang).await,
        "activity" => start_field_edit(ctx, chat_id, DialogState::Activity, lang).await,
        "notify_time" => start_field_edit(ctx, chat_id, DialogState::NotifyTime, lang).await,
        "goal" => {
            ctx.say_inline(chat_id, "ask-goal", lang, goal_keyboard(&ctx.localizer, lang))
                .await;
            Ok(())
        }
        "reset" => {
            ctx.say_inline(chat_id, "reset-confirm", lang, reset_confirmation_keyboard(&ctx.localizer, lang))
                .await;
            Ok(())
        }
        other => {
            warn!(chat_id = %chat_id, value = other, "Unknown settings entry");
            ctx.say(chat_id, "callback-unknown", lang).await;
            Ok(())
        }
    }
}
