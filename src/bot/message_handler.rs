//! Message Handler module for commands and free text from idle chats

use teloxide::types::ChatId;
use tracing::{debug, info, warn};

use crate::ai::{advice_prompt, menu_prompt, parse_generated_menu, substitution_prompt};
use crate::commands::Command;
use crate::errors::BotError;
use crate::meal_plan::{Menu, ShoppingList};
use crate::profile::is_profile_complete;
use crate::update::ChatUser;

use super::context::BotContext;
use super::dialogue_manager::start_onboarding;
use super::ui_builder::{
    format_cooking_list, format_menu, main_menu_keyboard, settings_keyboard, shopping_list_keyboard,
};

/// Run a recognized command
pub async fn execute_command(
    ctx: &BotContext,
    chat_id: ChatId,
    command: Command,
    user: Option<&ChatUser>,
    lang: Option<&str>,
) -> Result<(), BotError> {
    debug!(chat_id = %chat_id, ?command, "Executing command");

    match command {
        Command::Start => start_onboarding(ctx, chat_id, user, lang).await,
        Command::ShowMenu => show_menu(ctx, chat_id, lang).await,
        Command::ShoppingList => show_shopping_list(ctx, chat_id, lang).await,
        Command::Settings => {
            ctx.say_inline(chat_id, "settings-title", lang, settings_keyboard(&ctx.localizer, lang))
                .await;
            Ok(())
        }
        Command::SubstituteProduct => {
            ctx.say_with_menu(chat_id, "substitute-hint", lang).await;
            Ok(())
        }
        Command::CookingList => show_cooking_list(ctx, chat_id, lang).await,
    }
}

async fn show_menu(ctx: &BotContext, chat_id: ChatId, lang: Option<&str>) -> Result<(), BotError> {
    if let Some(menu) = ctx.meal_plans.get_menu(chat_id).await? {
        send_menu(ctx, chat_id, &menu, lang).await;
        return Ok(());
    }

    let profile = ctx.profiles.get_profile(chat_id).await?;
    if !is_profile_complete(&profile) {
        ctx.say_with_menu(chat_id, "menu-profile-incomplete", lang).await;
        return Ok(());
    }

    if !ctx.ai_enabled() {
        ctx.say_with_menu(chat_id, "menu-empty", lang).await;
        return Ok(());
    }

    ctx.say(chat_id, "menu-generating", lang).await;

    let generated = match ctx.generate(chat_id, &menu_prompt(&profile)).await {
        Ok(raw) => parse_generated_menu(&raw),
        Err(e) => Err(e),
    };

    let generated = match generated {
        Ok(generated) => generated,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Menu generation failed");
            ctx.say_with_menu(chat_id, "ai-error", lang).await;
            return Ok(());
        }
    };

    let menu = generated.to_menu();
    ctx.meal_plans.save_menu(chat_id, &menu).await?;
    ctx.meal_plans
        .save_shopping_list(chat_id, &ShoppingList::from_names(generated.shopping_list.iter().cloned()))
        .await?;
    ctx.meal_plans
        .save_cooking_list(chat_id, &generated.dishes())
        .await?;
    info!(chat_id = %chat_id, meals = menu.items.len(), "Menu generated");

    send_menu(ctx, chat_id, &menu, lang).await;
    Ok(())
}

async fn send_menu(ctx: &BotContext, chat_id: ChatId, menu: &Menu, lang: Option<&str>) {
    let text = format_menu(menu, &ctx.localizer, lang);
    ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
}

async fn show_shopping_list(ctx: &BotContext, chat_id: ChatId, lang: Option<&str>) -> Result<(), BotError> {
    let list = ctx.meal_plans.get_shopping_list(chat_id).await?;
    if list.items.is_empty() {
        ctx.say_with_menu(chat_id, "shopping-empty", lang).await;
    } else {
        ctx.say_inline(chat_id, "shopping-title", lang, shopping_list_keyboard(&list))
            .await;
    }
    Ok(())
}

async fn show_cooking_list(ctx: &BotContext, chat_id: ChatId, lang: Option<&str>) -> Result<(), BotError> {
    let dishes = ctx.meal_plans.get_cooking_list(chat_id).await?;
    if dishes.is_empty() {
        ctx.say_with_menu(chat_id, "cooking-empty", lang).await;
    } else {
        let text = format_cooking_list(&dishes, &ctx.localizer, lang);
        ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
    }
    Ok(())
}

/// `substitute <product>`: stored table first, then the AI when enabled
pub async fn handle_substitute(
    ctx: &BotContext,
    chat_id: ChatId,
    product: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let options = ctx.meal_plans.get_substitutions(product).await?;
    if !options.is_empty() {
        let listed = options
            .iter()
            .map(|o| format!("• {o}"))
            .collect::<Vec<_>>()
            .join("\n");
        let text = ctx.localizer.t_args(
            "substitute-found",
            &[("product", product), ("options", listed.as_str())],
            lang,
        );
        ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
        return Ok(());
    }

    if !ctx.ai_enabled() {
        let text = ctx
            .localizer
            .t_args("substitute-not-found", &[("product", product)], lang);
        ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
        return Ok(());
    }

    let profile = ctx.profiles.get_profile(chat_id).await?;
    match ctx.generate(chat_id, &substitution_prompt(&profile, product)).await {
        Ok(answer) => ctx.send(chat_id, &answer, Some(main_menu_keyboard())).await,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Substitution lookup failed");
            ctx.say_with_menu(chat_id, "ai-error", lang).await;
        }
    }
    Ok(())
}

/// Free text from an idle chat
pub async fn handle_free_text(
    ctx: &BotContext,
    chat_id: ChatId,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    if !ctx.ai_enabled() {
        ctx.say_with_menu(chat_id, "use-menu", lang).await;
        return Ok(());
    }

    let profile = ctx.profiles.get_profile(chat_id).await?;
    match ctx.generate(chat_id, &advice_prompt(&profile, text)).await {
        Ok(answer) => ctx.send(chat_id, &answer, Some(main_menu_keyboard())).await,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Free-text AI reply failed");
            ctx.say_with_menu(chat_id, "ai-error", lang).await;
        }
    }
    Ok(())
}
