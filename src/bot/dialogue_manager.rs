//! Dialogue Manager module for handling dialogue state transitions
//!
//! Every function here runs one step of a pending conversation: validate the
//! reply, then either re-prompt, advance the stored session, or finish the
//! dialog and clear it.

use teloxide::types::ChatId;
use tracing::{debug, info, warn};

use crate::ai::{advice_prompt, intro_prompt};
use crate::dialogue::{
    is_affirmative, is_cancel_request, parse_measurement, validate_name, validate_notify_time,
    DialogState,
};
use crate::errors::BotError;
use crate::profile::{is_profile_complete, ActivityLevel, Gender, ProfileField};
use crate::session::{Awaiting, Session, SessionDraft};
use crate::update::ChatUser;

use super::context::BotContext;
use super::messenger::Keyboard;
use super::profile_completion::trigger_nutrition_calculation;
use super::ui_builder::{
    activity_keyboard, assistant_keyboard, cancel_keyboard, goal_keyboard, main_menu_keyboard, sex_keyboard,
};

/// Begin onboarding, replacing whatever dialog was pending
pub async fn start_onboarding(
    ctx: &BotContext,
    chat_id: ChatId,
    user: Option<&ChatUser>,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let display_name = user.and_then(ChatUser::display_name);
    let greeting_name = display_name
        .clone()
        .unwrap_or_else(|| ctx.localizer.t("default-name", lang));

    ctx.sessions
        .start(
            chat_id,
            DialogState::NameConfirmation,
            SessionDraft {
                display_name,
                ..Default::default()
            },
        )
        .await?;
    info!(chat_id = %chat_id, "Onboarding started");

    let text = ctx
        .localizer
        .t_args("onboarding-welcome", &[("name", greeting_name.as_str())], lang);
    ctx.send(chat_id, &text, Some(Keyboard::Inline(cancel_keyboard(&ctx.localizer, lang))))
        .await;
    Ok(())
}

/// Handle a text reply while a dialog is pending
pub async fn handle_dialog_reply(
    ctx: &BotContext,
    session: Session,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = session.chat_id;

    let state = match &session.awaiting {
        Awaiting::Idle => return Ok(()),
        Awaiting::Unrecognized(raw) => {
            warn!(chat_id = %chat_id, state = %raw, "Unknown dialog state, resetting session");
            ctx.sessions.clear(chat_id).await?;
            ctx.say_with_menu(chat_id, "session-reset", lang).await;
            return Ok(());
        }
        Awaiting::Pending(state) => *state,
    };

    if is_cancel_request(text) {
        return cancel_dialog(ctx, chat_id, lang).await;
    }

    debug!(chat_id = %chat_id, state = %state, "Continuing dialog");

    if state.expects_callback() {
        let keyboard = match state {
            DialogState::Sex => sex_keyboard(&ctx.localizer, lang),
            _ => activity_keyboard(&ctx.localizer, lang),
        };
        ctx.say_inline(chat_id, "use-buttons", lang, keyboard).await;
        return Ok(());
    }

    match state {
        DialogState::NameConfirmation => handle_name_reply(ctx, session, text, lang).await,
        DialogState::Weight | DialogState::Height | DialogState::Age => {
            handle_numeric_reply(ctx, session, state, text, lang).await
        }
        DialogState::Sex | DialogState::Activity => Ok(()),
        DialogState::AskAi => handle_ai_question(ctx, chat_id, text, lang).await,
        DialogState::IntroResponse => handle_intro_response(ctx, chat_id, text, lang).await,
        DialogState::NotifyTime => handle_notify_time(ctx, chat_id, text, lang).await,
    }
}

/// Abandon the pending dialog and return to the main menu
pub async fn cancel_dialog(ctx: &BotContext, chat_id: ChatId, lang: Option<&str>) -> Result<(), BotError> {
    ctx.sessions.clear(chat_id).await?;
    info!(chat_id = %chat_id, "Dialog cancelled");
    ctx.say_with_menu(chat_id, "dialog-cancelled", lang).await;
    Ok(())
}

async fn handle_name_reply(
    ctx: &BotContext,
    session: Session,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = session.chat_id;

    let candidate = match (&session.data.display_name, is_affirmative(text)) {
        (Some(display_name), true) => display_name.clone(),
        _ => text.to_string(),
    };

    let name = match validate_name(&candidate) {
        Ok(name) => name,
        Err(_) => {
            ctx.say(chat_id, "onboarding-name-invalid", lang).await;
            return Ok(());
        }
    };

    ctx.profiles
        .save_profile_field(chat_id, ProfileField::Name(name.clone()))
        .await?;

    ctx.sessions
        .update(
            chat_id,
            DialogState::Weight,
            SessionDraft {
                display_name: Some(name.clone()),
                ..session.data
            },
        )
        .await?;

    let text = ctx.localizer.t_args("ask-weight", &[("name", name.as_str())], lang);
    ctx.send(chat_id, &text, None).await;
    Ok(())
}

async fn handle_numeric_reply(
    ctx: &BotContext,
    session: Session,
    state: DialogState,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = session.chat_id;

    let Some(value) = parse_measurement(state, text) else {
        let key = match state {
            DialogState::Weight => "invalid-weight",
            DialogState::Height => "invalid-height",
            _ => "invalid-age",
        };
        ctx.say(chat_id, key, lang).await;
        return Ok(());
    };

    if session.data.single_field {
        let field = match state {
            DialogState::Weight => ProfileField::Weight(value),
            DialogState::Height => ProfileField::Height(value),
            _ => ProfileField::Age(value),
        };
        return save_single_field(ctx, chat_id, field, lang).await;
    }

    let mut draft = session.data;
    let next = match state {
        DialogState::Weight => {
            draft.weight = Some(value);
            DialogState::Height
        }
        DialogState::Height => {
            draft.height = Some(value);
            DialogState::Age
        }
        _ => {
            draft.age = Some(value);
            DialogState::Sex
        }
    };

    ctx.sessions.update(chat_id, next, draft).await?;

    match next {
        DialogState::Height => ctx.say(chat_id, "ask-height", lang).await,
        DialogState::Age => ctx.say(chat_id, "ask-age", lang).await,
        _ => {
            ctx.say_inline(chat_id, "ask-sex", lang, sex_keyboard(&ctx.localizer, lang))
                .await
        }
    }
    Ok(())
}

/// Persist one field edited from settings, finish the dialog and refresh
/// the targets
async fn save_single_field(
    ctx: &BotContext,
    chat_id: ChatId,
    field: ProfileField,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let saved = ctx.profiles.save_profile_field(chat_id, field).await;
    ctx.sessions.clear(chat_id).await?;
    let profile = saved?;

    ctx.say_with_menu(chat_id, "field-updated", lang).await;
    trigger_nutrition_calculation(ctx, chat_id, &profile, lang).await?;
    Ok(())
}

/// `set_sex` callback; only valid while the sex question is pending
pub async fn handle_sex_selection(
    ctx: &BotContext,
    session: Session,
    value: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = session.chat_id;

    if session.state() != Some(DialogState::Sex) {
        debug!(chat_id = %chat_id, "Stale sex selection");
        ctx.say(chat_id, "stale-action", lang).await;
        return Ok(());
    }

    let Some(gender) = Gender::from_code(value) else {
        ctx.say(chat_id, "callback-unknown", lang).await;
        return Ok(());
    };

    let draft = SessionDraft {
        gender: Some(gender),
        ..session.data
    };
    ctx.sessions.update(chat_id, DialogState::Activity, draft).await?;

    ctx.say_inline(chat_id, "ask-activity", lang, activity_keyboard(&ctx.localizer, lang))
        .await;
    Ok(())
}

/// `set_activity` callback; the final onboarding step
pub async fn handle_activity_selection(
    ctx: &BotContext,
    session: Session,
    value: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = session.chat_id;

    if session.state() != Some(DialogState::Activity) {
        debug!(chat_id = %chat_id, "Stale activity selection");
        ctx.say(chat_id, "stale-action", lang).await;
        return Ok(());
    }

    let Ok(level) = value.parse::<ActivityLevel>() else {
        ctx.say(chat_id, "callback-unknown", lang).await;
        return Ok(());
    };

    if session.data.single_field {
        return save_single_field(ctx, chat_id, ProfileField::ActivityLevel(level), lang).await;
    }

    let draft = SessionDraft {
        activity_level: Some(level),
        ..session.data
    };

    let saved = ctx
        .profiles
        .save_profile_fields(chat_id, draft.profile_fields())
        .await;
    // The dialog ends here whether or not the batch write went through
    ctx.sessions.clear(chat_id).await?;
    let profile = saved?;
    info!(chat_id = %chat_id, "Onboarding completed");

    if is_profile_complete(&profile) {
        trigger_nutrition_calculation(ctx, chat_id, &profile, lang).await?;
        ctx.say_with_menu(chat_id, "profile-saved", lang).await;
        offer_assistant(ctx, chat_id, lang).await;
    } else {
        ctx.say_inline(chat_id, "profile-saved-choose-goal", lang, goal_keyboard(&ctx.localizer, lang))
            .await;
    }
    Ok(())
}

/// Point a freshly completed profile at the assistant, when there is one
pub async fn offer_assistant(ctx: &BotContext, chat_id: ChatId, lang: Option<&str>) {
    if ctx.ai_enabled() {
        ctx.say_inline(chat_id, "assistant-offer", lang, assistant_keyboard(&ctx.localizer, lang))
            .await;
    }
}

/// Open a dialog that edits one profile field from the settings menu
pub async fn start_field_edit(
    ctx: &BotContext,
    chat_id: ChatId,
    state: DialogState,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let draft = SessionDraft {
        single_field: true,
        ..Default::default()
    };
    ctx.sessions.start(chat_id, state, draft).await?;

    let cancel = cancel_keyboard(&ctx.localizer, lang);
    match state {
        DialogState::Weight => ctx.say_inline(chat_id, "ask-weight-edit", lang, cancel).await,
        DialogState::Height => ctx.say_inline(chat_id, "ask-height-edit", lang, cancel).await,
        DialogState::Age => ctx.say_inline(chat_id, "ask-age-edit", lang, cancel).await,
        DialogState::NotifyTime => ctx.say_inline(chat_id, "ask-notify-time", lang, cancel).await,
        DialogState::Activity => {
            ctx.say_inline(chat_id, "ask-activity", lang, activity_keyboard(&ctx.localizer, lang))
                .await
        }
        other => warn!(chat_id = %chat_id, state = %other, "State is not editable from settings"),
    }
    Ok(())
}

/// Open the free-form question or the preferences interview
pub async fn start_ai_dialog(
    ctx: &BotContext,
    chat_id: ChatId,
    state: DialogState,
    lang: Option<&str>,
) -> Result<(), BotError> {
    if state == DialogState::AskAi && !ctx.ai_enabled() {
        ctx.say_with_menu(chat_id, "ai-disabled", lang).await;
        return Ok(());
    }

    ctx.sessions.start(chat_id, state, SessionDraft::default()).await?;

    let key = if state == DialogState::AskAi {
        "ai-ask-prompt"
    } else {
        "intro-prompt"
    };
    ctx.say_inline(chat_id, key, lang, cancel_keyboard(&ctx.localizer, lang))
        .await;
    Ok(())
}

async fn handle_ai_question(
    ctx: &BotContext,
    chat_id: ChatId,
    question: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    if !ctx.ai_enabled() {
        ctx.sessions.clear(chat_id).await?;
        ctx.say_with_menu(chat_id, "ai-disabled", lang).await;
        return Ok(());
    }

    let profile = ctx.profiles.get_profile(chat_id).await?;
    match ctx.generate(chat_id, &advice_prompt(&profile, question)).await {
        Ok(answer) => {
            ctx.sessions.clear(chat_id).await?;
            ctx.send(chat_id, &answer, Some(main_menu_keyboard())).await;
        }
        Err(e) => {
            // Session stays so the user can ask again or cancel
            warn!(chat_id = %chat_id, error = %e, "AI question failed");
            ctx.say(chat_id, "ai-ask-retry", lang).await;
        }
    }
    Ok(())
}

async fn handle_intro_response(
    ctx: &BotContext,
    chat_id: ChatId,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let preferences = text.trim().to_string();
    let saved = ctx
        .profiles
        .save_profile_field(chat_id, ProfileField::Preferences(preferences.clone()))
        .await;
    ctx.sessions.clear(chat_id).await?;
    let profile = saved?;

    if !ctx.ai_enabled() {
        ctx.say_with_menu(chat_id, "preferences-saved", lang).await;
        return Ok(());
    }

    match ctx.generate(chat_id, &intro_prompt(&profile, &preferences)).await {
        Ok(welcome) => ctx.send(chat_id, &welcome, Some(main_menu_keyboard())).await,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "AI intro failed");
            ctx.say(chat_id, "preferences-saved", lang).await;
            ctx.say_with_menu(chat_id, "ai-error", lang).await;
        }
    }
    Ok(())
}

async fn handle_notify_time(
    ctx: &BotContext,
    chat_id: ChatId,
    text: &str,
    lang: Option<&str>,
) -> Result<(), BotError> {
    let time = match validate_notify_time(text) {
        Ok(time) => time,
        Err(key) => {
            ctx.say(chat_id, key, lang).await;
            return Ok(());
        }
    };

    let saved = ctx
        .profiles
        .save_profile_field(chat_id, ProfileField::NotifyTime(time.clone()))
        .await;
    ctx.sessions.clear(chat_id).await?;
    saved?;

    let text = ctx.localizer.t_args("notify-time-saved", &[("time", time.as_str())], lang);
    ctx.send(chat_id, &text, Some(main_menu_keyboard())).await;
    Ok(())
}
