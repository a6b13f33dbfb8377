//! Nutrition target calculation once a profile has every required field.

use teloxide::types::ChatId;
use tracing::info;

use crate::errors::BotError;
use crate::nutrition::{self, NutritionTargets};
use crate::profile::{is_profile_complete, Profile, ProfileField};

use super::context::BotContext;

/// Compute, persist and announce the nutrition targets.
///
/// Returns `None` without side effects when the profile is incomplete.
pub async fn trigger_nutrition_calculation(
    ctx: &BotContext,
    chat_id: ChatId,
    profile: &Profile,
    lang: Option<&str>,
) -> Result<Option<NutritionTargets>, BotError> {
    if !is_profile_complete(profile) {
        return Ok(None);
    }
    let Some(targets) = nutrition::compute(profile) else {
        return Ok(None);
    };

    ctx.profiles
        .save_profile_field(chat_id, ProfileField::Nutrition(targets))
        .await?;
    info!(chat_id = %chat_id, calories = targets.calories, "Nutrition targets updated");

    let values = [
        targets.calories.to_string(),
        targets.proteins.to_string(),
        targets.fats.to_string(),
        targets.carbs.to_string(),
    ];
    let text = ctx.localizer.t_args(
        "nutrition-targets",
        &[
            ("calories", values[0].as_str()),
            ("proteins", values[1].as_str()),
            ("fats", values[2].as_str()),
            ("carbs", values[3].as_str()),
        ],
        lang,
    );
    ctx.send(chat_id, &text, None).await;

    Ok(Some(targets))
}
