//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::commands::Command;
use crate::localization::Localizer;
use crate::meal_plan::{Menu, ShoppingList};
use crate::profile::{ActivityLevel, Gender, Goal};

use super::callback_handler::{
    ACTION_AI, ACTION_CANCEL, ACTION_CONFIRM, ACTION_DIALOG, ACTION_SETTINGS, ACTION_SET_ACTIVITY,
    ACTION_SET_GOAL, ACTION_SET_SEX, ACTION_TOGGLE_ITEM,
};
use super::messenger::Keyboard;

/// Build an `action:value` callback payload
pub fn payload(action: &str, value: &str) -> String {
    format!("{action}:{value}")
}

fn button(localizer: &Localizer, key: &str, action: &str, value: &str, lang: Option<&str>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(localizer.t(key, lang), payload(action, value))
}

/// Persistent reply keyboard with the command vocabulary
pub fn main_menu_keyboard() -> Keyboard {
    let row = |commands: &[Command]| {
        commands
            .iter()
            .map(|c| KeyboardButton::new(c.label()))
            .collect::<Vec<_>>()
    };

    let markup = KeyboardMarkup::new(vec![
        row(&[Command::ShowMenu, Command::ShoppingList]),
        row(&[Command::CookingList, Command::SubstituteProduct]),
        row(&[Command::Settings]),
    ])
    .resize_keyboard();

    Keyboard::Reply(markup)
}

pub fn sex_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(localizer, "button-male", ACTION_SET_SEX, Gender::Male.code(), lang),
            button(localizer, "button-female", ACTION_SET_SEX, Gender::Female.code(), lang),
        ],
        vec![button(localizer, "button-cancel", ACTION_DIALOG, "cancel", lang)],
    ])
}

pub fn activity_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    let label = |level: ActivityLevel| match level {
        ActivityLevel::Low => "button-activity-low",
        ActivityLevel::Medium => "button-activity-medium",
        ActivityLevel::High => "button-activity-high",
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = ActivityLevel::ALL
        .into_iter()
        .map(|level| vec![button(localizer, label(level), ACTION_SET_ACTIVITY, level.as_str(), lang)])
        .collect();
    rows.push(vec![button(localizer, "button-cancel", ACTION_DIALOG, "cancel", lang)]);

    InlineKeyboardMarkup::new(rows)
}

pub fn goal_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    let label = |goal: Goal| match goal {
        Goal::LoseWeight => "button-goal-lose",
        Goal::Maintain => "button-goal-maintain",
        Goal::GainMass => "button-goal-gain",
    };

    InlineKeyboardMarkup::new(
        Goal::ALL
            .into_iter()
            .map(|goal| vec![button(localizer, label(goal), ACTION_SET_GOAL, goal.as_str(), lang)])
            .collect::<Vec<_>>(),
    )
}

pub fn settings_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(localizer, "button-weight", ACTION_SETTINGS, "weight", lang),
            button(localizer, "button-height", ACTION_SETTINGS, "height", lang),
            button(localizer, "button-age", ACTION_SETTINGS, "age", lang),
        ],
        vec![
            button(localizer, "button-activity", ACTION_SETTINGS, "activity", lang),
            button(localizer, "button-goal", ACTION_SETTINGS, "goal", lang),
        ],
        vec![button(localizer, "button-notify-time", ACTION_SETTINGS, "notify_time", lang)],
        vec![
            button(localizer, "button-intro", ACTION_AI, "intro", lang),
            button(localizer, "button-ask-ai", ACTION_AI, "ask", lang),
        ],
        vec![button(localizer, "button-reset", ACTION_SETTINGS, "reset", lang)],
    ])
}

pub fn reset_confirmation_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button(localizer, "button-yes", ACTION_CONFIRM, "reset", lang),
        button(localizer, "button-no", ACTION_CANCEL, "reset", lang),
    ]])
}

pub fn cancel_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        localizer,
        "button-cancel",
        ACTION_DIALOG,
        "cancel",
        lang,
    )]])
}

/// Buttons offered after onboarding when the assistant is available
pub fn assistant_keyboard(localizer: &Localizer, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button(localizer, "button-intro", ACTION_AI, "intro", lang),
        button(localizer, "button-ask-ai", ACTION_AI, "ask", lang),
    ]])
}

/// One toggle button per shopping-list item
pub fn shopping_list_keyboard(list: &ShoppingList) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        list.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mark = if item.bought { "✅" } else { "⬜" };
                vec![InlineKeyboardButton::callback(
                    format!("{mark} {}", item.name),
                    payload(ACTION_TOGGLE_ITEM, &i.to_string()),
                )]
            })
            .collect::<Vec<_>>(),
    )
}

/// Format the menu as one line per meal
pub fn format_menu(menu: &Menu, localizer: &Localizer, lang: Option<&str>) -> String {
    let mut result = format!("🍽 {}\n\n", localizer.t("menu-title", lang));

    for item in &menu.items {
        match item.calories {
            Some(kcal) => result.push_str(&format!("• {}: {} ({kcal} kcal)\n", item.meal, item.dish)),
            None => result.push_str(&format!("• {}: {}\n", item.meal, item.dish)),
        }
    }

    let total = menu.total_calories();
    if total > 0 {
        result.push_str(&format!("\nΣ {total} kcal"));
    }

    result.trim_end().to_string()
}

/// Format the cooking list as a numbered list
pub fn format_cooking_list(dishes: &[String], localizer: &Localizer, lang: Option<&str>) -> String {
    let mut result = format!("👩‍🍳 {}\n\n", localizer.t("cooking-title", lang));
    for (i, dish) in dishes.iter().enumerate() {
        result.push_str(&format!("{}. {}\n", i + 1, dish));
    }
    result.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_plan::MenuItem;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_selection_keyboards_payloads() {
        let localizer = Localizer::new("ru").unwrap();

        assert_eq!(
            callback_data(&sex_keyboard(&localizer, None)),
            vec!["set_sex:m", "set_sex:f", "dialog:cancel"]
        );
        assert_eq!(
            callback_data(&activity_keyboard(&localizer, None)),
            vec![
                "set_activity:низкий",
                "set_activity:средний",
                "set_activity:высокий",
                "dialog:cancel"
            ]
        );
        assert_eq!(
            callback_data(&goal_keyboard(&localizer, None)),
            vec!["set_goal:похудение", "set_goal:поддержание", "set_goal:набор"]
        );
    }

    #[test]
    fn test_payloads_fit_telegram_limit() {
        let localizer = Localizer::new("ru").unwrap();
        let all = [
            callback_data(&sex_keyboard(&localizer, None)),
            callback_data(&activity_keyboard(&localizer, None)),
            callback_data(&goal_keyboard(&localizer, None)),
            callback_data(&settings_keyboard(&localizer, None)),
            callback_data(&reset_confirmation_keyboard(&localizer, None)),
        ];
        for data in all.iter().flatten() {
            assert!(data.len() <= 64, "{data} exceeds 64 bytes");
        }
    }

    #[test]
    fn test_shopping_list_keyboard_marks_bought_items() {
        let mut list = ShoppingList::from_names(["яйца", "хлеб"]);
        list.items[1].bought = true;

        let markup = shopping_list_keyboard(&list);
        assert_eq!(markup.inline_keyboard[0][0].text, "⬜ яйца");
        assert_eq!(markup.inline_keyboard[1][0].text, "✅ хлеб");
        assert_eq!(callback_data(&markup), vec!["toggle_item:0", "toggle_item:1"]);
    }

    #[test]
    fn test_format_menu() {
        let localizer = Localizer::new("ru").unwrap();
        let menu = Menu {
            items: vec![MenuItem {
                meal: "Завтрак".to_string(),
                dish: "Сырники".to_string(),
                calories: Some(420),
            }],
        };
        let text = format_menu(&menu, &localizer, None);
        assert!(text.contains("Ваше меню"));
        assert!(text.contains("• Завтрак: Сырники (420 kcal)"));
        assert!(text.ends_with("Σ 420 kcal"));
    }
}
