//! Command classification for idle chats.
//!
//! Exact matches against the fixed vocabulary are tried first, then the
//! free-form `substitute <product>` prefix.

pub const START_COMMAND: &str = "/start";
pub const SHOW_MENU_LABEL: &str = "Показать меню";
pub const SHOPPING_LIST_LABEL: &str = "Список покупок";
pub const SETTINGS_LABEL: &str = "Настройки";
pub const SUBSTITUTE_LABEL: &str = "Замена продукта";
pub const COOKING_LIST_LABEL: &str = "Список готовки";

const SUBSTITUTE_STEMS: &[&str] = &["замена", "заменить", "substitute"];

/// Recognized menu buttons and slash commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    ShowMenu,
    ShoppingList,
    Settings,
    SubstituteProduct,
    CookingList,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::ShowMenu,
        Command::ShoppingList,
        Command::Settings,
        Command::SubstituteProduct,
        Command::CookingList,
    ];

    /// Text the user sends (or the button shows) for this command
    pub fn label(self) -> &'static str {
        match self {
            Command::Start => START_COMMAND,
            Command::ShowMenu => SHOW_MENU_LABEL,
            Command::ShoppingList => SHOPPING_LIST_LABEL,
            Command::Settings => SETTINGS_LABEL,
            Command::SubstituteProduct => SUBSTITUTE_LABEL,
            Command::CookingList => COOKING_LIST_LABEL,
        }
    }

    /// Exact, case-insensitive match on trimmed text
    pub fn parse(text: &str) -> Option<Command> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        Command::ALL
            .into_iter()
            .find(|command| command.label().to_lowercase() == normalized)
    }
}

/// How an idle chat's text should be handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    Command(Command),
    /// `substitute <product>` with the product name as typed
    Substitute(String),
    FreeText(String),
    Empty,
}

pub fn is_command(text: &str) -> bool {
    Command::parse(text).is_some()
}

pub fn classify(text: &str) -> Classified {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Classified::Empty;
    }

    if let Some(command) = Command::parse(trimmed) {
        return Classified::Command(command);
    }

    if let Some(product) = substitute_target(trimmed) {
        return Classified::Substitute(product);
    }

    Classified::FreeText(trimmed.to_string())
}

/// Product name following a substitute stem, if the text has that shape
fn substitute_target(text: &str) -> Option<String> {
    let (stem, rest) = text.split_once(char::is_whitespace)?;
    let stem = stem.to_lowercase();
    if !SUBSTITUTE_STEMS.contains(&stem.as_str()) {
        return None;
    }
    let product = rest.trim();
    (!product.is_empty()).then(|| product.to_string())
}
