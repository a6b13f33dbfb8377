//! Generative-text client and the prompts the bot sends to it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::errors::AiError;
use crate::meal_plan::{Menu, MenuItem};
use crate::profile::Profile;

const SYSTEM_PROMPT: &str = "Ты дружелюбный нутрициолог. Отвечай кратко и по делу, на языке пользователя.";
const TEMPERATURE: f32 = 0.4;

/// Prompt in, text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Clone, Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Clone, Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Clone, Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Clone, Debug)]
pub struct HttpTextGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config.api_key.clone().ok_or(AiError::Disabled)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "AI backend rejected the request");
            return Err(AiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(chars = content.len(), "AI response received");
        Ok(content)
    }
}

/// Structured menu the AI is asked to return
#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedMenu {
    #[serde(default)]
    pub meals: Vec<GeneratedMeal>,
    #[serde(default)]
    pub shopping_list: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedMeal {
    pub meal: String,
    pub dish: String,
    #[serde(default)]
    pub calories: Option<u32>,
}

impl GeneratedMenu {
    pub fn to_menu(&self) -> Menu {
        Menu {
            items: self
                .meals
                .iter()
                .map(|m| MenuItem {
                    meal: m.meal.clone(),
                    dish: m.dish.clone(),
                    calories: m.calories,
                })
                .collect(),
        }
    }

    pub fn dishes(&self) -> Vec<String> {
        self.meals.iter().map(|m| m.dish.clone()).collect()
    }
}

/// Decode the AI's menu answer, tolerating a fenced code block around it
pub fn parse_generated_menu(raw: &str) -> Result<GeneratedMenu, AiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(AiError::Malformed("no JSON object in response".to_string())),
    };

    let menu: GeneratedMenu =
        serde_json::from_str(json).map_err(|e| AiError::Malformed(e.to_string()))?;

    if menu.meals.is_empty() {
        return Err(AiError::Malformed("menu has no meals".to_string()));
    }
    if menu.meals.iter().any(|m| m.dish.trim().is_empty()) {
        return Err(AiError::Malformed("meal without a dish".to_string()));
    }

    Ok(menu)
}

fn profile_context(profile: &Profile) -> String {
    let mut parts = Vec::new();
    if let Some(name) = &profile.name {
        parts.push(format!("имя: {name}"));
    }
    if let Some(v) = profile.weight {
        parts.push(format!("вес: {v} кг"));
    }
    if let Some(v) = profile.height {
        parts.push(format!("рост: {v} см"));
    }
    if let Some(v) = profile.age {
        parts.push(format!("возраст: {v}"));
    }
    if let Some(v) = profile.gender {
        parts.push(format!("пол: {}", v.as_str()));
    }
    if let Some(v) = profile.activity_level {
        parts.push(format!("активность: {v}"));
    }
    if let Some(v) = profile.goal {
        parts.push(format!("цель: {v}"));
    }
    if let Some(t) = profile.nutrition() {
        parts.push(format!(
            "норма: {} ккал, Б {} г, Ж {} г, У {} г",
            t.calories, t.proteins, t.fats, t.carbs
        ));
    }
    if let Some(p) = &profile.preferences {
        parts.push(format!("предпочтения: {p}"));
    }

    if parts.is_empty() {
        "профиль не заполнен".to_string()
    } else {
        parts.join("; ")
    }
}

pub fn advice_prompt(profile: &Profile, question: &str) -> String {
    format!(
        "Профиль пользователя: {}.\nВопрос пользователя: {question}\nДай практичный совет по питанию.",
        profile_context(profile)
    )
}

pub fn intro_prompt(profile: &Profile, preferences: &str) -> String {
    format!(
        "Профиль пользователя: {}.\nПользователь рассказал о своих предпочтениях: {preferences}\n\
         Поприветствуй его и в двух-трёх предложениях объясни, как учтёшь эти предпочтения.",
        profile_context(profile)
    )
}

pub fn substitution_prompt(profile: &Profile, product: &str) -> String {
    format!(
        "Профиль пользователя: {}.\nПредложи до пяти замен для продукта «{product}» \
         с учётом цели пользователя. Ответ дай списком.",
        profile_context(profile)
    )
}

pub fn menu_prompt(profile: &Profile) -> String {
    format!(
        "Профиль пользователя: {}.\nСоставь меню на один день, укладываясь в норму калорий. \
         Ответь только JSON-объектом вида \
         {{\"meals\": [{{\"meal\": \"Завтрак\", \"dish\": \"...\", \"calories\": 400}}], \
         \"shopping_list\": [\"...\"]}} без пояснений.",
        profile_context(profile)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Gender, Goal};

    #[test]
    fn test_parse_plain_json_menu() {
        let raw = r#"{"meals":[{"meal":"Завтрак","dish":"Омлет","calories":350}],"shopping_list":["яйца"]}"#;
        let menu = parse_generated_menu(raw).unwrap();
        assert_eq!(menu.meals.len(), 1);
        assert_eq!(menu.to_menu().items[0].dish, "Омлет");
        assert_eq!(menu.shopping_list, vec!["яйца".to_string()]);
    }

    #[test]
    fn test_parse_fenced_menu() {
        let raw = "Вот меню:\n```json\n{\"meals\":[{\"meal\":\"Обед\",\"dish\":\"Борщ\"}]}\n```";
        let menu = parse_generated_menu(raw).unwrap();
        assert_eq!(menu.dishes(), vec!["Борщ".to_string()]);
        assert!(menu.shopping_list.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_menus() {
        assert!(matches!(parse_generated_menu("  "), Err(AiError::EmptyResponse)));
        assert!(matches!(parse_generated_menu("не знаю"), Err(AiError::Malformed(_))));
        assert!(matches!(parse_generated_menu("{\"meals\": []}"), Err(AiError::Malformed(_))));
        assert!(matches!(parse_generated_menu("{\"meals\": [{]}"), Err(AiError::Malformed(_))));
        assert!(matches!(
            parse_generated_menu("{\"meals\":[{\"meal\":\"Ужин\",\"dish\":\" \"}]}"),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn test_prompts_carry_profile_context() {
        let profile = Profile {
            name: Some("Анна".to_string()),
            gender: Some(Gender::Female),
            goal: Some(Goal::LoseWeight),
            ..Default::default()
        };
        let prompt = advice_prompt(&profile, "Можно ли есть бананы вечером?");
        assert!(prompt.contains("имя: Анна"));
        assert!(prompt.contains("цель: похудение"));
        assert!(prompt.contains("бананы"));

        assert!(menu_prompt(&Profile::default()).contains("профиль не заполнен"));
    }
}
