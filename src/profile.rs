//! User profile record, its storage contract and the completeness check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use teloxide::types::ChatId;
use tracing::debug;

use crate::errors::StorageError;
use crate::nutrition::NutritionTargets;
use crate::storage::KeyValueStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Decode the `m`/`f` code carried by sex-selection buttons
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Gender::Male),
            "f" | "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[serde(rename = "низкий")]
    Low,
    #[serde(rename = "средний")]
    Medium,
    #[serde(rename = "высокий")]
    High,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [ActivityLevel::Low, ActivityLevel::Medium, ActivityLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Low => "низкий",
            ActivityLevel::Medium => "средний",
            ActivityLevel::High => "высокий",
        }
    }

    /// Multiplier applied to the basal metabolic rate
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Medium => 1.55,
            ActivityLevel::High => 1.725,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ActivityLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "похудение")]
    LoseWeight,
    #[serde(rename = "поддержание")]
    Maintain,
    #[serde(rename = "набор")]
    GainMass,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::LoseWeight, Goal::Maintain, Goal::GainMass];

    pub fn as_str(self) -> &'static str {
        match self {
            Goal::LoseWeight => "похудение",
            Goal::Maintain => "поддержание",
            Goal::GainMass => "набор",
        }
    }

    /// Calorie adjustment relative to maintenance
    pub fn factor(self) -> f64 {
        match self {
            Goal::LoseWeight => 0.85,
            Goal::Maintain => 1.0,
            Goal::GainMass => 1.15,
        }
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Goal::ALL
            .into_iter()
            .find(|goal| goal.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable per-chat profile
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub calories: Option<u32>,
    pub proteins: Option<u32>,
    pub fats: Option<u32>,
    pub carbs: Option<u32>,
    pub notify_time: Option<String>,
    pub preferences: Option<String>,
}

impl Profile {
    pub fn nutrition(&self) -> Option<NutritionTargets> {
        Some(NutritionTargets {
            calories: self.calories?,
            proteins: self.proteins?,
            fats: self.fats?,
            carbs: self.carbs?,
        })
    }

    pub fn apply(&mut self, field: ProfileField) {
        match field {
            ProfileField::Name(v) => self.name = Some(v),
            ProfileField::Weight(v) => self.weight = Some(v),
            ProfileField::Height(v) => self.height = Some(v),
            ProfileField::Age(v) => self.age = Some(v),
            ProfileField::Gender(v) => self.gender = Some(v),
            ProfileField::ActivityLevel(v) => self.activity_level = Some(v),
            ProfileField::Goal(v) => self.goal = Some(v),
            ProfileField::Nutrition(t) => {
                self.calories = Some(t.calories);
                self.proteins = Some(t.proteins);
                self.fats = Some(t.fats);
                self.carbs = Some(t.carbs);
            }
            ProfileField::NotifyTime(v) => self.notify_time = Some(v),
            ProfileField::Preferences(v) => self.preferences = Some(v),
        }
    }
}

/// One typed key/value pair written to a profile
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileField {
    Name(String),
    Weight(f64),
    Height(f64),
    Age(f64),
    Gender(Gender),
    ActivityLevel(ActivityLevel),
    Goal(Goal),
    Nutrition(NutritionTargets),
    NotifyTime(String),
    Preferences(String),
}

/// True iff every field needed for the nutrition formula is present.
///
/// Weight, height and age must also be positive, and a name is not required.
pub fn is_profile_complete(profile: &Profile) -> bool {
    let positive = |v: Option<f64>| v.is_some_and(|v| v.is_finite() && v > 0.0);

    positive(profile.weight)
        && positive(profile.height)
        && positive(profile.age)
        && profile.gender.is_some()
        && profile.activity_level.is_some()
        && profile.goal.is_some()
}

/// Storage contract for durable profiles
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// The stored profile, or an empty one for a new chat
    async fn get_profile(&self, chat_id: ChatId) -> Result<Profile, StorageError>;

    /// Write one field and return the full updated record
    async fn save_profile_field(
        &self,
        chat_id: ChatId,
        field: ProfileField,
    ) -> Result<Profile, StorageError> {
        self.save_profile_fields(chat_id, vec![field]).await
    }

    /// Write several fields in a single read-modify-write
    async fn save_profile_fields(
        &self,
        chat_id: ChatId,
        fields: Vec<ProfileField>,
    ) -> Result<Profile, StorageError>;

    /// Drop the profile entirely
    async fn reset_profile(&self, chat_id: ChatId) -> Result<(), StorageError>;
}

/// Profiles stored as one JSON record per chat in the key-value store
#[derive(Clone)]
pub struct KvProfileStore {
    store: Arc<dyn KeyValueStore>,
}

impl KvProfileStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(chat_id: ChatId) -> String {
        format!("profile:{}", chat_id.0)
    }
}

#[async_trait]
impl ProfileRepository for KvProfileStore {
    async fn get_profile(&self, chat_id: ChatId) -> Result<Profile, StorageError> {
        match self.store.get(&Self::key(chat_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Profile::default()),
        }
    }

    async fn save_profile_fields(
        &self,
        chat_id: ChatId,
        fields: Vec<ProfileField>,
    ) -> Result<Profile, StorageError> {
        let mut profile = self.get_profile(chat_id).await?;
        let count = fields.len();
        for field in fields {
            profile.apply(field);
        }

        let raw = serde_json::to_string(&profile)?;
        self.store.put(&Self::key(chat_id), &raw).await?;
        debug!(chat_id = %chat_id, fields = count, "Profile updated");

        Ok(profile)
    }

    async fn reset_profile(&self, chat_id: ChatId) -> Result<(), StorageError> {
        self.store.delete(&Self::key(chat_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn complete_profile() -> Profile {
        Profile {
            weight: Some(70.0),
            height: Some(175.0),
            age: Some(30.0),
            gender: Some(Gender::Male),
            activity_level: Some(ActivityLevel::Medium),
            goal: Some(Goal::Maintain),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_profile() {
        assert!(is_profile_complete(&complete_profile()));
        assert!(!is_profile_complete(&Profile::default()));
    }

    #[test]
    fn test_removing_any_required_field_breaks_completeness() {
        let removals: Vec<fn(&mut Profile)> = vec![
            |p: &mut Profile| p.weight = None,
            |p: &mut Profile| p.height = None,
            |p: &mut Profile| p.age = None,
            |p: &mut Profile| p.gender = None,
            |p: &mut Profile| p.activity_level = None,
            |p: &mut Profile| p.goal = None,
        ];

        for remove in removals {
            let mut profile = complete_profile();
            remove(&mut profile);
            assert!(!is_profile_complete(&profile));
        }
    }

    #[test]
    fn test_zero_measurement_is_not_complete() {
        let mut profile = complete_profile();
        profile.weight = Some(0.0);
        assert!(!is_profile_complete(&profile));
    }

    #[test]
    fn test_enum_codes() {
        assert_eq!(Gender::from_code("m"), Some(Gender::Male));
        assert_eq!(Gender::from_code("F"), Some(Gender::Female));
        assert_eq!(Gender::from_code("x"), None);
        assert_eq!("Средний".parse::<ActivityLevel>(), Ok(ActivityLevel::Medium));
        assert_eq!("набор".parse::<Goal>(), Ok(Goal::GainMass));
        assert!("бег".parse::<Goal>().is_err());
    }

    #[test]
    fn test_profile_json_uses_legacy_keys() {
        let json = serde_json::to_value(complete_profile()).unwrap();
        assert_eq!(json["activityLevel"], "средний");
        assert_eq!(json["gender"], "male");
        assert_eq!(json["goal"], "поддержание");
    }

    #[tokio::test]
    async fn test_kv_profile_store_batch_write() -> Result<(), StorageError> {
        let store = KvProfileStore::new(Arc::new(InMemoryStore::new()));
        let chat = ChatId(7);

        let profile = store
            .save_profile_field(chat, ProfileField::Name("Анна".to_string()))
            .await?;
        assert_eq!(profile.name.as_deref(), Some("Анна"));

        let profile = store
            .save_profile_fields(chat, vec![ProfileField::Weight(60.0), ProfileField::Height(165.0)])
            .await?;
        assert_eq!(profile.name.as_deref(), Some("Анна"));
        assert_eq!(profile.weight, Some(60.0));
        assert_eq!(store.get_profile(chat).await?, profile);

        store.reset_profile(chat).await?;
        assert_eq!(store.get_profile(chat).await?, Profile::default());
        Ok(())
    }
}
