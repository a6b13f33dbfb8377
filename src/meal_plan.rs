//! Menus, shopping lists, cooking lists and the product substitution table.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;

use crate::errors::StorageError;
use crate::storage::KeyValueStore;

const SUBSTITUTIONS_KEY: &str = "substitutions";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Meal slot such as "Завтрак"
    pub meal: String,
    pub dish: String,
    #[serde(default)]
    pub calories: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the known per-dish calories; widened so generated values
    /// can never overflow the total
    pub fn total_calories(&self) -> u64 {
        self.items
            .iter()
            .filter_map(|item| item.calories)
            .map(u64::from)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    #[serde(default)]
    pub bought: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: names
                .into_iter()
                .map(|name| ShoppingItem {
                    name: name.into(),
                    bought: false,
                })
                .collect(),
        }
    }
}

/// Storage contract for per-chat meal-plan data
#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    async fn get_menu(&self, chat_id: ChatId) -> Result<Option<Menu>, StorageError>;

    async fn save_menu(&self, chat_id: ChatId, menu: &Menu) -> Result<(), StorageError>;

    async fn get_shopping_list(&self, chat_id: ChatId) -> Result<ShoppingList, StorageError>;

    async fn save_shopping_list(&self, chat_id: ChatId, list: &ShoppingList) -> Result<(), StorageError>;

    /// Flip the bought flag of one item; `None` when the index is out of range
    async fn toggle_shopping_item(
        &self,
        chat_id: ChatId,
        index: usize,
    ) -> Result<Option<ShoppingList>, StorageError>;

    async fn get_cooking_list(&self, chat_id: ChatId) -> Result<Vec<String>, StorageError>;

    async fn save_cooking_list(&self, chat_id: ChatId, dishes: &[String]) -> Result<(), StorageError>;

    /// Known alternatives for a product, matched case-insensitively
    async fn get_substitutions(&self, product: &str) -> Result<Vec<String>, StorageError>;

    async fn save_substitutions(&self, product: &str, options: &[String]) -> Result<(), StorageError>;
}

/// Meal-plan records stored as JSON documents in the key-value store
#[derive(Clone)]
pub struct KvMealPlanStore {
    store: Arc<dyn KeyValueStore>,
}

impl KvMealPlanStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.put(key, &raw).await
    }

    fn key(kind: &str, chat_id: ChatId) -> String {
        format!("{kind}:{}", chat_id.0)
    }
}

#[async_trait]
impl MealPlanRepository for KvMealPlanStore {
    async fn get_menu(&self, chat_id: ChatId) -> Result<Option<Menu>, StorageError> {
        let menu: Option<Menu> = self.read(&Self::key("menu", chat_id)).await?;
        Ok(menu.filter(|m| !m.is_empty()))
    }

    async fn save_menu(&self, chat_id: ChatId, menu: &Menu) -> Result<(), StorageError> {
        self.write(&Self::key("menu", chat_id), menu).await
    }

    async fn get_shopping_list(&self, chat_id: ChatId) -> Result<ShoppingList, StorageError> {
        Ok(self
            .read(&Self::key("shopping", chat_id))
            .await?
            .unwrap_or_default())
    }

    async fn save_shopping_list(&self, chat_id: ChatId, list: &ShoppingList) -> Result<(), StorageError> {
        self.write(&Self::key("shopping", chat_id), list).await
    }

    async fn toggle_shopping_item(
        &self,
        chat_id: ChatId,
        index: usize,
    ) -> Result<Option<ShoppingList>, StorageError> {
        let mut list = self.get_shopping_list(chat_id).await?;
        let Some(item) = list.items.get_mut(index) else {
            return Ok(None);
        };
        item.bought = !item.bought;
        self.save_shopping_list(chat_id, &list).await?;
        Ok(Some(list))
    }

    async fn get_cooking_list(&self, chat_id: ChatId) -> Result<Vec<String>, StorageError> {
        Ok(self
            .read(&Self::key("cooking", chat_id))
            .await?
            .unwrap_or_default())
    }

    async fn save_cooking_list(&self, chat_id: ChatId, dishes: &[String]) -> Result<(), StorageError> {
        self.write(&Self::key("cooking", chat_id), &dishes).await
    }

    async fn get_substitutions(&self, product: &str) -> Result<Vec<String>, StorageError> {
        let table: HashMap<String, Vec<String>> =
            self.read(SUBSTITUTIONS_KEY).await?.unwrap_or_default();
        Ok(table
            .get(&product.trim().to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn save_substitutions(&self, product: &str, options: &[String]) -> Result<(), StorageError> {
        let mut table: HashMap<String, Vec<String>> =
            self.read(SUBSTITUTIONS_KEY).await?.unwrap_or_default();
        table.insert(product.trim().to_lowercase(), options.to_vec());
        self.write(SUBSTITUTIONS_KEY, &table).await
    }
}
