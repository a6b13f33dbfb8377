//! Daily calorie and macronutrient targets.
//!
//! Basal metabolic rate follows Mifflin–St Jeor, scaled by activity and goal.
//! Macros split the rounded calories 30/30/40 between protein, fat and
//! carbohydrates.

use serde::{Deserialize, Serialize};

use crate::profile::{Gender, Profile};

const PROTEIN_SHARE: f64 = 0.30;
const FAT_SHARE: f64 = 0.30;
const CARB_SHARE: f64 = 0.40;
const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;
const KCAL_PER_GRAM_CARB: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub calories: u32,
    pub proteins: u32,
    pub fats: u32,
    pub carbs: u32,
}

/// Compute targets from a profile.
///
/// Returns `None` when a field the formula needs is missing.
pub fn compute(profile: &Profile) -> Option<NutritionTargets> {
    let weight = profile.weight?;
    let height = profile.height?;
    let age = profile.age?;
    let gender = profile.gender?;
    let activity = profile.activity_level?;
    let goal = profile.goal?;

    let base = 10.0 * weight + 6.25 * height - 5.0 * age;
    let bmr = match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    };

    let calories = (bmr * activity.factor() * goal.factor()).round().max(0.0);
    let grams = |share: f64, kcal_per_gram: f64| (calories * share / kcal_per_gram).round() as u32;

    Some(NutritionTargets {
        calories: calories as u32,
        proteins: grams(PROTEIN_SHARE, KCAL_PER_GRAM_PROTEIN),
        fats: grams(FAT_SHARE, KCAL_PER_GRAM_FAT),
        carbs: grams(CARB_SHARE, KCAL_PER_GRAM_CARB),
    })
}
