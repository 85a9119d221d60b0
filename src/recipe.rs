use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::SettingsError;

/// Identifier of an authored recipe, e.g. `sample-1` or `recipe-3fa2c01b`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    /// Fresh random id for a newly authored recipe
    pub fn generate() -> Self {
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("recipe-{suffix:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecipeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Weight used by the complexity score
    pub fn base(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

/// Whether a step runs the appliance or is hands-on work
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Cooking,
    #[default]
    Instruction,
}

pub const TEMPERATURE_RANGE: RangeInclusive<u16> = 40..=200;
pub const SPEED_RANGE: RangeInclusive<u8> = 1..=5;

/// Appliance settings for a cooking step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookSettings {
    /// Degrees Celsius
    pub temperature: u16,
    pub speed: u8,
}

impl CookSettings {
    pub fn new(temperature: u16, speed: u8) -> Result<Self, SettingsError> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(SettingsError::Temperature(temperature));
        }
        if !SPEED_RANGE.contains(&speed) {
            return Err(SettingsError::Speed(speed));
        }
        Ok(Self { temperature, speed })
    }
}

impl fmt::Display for CookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C, speed {}", self.temperature, self.speed)
    }
}

/// Cooking steps carry settings, instruction steps never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: StepKind,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_settings: Option<CookSettings>,
}

impl RecipeStep {
    /// Hands-on step without appliance settings
    pub fn new(description: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            description: description.into(),
            kind: StepKind::Instruction,
            duration_minutes,
            cooking_settings: None,
        }
    }

    pub fn cooking(
        description: impl Into<String>,
        duration_minutes: u32,
        settings: CookSettings,
    ) -> Self {
        Self {
            description: description.into(),
            kind: StepKind::Cooking,
            duration_minutes,
            cooking_settings: Some(settings),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub difficulty: Difficulty,
    pub steps: Vec<RecipeStep>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(title: impl Into<String>, difficulty: Difficulty, steps: Vec<RecipeStep>) -> Self {
        let now = Utc::now();
        Self {
            id: RecipeId::generate(),
            title: title.into(),
            cuisine: None,
            difficulty,
            steps,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    /// Step durations in minutes, in cooking order
    pub fn step_durations(&self) -> Vec<u32> {
        self.steps.iter().map(|s| s.duration_minutes).collect()
    }

    pub fn total_minutes(&self) -> u32 {
        self.steps.iter().map(|s| s.duration_minutes).sum()
    }

    pub fn complexity_score(&self) -> u32 {
        self.difficulty.base() * self.steps.len() as u32
    }
}
