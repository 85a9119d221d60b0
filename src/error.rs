use std::path::PathBuf;
use thiserror::Error;

use crate::recipe::RecipeId;

/// Reasons a cooking session cannot be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("another recipe session is already active ({active}); stop it first")]
    AnotherSessionActive { active: RecipeId },

    #[error("recipe has no steps to cook")]
    NoSteps,
}

/// Appliance settings outside what the cooker supports.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    #[error("temperature must be between 40 and 200°C, got {0}")]
    Temperature(u16),

    #[error("speed must be between 1 and 5, got {0}")]
    Speed(u8),
}

/// Failures writing the recipe file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write recipes to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode recipes")]
    Encode(#[from] serde_json::Error),
}
