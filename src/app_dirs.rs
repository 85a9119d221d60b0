use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("sizzle"))
        } else {
            ProjectDirs::from("", "", "sizzle").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn recipes_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("recipes.v1.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sizzle.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sizzle").map(|pd| pd.config_dir().join("config.json"))
    }
}
