use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::recipe::Recipe;

/// Durable home of the recipe list
pub trait RecipeStore {
    /// Never fails: a missing or unreadable file yields an empty list.
    fn load(&self) -> Vec<Recipe>;
    fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileRecipeStore {
    path: PathBuf,
}

impl FileRecipeStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::recipes_path().unwrap_or_else(|| PathBuf::from("sizzle_recipes.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileRecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeStore for FileRecipeStore {
    fn load(&self) -> Vec<Recipe> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read recipes");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Recipe>>(&bytes) {
            Ok(recipes) => {
                debug!(path = %self.path.display(), count = recipes.len(), "loaded recipes");
                recipes
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable recipe file");
                Vec::new()
            }
        }
    }

    fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(recipes)?;
        fs::write(&self.path, data).map_err(io_err)?;
        debug!(path = %self.path.display(), count = recipes.len(), "saved recipes");
        Ok(())
    }
}

/// Keeps recipes in memory; for tests and throwaway books
#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    saved: std::cell::RefCell<Vec<Recipe>>,
}

impl MemoryRecipeStore {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self {
            saved: std::cell::RefCell::new(recipes),
        }
    }

    pub fn snapshot(&self) -> Vec<Recipe> {
        self.saved.borrow().clone()
    }
}

impl RecipeStore for MemoryRecipeStore {
    fn load(&self) -> Vec<Recipe> {
        self.snapshot()
    }

    fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        *self.saved.borrow_mut() = recipes.to_vec();
        Ok(())
    }
}

/// Memory store whose saves can be made to fail
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryRecipeStore,
    pub failing: std::cell::Cell<bool>,
}

#[cfg(test)]
impl RecipeStore for FlakyStore {
    fn load(&self) -> Vec<Recipe> {
        self.inner.load()
    }

    fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        if self.failing.get() {
            return Err(StoreError::Io {
                path: PathBuf::from("/read-only/recipes.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.inner.save(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Difficulty, RecipeStep};
    use tempfile::tempdir;

    fn toast() -> Recipe {
        Recipe::new("Toast", Difficulty::Easy, vec![RecipeStep::new("toast bread", 2)])
    }

    #[test]
    fn roundtrip_recipes() {
        let dir = tempdir().unwrap();
        let store = FileRecipeStore::with_path(dir.path().join("nested").join("recipes.json"));
        let recipes = vec![toast(), toast().with_cuisine("British")];

        store.save(&recipes).unwrap();
        assert_eq!(store.load(), recipes);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = FileRecipeStore::with_path(dir.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(FileRecipeStore::with_path(&path).load().is_empty());

        fs::write(&path, b"{\"recipes\": []}").unwrap();
        assert!(FileRecipeStore::with_path(&path).load().is_empty());
    }

    #[test]
    fn save_into_unwritable_location_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let store = FileRecipeStore::with_path(blocker.join("recipes.json"));

        let err = store.save(&[toast()]).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn memory_store_keeps_last_save() {
        let store = MemoryRecipeStore::default();
        assert!(store.load().is_empty());
        store.save(&[toast()]).unwrap();
        assert_eq!(store.load().len(), 1);
    }
}
