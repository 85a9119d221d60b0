use chrono::Utc;
use clap::ValueEnum;
use itertools::Itertools;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::recipe::{Difficulty, Recipe, RecipeId};
use crate::samples::sample_recipes;
use crate::store::RecipeStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Quickest first
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Empty means any difficulty
    pub difficulties: Vec<Difficulty>,
    pub favorites_only: bool,
    /// Case-insensitive match on title or cuisine
    pub search: Option<String>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if !self.difficulties.is_empty() && !self.difficulties.contains(&recipe.difficulty) {
            return false;
        }
        if self.favorites_only && !recipe.is_favorite {
            return false;
        }
        match &self.search {
            Some(needle) if !needle.trim().is_empty() => {
                let needle = needle.trim().to_lowercase();
                recipe.title.to_lowercase().contains(&needle)
                    || recipe
                        .cuisine
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// The authored recipes, written through to a [`RecipeStore`] on every change.
#[derive(Debug)]
pub struct RecipeBook<S: RecipeStore> {
    store: S,
    recipes: Vec<Recipe>,
}

impl<S: RecipeStore> RecipeBook<S> {
    pub fn open(store: S) -> Self {
        let recipes = store.load();
        Self { store, recipes }
    }

    /// Opens the book, filling an empty one with the bundled samples.
    pub fn open_seeded(store: S, seed: bool) -> Result<Self, StoreError> {
        let mut book = Self::open(store);
        if seed && book.recipes.is_empty() {
            book.commit(sample_recipes())?;
            info!(count = book.recipes.len(), "seeded sample recipes");
        }
        Ok(book)
    }

    /// Saves `next` and adopts it only if the save worked, so a failed write
    /// leaves the book as it was.
    fn commit(&mut self, next: Vec<Recipe>) -> Result<(), StoreError> {
        self.store.save(&next)?;
        self.recipes = next;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.iter().find(|r| &r.id == id)
    }

    pub fn add(&mut self, recipe: Recipe) -> Result<&Recipe, StoreError> {
        debug!(recipe = %recipe.id, title = %recipe.title, "adding recipe");
        let mut next = self.recipes.clone();
        next.push(recipe);
        self.commit(next)?;
        Ok(&self.recipes[self.recipes.len() - 1])
    }

    /// Replaces the recipe with the same id. Returns false if there is none.
    pub fn update(&mut self, mut recipe: Recipe) -> Result<bool, StoreError> {
        let Some(idx) = self.position(&recipe.id) else {
            return Ok(false);
        };
        recipe.created_at = self.recipes[idx].created_at;
        recipe.updated_at = Utc::now();
        debug!(recipe = %recipe.id, "updating recipe");

        let mut next = self.recipes.clone();
        next[idx] = recipe;
        self.commit(next)?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &RecipeId) -> Result<bool, StoreError> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.recipes.clone();
        next.remove(idx);
        self.commit(next)?;
        debug!(recipe = %id, "deleted recipe");
        Ok(true)
    }

    /// Flips the favorite flag, returning the new value.
    pub fn toggle_favorite(&mut self, id: &RecipeId) -> Result<Option<bool>, StoreError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        let mut next = self.recipes.clone();
        let recipe = &mut next[idx];
        recipe.is_favorite = !recipe.is_favorite;
        recipe.updated_at = Utc::now();
        let favorite = recipe.is_favorite;

        self.commit(next)?;
        Ok(Some(favorite))
    }

    fn position(&self, id: &RecipeId) -> Option<usize> {
        self.recipes.iter().position(|r| &r.id == id)
    }

    /// Matching recipes ordered by total cooking time.
    pub fn query(&self, filter: &RecipeFilter, order: SortOrder) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|r| filter.matches(r))
            .sorted_by(|a, b| {
                let cmp = a.total_minutes().cmp(&b.total_minutes());
                match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeStep;
    use crate::store::{FlakyStore, MemoryRecipeStore};

    fn recipe(title: &str, difficulty: Difficulty, minutes: &[u32]) -> Recipe {
        Recipe::new(
            title,
            difficulty,
            minutes
                .iter()
                .enumerate()
                .map(|(i, m)| RecipeStep::new(format!("step {i}"), *m))
                .collect(),
        )
    }

    fn seeded() -> RecipeBook<MemoryRecipeStore> {
        RecipeBook::open_seeded(MemoryRecipeStore::default(), true).unwrap()
    }

    #[test]
    fn test_open_seeded_fills_empty_store() {
        let book = seeded();
        assert_eq!(book.all().len(), 3);
        assert_eq!(book.store().snapshot().len(), 3);
    }

    #[test]
    fn test_open_seeded_leaves_existing_recipes() {
        let store = MemoryRecipeStore::new(vec![recipe("Toast", Difficulty::Easy, &[2])]);
        let book = RecipeBook::open_seeded(store, true).unwrap();
        assert_eq!(book.all().len(), 1);
        assert_eq!(book.all()[0].title, "Toast");
    }

    #[test]
    fn test_open_without_seed_stays_empty() {
        let book = RecipeBook::open_seeded(MemoryRecipeStore::default(), false).unwrap();
        assert!(book.all().is_empty());
    }

    #[test]
    fn test_add_and_delete_persist() {
        let mut book = seeded();
        let id = book.add(recipe("Toast", Difficulty::Easy, &[2])).unwrap().id.clone();
        assert_eq!(book.store().snapshot().len(), 4);
        assert!(book.get(&id).is_some());

        assert!(book.delete(&id).unwrap());
        assert!(!book.delete(&id).unwrap());
        assert_eq!(book.store().snapshot().len(), 3);
    }

    #[test]
    fn test_update_replaces_and_keeps_created_at() {
        let mut book = seeded();
        let original = book.get(&RecipeId::from("sample-1")).unwrap().clone();

        let mut edited = original.clone();
        edited.title = "Weeknight Carbonara".to_string();
        edited.created_at = Utc::now() + chrono::Duration::days(1);
        assert!(book.update(edited).unwrap());

        let stored = book.get(&original.id).unwrap();
        assert_eq!(stored.title, "Weeknight Carbonara");
        assert_eq!(stored.created_at, original.created_at);
        assert!(stored.updated_at >= original.updated_at);
    }

    #[test]
    fn test_update_unknown_recipe_is_noop() {
        let mut book = seeded();
        assert!(!book.update(recipe("Ghost", Difficulty::Hard, &[1])).unwrap());
        assert_eq!(book.all().len(), 3);
    }

    #[test]
    fn test_toggle_favorite() {
        let mut book = seeded();
        let id = RecipeId::from("sample-1");
        assert_eq!(book.toggle_favorite(&id).unwrap(), Some(true));
        assert!(book.store().snapshot()[0].is_favorite);
        assert_eq!(book.toggle_favorite(&id).unwrap(), Some(false));
        assert_eq!(book.toggle_favorite(&RecipeId::from("nope")).unwrap(), None);
    }

    #[test]
    fn test_query_sorts_by_total_time() {
        let book = seeded();
        let asc: Vec<_> = book
            .query(&RecipeFilter::default(), SortOrder::Asc)
            .iter()
            .map(|r| r.total_minutes())
            .collect();
        assert_eq!(asc, vec![23, 34, 55]);

        let desc: Vec<_> = book
            .query(&RecipeFilter::default(), SortOrder::Desc)
            .iter()
            .map(|r| r.total_minutes())
            .collect();
        assert_eq!(desc, vec![55, 34, 23]);
    }

    #[test]
    fn test_query_filters() {
        let book = seeded();

        let filter = RecipeFilter {
            difficulties: vec![Difficulty::Easy, Difficulty::Hard],
            ..Default::default()
        };
        assert_eq!(book.query(&filter, SortOrder::Asc).len(), 2);

        let favorites = RecipeFilter {
            favorites_only: true,
            ..Default::default()
        };
        let found = book.query(&favorites, SortOrder::Asc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Simple Chocolate Cake");

        let search = RecipeFilter {
            search: Some(" asian ".to_string()),
            ..Default::default()
        };
        let found = book.query(&search, SortOrder::Asc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, RecipeId::from("sample-3"));
    }

    fn flaky() -> RecipeBook<FlakyStore> {
        let book = RecipeBook::open_seeded(FlakyStore::default(), true).unwrap();
        book.store().failing.set(true);
        book
    }

    #[test]
    fn test_failed_save_leaves_book_unchanged() {
        let mut book = flaky();
        let id = RecipeId::from("sample-1");
        let before = book.all().to_vec();

        assert!(book.toggle_favorite(&id).is_err());
        assert!(!book.get(&id).unwrap().is_favorite);

        assert!(book.add(recipe("Toast", Difficulty::Easy, &[2])).is_err());
        assert!(book.delete(&id).is_err());

        let mut edited = before[0].clone();
        edited.title = "Renamed".to_string();
        assert!(book.update(edited).is_err());

        assert_eq!(book.all(), before.as_slice());
        assert_eq!(book.store().inner.snapshot(), before);
    }

    #[test]
    fn test_toggle_after_failed_save_follows_intent() {
        let mut book = flaky();
        let id = RecipeId::from("sample-1");

        assert!(book.toggle_favorite(&id).is_err());
        book.store().failing.set(false);

        assert_eq!(book.toggle_favorite(&id).unwrap(), Some(true));
        assert!(book.store().inner.snapshot()[0].is_favorite);
    }
}
