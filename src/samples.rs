use include_dir::{include_dir, Dir};
use tracing::warn;

use crate::recipe::Recipe;

static SAMPLES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets/samples");

/// Recipes bundled with the binary, in file-name order
pub fn sample_recipes() -> Vec<Recipe> {
    let mut files: Vec<_> = SAMPLES_DIR.files().collect();
    files.sort_by(|a, b| a.path().cmp(b.path()));

    files
        .into_iter()
        .filter_map(|file| {
            let text = file.contents_utf8()?;
            match serde_json::from_str::<Recipe>(text) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(file = %file.path().display(), error = %e, "skipping bad sample recipe");
                    None
                }
            }
        })
        .collect()
}
