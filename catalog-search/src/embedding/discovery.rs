//! Model cache discovery utilities
//!
//! Finds where encoder weights live (or should be downloaded to) across
//! different deployment scenarios.

use std::path::{Path, PathBuf};

/// Environment variable overriding the model cache directory
pub const MODEL_CACHE_ENV: &str = "CATALOG_SEARCH_MODEL_CACHE";

/// Find the model cache directory with priority:
/// 1. CATALOG_SEARCH_MODEL_CACHE environment variable
/// 2. Bundled location (`models/` under the deployment root)
/// 3. User cache directory (~/.cache/catalog-search/models)
/// 4. `models/` relative to the working directory
///
/// Unlike the bundled and user locations, the environment override is
/// honoured even when the directory does not exist yet; the encoder
/// downloads its weights there on first use.
pub fn find_model_cache_dir(deployment_root: Option<&Path>) -> PathBuf {
    // Priority 1: explicit override
    if let Ok(cache_path) = std::env::var(MODEL_CACHE_ENV) {
        let path = PathBuf::from(&cache_path);
        if !path.exists() {
            log::warn!(
                "{} set but directory does not exist yet: {}",
                MODEL_CACHE_ENV,
                cache_path
            );
        } else {
            log::info!("Using {}: {}", MODEL_CACHE_ENV, path.display());
        }
        return path;
    }

    // Priority 2: bundled with the deployment
    if let Some(root) = deployment_root {
        let bundled = root.join("models");
        if bundled.is_dir() {
            log::info!("Using bundled model cache: {}", bundled.display());
            return bundled;
        }
    }

    // Priority 3: user cache directory
    if let Some(user_path) = user_cache_dir() {
        log::info!("Using user model cache: {}", user_path.display());
        return user_path;
    }

    PathBuf::from("models")
}

fn user_cache_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join("catalog-search")
            .join("models"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_dir_preferred_over_user_cache() {
        if std::env::var_os(MODEL_CACHE_ENV).is_some() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("models")).unwrap();

        let found = find_model_cache_dir(Some(root.path()));
        assert_eq!(found, root.path().join("models"));
    }

    #[test]
    fn test_missing_bundled_dir_falls_through() {
        if std::env::var_os(MODEL_CACHE_ENV).is_some() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let found = find_model_cache_dir(Some(root.path()));
        assert_ne!(found, root.path().join("models"));
    }
}
