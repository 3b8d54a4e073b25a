use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::models::Preferences;
use crate::validation::{validate_favorite_cities, validate_location};

/// Per-user preference storage.
///
/// Records live in memory and are lost on restart. Clones share the same
/// underlying map.
#[derive(Clone, Default)]
pub struct PreferenceService {
    records: Arc<RwLock<HashMap<String, Preferences>>>,
}

impl PreferenceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored preferences for `user_id`, if any.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &str) -> Option<Preferences> {
        self.records.read().await.get(user_id).cloned()
    }

    /// Stored preferences, or the defaults for a user who never saved any.
    pub async fn get_or_default(&self, user_id: &str) -> Preferences {
        self.get(user_id).await.unwrap_or_default()
    }

    /// Validate and replace the preferences of `user_id`.
    #[instrument(skip(self, preferences))]
    pub async fn put(&self, user_id: &str, preferences: Preferences) -> AppResult<Preferences> {
        if let Some(city) = &preferences.home_city {
            validate_location(city, "home_city")?;
        }
        validate_favorite_cities(&preferences.favorite_cities)?;

        self.records
            .write()
            .await
            .insert(user_id.to_string(), preferences.clone());

        debug!("Preferences stored");
        Ok(preferences)
    }

    /// Remove the preferences of `user_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing was stored for the user.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str) -> AppResult<()> {
        self.records
            .write()
            .await
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("No preferences stored for this user".to_string()))
    }

    pub async fn user_count(&self) -> usize {
        self.records.read().await.len()
    }
}
