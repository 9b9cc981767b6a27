use crate::error::Result;
use crate::traits::{PreferencesApi, RecommendationsApi, StoredPreferences};
use crate::users::api;
use async_trait::async_trait;
use cinemarec_models::{MovieDetails, PreferenceProfile, Recommendation};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Client for the user service, plus the recommendation service's detail lookup
#[derive(Clone)]
pub struct UsersClient {
    client: Arc<Client>,
    users_url: String,
    recommendations_url: String,
    token: Option<String>,
}

impl UsersClient {
    pub fn new(client: Arc<Client>, users_url: impl Into<String>, recommendations_url: impl Into<String>) -> Self {
        Self {
            client,
            users_url: users_url.into(),
            recommendations_url: recommendations_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait]
impl PreferencesApi for UsersClient {
    async fn get_preferences(&self, email: &str) -> Result<Option<StoredPreferences>> {
        api::get_preferences(&self.client, &self.users_url, self.token(), email).await
    }

    async fn save_preferences(&self, email: &str, profile: &PreferenceProfile) -> Result<()> {
        api::save_preferences(&self.client, &self.users_url, self.token(), email, profile).await?;
        info!("Saved preferences for {}", email);
        Ok(())
    }
}

#[async_trait]
impl RecommendationsApi for UsersClient {
    async fn list_recommendations(&self, email: &str) -> Result<Vec<Recommendation>> {
        api::get_recommendations(&self.client, &self.users_url, self.token(), email).await
    }

    async fn mark_watched(&self, email: &str, movie_id: u64) -> Result<()> {
        api::mark_watched(&self.client, &self.users_url, self.token(), email, movie_id).await
    }

    async fn request_refresh(&self, email: &str) -> Result<()> {
        api::refresh_recommendations(&self.client, &self.users_url, self.token(), email).await
    }

    async fn recommendation_details(&self, email: &str, movie_id: u64) -> Result<MovieDetails> {
        api::get_recommendation_details(&self.client, &self.recommendations_url, self.token(), email, movie_id)
            .await
    }
}
