use crate::error::Result;
use crate::statistics::api;
use crate::traits::StatisticsApi;
use async_trait::async_trait;
use cinemarec_models::{MovieDetails, MovieSummary, MovieVideo, Statistics};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct StatisticsClient {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

impl StatisticsClient {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl StatisticsApi for StatisticsClient {
    async fn statistics(&self, email: &str) -> Result<Statistics> {
        api::get_statistics(&self.client, &self.base_url, self.token.as_deref(), email).await
    }

    async fn watched_movies(&self, email: &str) -> Result<Vec<MovieSummary>> {
        api::get_watched(&self.client, &self.base_url, self.token.as_deref(), email).await
    }

    async fn mark_watched(&self, email: &str, movie_id: u64) -> Result<()> {
        api::add_watched(&self.client, &self.base_url, self.token.as_deref(), email, movie_id).await?;
        info!("Marked movie {} as watched", movie_id);
        Ok(())
    }

    async fn unmark_watched(&self, email: &str, movie_id: u64) -> Result<()> {
        api::remove_watched(&self.client, &self.base_url, self.token.as_deref(), email, movie_id).await?;
        info!("Removed movie {} from watched", movie_id);
        Ok(())
    }

    async fn browse_movies(&self, email: &str, query: &str, page: u32) -> Result<Vec<MovieSummary>> {
        api::search_movies(&self.client, &self.base_url, self.token.as_deref(), email, query, page).await
    }

    async fn movie_details(&self, email: &str, movie_id: u64) -> Result<MovieDetails> {
        api::get_movie_details(&self.client, &self.base_url, self.token.as_deref(), email, movie_id).await
    }

    async fn movie_videos(&self, email: &str, movie_id: u64) -> Result<Vec<MovieVideo>> {
        api::get_movie_videos(&self.client, &self.base_url, self.token.as_deref(), email, movie_id).await
    }

    fn poster_url(&self, movie_id: u64) -> String {
        api::poster_url(&self.base_url, movie_id)
    }
}
