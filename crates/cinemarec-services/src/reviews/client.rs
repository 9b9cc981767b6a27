use crate::error::Result;
use crate::reviews::api;
use crate::traits::ReviewsApi;
use async_trait::async_trait;
use cinemarec_models::{ImageUpload, Review, ReviewDraft};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ReviewsClient {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

impl ReviewsClient {
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
impl ReviewsApi for ReviewsClient {
    async fn list_reviews(&self) -> Result<Vec<Review>> {
        api::list_reviews(&self.client, &self.base_url, self.token.as_deref()).await
    }

    async fn create_review(&self, email: &str, draft: &ReviewDraft, images: &[ImageUpload]) -> Result<Review> {
        let review = api::create_review(&self.client, &self.base_url, self.token.as_deref(), email, draft, images).await?;
        info!("Created review {} for '{}'", review.id, review.movie_title);
        Ok(review)
    }

    async fn update_review(
        &self,
        email: &str,
        review_id: u64,
        draft: &ReviewDraft,
        images: &[ImageUpload],
        deleted_image_urls: &[String],
    ) -> Result<Review> {
        let review = api::update_review(
            &self.client,
            &self.base_url,
            self.token.as_deref(),
            email,
            review_id,
            draft,
            images,
            deleted_image_urls,
        )
        .await?;
        info!("Updated review {}", review_id);
        Ok(review)
    }

    async fn delete_review(&self, email: &str, review_id: u64) -> Result<()> {
        api::delete_review(&self.client, &self.base_url, self.token.as_deref(), email, review_id).await?;
        info!("Deleted review {}", review_id);
        Ok(())
    }
}
