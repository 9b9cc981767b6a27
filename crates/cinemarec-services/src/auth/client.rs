use crate::auth::api;
use crate::error::Result;
use crate::traits::AuthApi;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AuthClient {
    client: Arc<Client>,
    base_url: String,
}

impl AuthClient {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let token = api::login(&self.client, &self.base_url, email, password).await?;
        info!("Logged in as {}", email);
        Ok(token)
    }

    async fn register(&self, email: &str, password: &str) -> Result<String> {
        let token = api::register(&self.client, &self.base_url, email, password).await?;
        info!("Registered {}", email);
        Ok(token)
    }

    async fn google_login(&self, email: &str, name: &str) -> Result<String> {
        let token = api::google_login(&self.client, &self.base_url, email, name).await?;
        info!("Signed in with Google as {}", email);
        Ok(token)
    }
}
