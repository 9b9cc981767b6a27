use crate::error::Result;
use crate::quizzes::api;
use crate::traits::QuizzesApi;
use async_trait::async_trait;
use cinemarec_models::{NewQuizResult, Quiz, QuizDraft, QuizResult};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct QuizzesClient {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

impl QuizzesClient {
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
impl QuizzesApi for QuizzesClient {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        api::list_quizzes(&self.client, &self.base_url, self.token.as_deref()).await
    }

    async fn create_quiz(&self, email: &str, draft: &QuizDraft) -> Result<Quiz> {
        let quiz = api::create_quiz(&self.client, &self.base_url, self.token.as_deref(), email, draft).await?;
        info!("Created quiz {} '{}'", quiz.id, quiz.title);
        Ok(quiz)
    }

    async fn update_quiz(&self, email: &str, quiz_id: u64, draft: &QuizDraft) -> Result<Quiz> {
        let quiz = api::update_quiz(&self.client, &self.base_url, self.token.as_deref(), email, quiz_id, draft).await?;
        info!("Updated quiz {}", quiz_id);
        Ok(quiz)
    }

    async fn submit_result(&self, email: &str, result: &NewQuizResult) -> Result<()> {
        api::submit_result(&self.client, &self.base_url, self.token.as_deref(), email, result).await
    }

    async fn results(&self, email: &str) -> Result<Vec<QuizResult>> {
        api::get_results(&self.client, &self.base_url, self.token.as_deref(), email).await
    }
}
