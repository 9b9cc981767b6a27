use crate::adapters::parse_all;
use crate::error::{Result, ServiceError};
use crate::http::{join, send_json, with_bearer};
use crate::traits::{CatalogApi, CatalogPage};
use async_trait::async_trait;
use cinemarec_models::{CatalogMovie, Department, Genre, Person};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Catalog lookups through the user service's `/tmdb` passthrough.
///
/// The passthrough filters people by department server-side and has no single-item
/// lookups, so `movie` and `person` are unsupported. Its pages are bare lists with no
/// page count.
#[derive(Clone)]
pub struct ProxyCatalogClient {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

fn people_path(department: Department) -> &'static str {
    match department {
        Department::Acting => "actors",
        Department::Directing => "directors",
    }
}

impl ProxyCatalogClient {
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

    async fn get_list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], action: &str) -> Result<Vec<T>> {
        let url = join(&self.base_url, path);
        debug!("Catalog request {} {:?}", url, query);
        let items: Vec<Value> =
            send_json(with_bearer(self.client.get(&url), self.token.as_deref()).query(query), action).await?;
        Ok(parse_all(items))
    }
}

#[async_trait]
impl CatalogApi for ProxyCatalogClient {
    fn provider_name(&self) -> &str {
        "proxy"
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        self.get_list("/tmdb/genres", &[], "fetch genres").await
    }

    async fn popular_people(&self, department: Department, page: u32) -> Result<CatalogPage<Person>> {
        let path = format!("/tmdb/{}", people_path(department));
        let people = self.get_list(&path, &[("page", page.to_string())], "fetch people").await?;
        Ok(CatalogPage::new(people, None))
    }

    async fn popular_movies(&self, page: u32) -> Result<CatalogPage<CatalogMovie>> {
        let movies = self
            .get_list("/tmdb/movies", &[("page", page.to_string())], "fetch movies")
            .await?;
        Ok(CatalogPage::new(movies, None))
    }

    async fn search_people(&self, department: Department, query: &str) -> Result<Vec<Person>> {
        let path = format!("/tmdb/search/{}", people_path(department));
        self.get_list(&path, &[("query", query.to_string())], "search people").await
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<CatalogMovie>> {
        self.get_list("/tmdb/search/movies", &[("query", query.to_string())], "search movies")
            .await
    }

    async fn movie(&self, movie_id: u64) -> Result<CatalogMovie> {
        Err(ServiceError::Unsupported(format!(
            "The user service catalog cannot look up movie {} by id",
            movie_id
        )))
    }

    async fn person(&self, person_id: u64) -> Result<Person> {
        Err(ServiceError::Unsupported(format!(
            "The user service catalog cannot look up person {} by id",
            person_id
        )))
    }
}
