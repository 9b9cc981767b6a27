use crate::adapters::parse_all;
use crate::error::Result;
use crate::http::{join, send_json, with_bearer};
use crate::traits::{CatalogApi, CatalogPage};
use async_trait::async_trait;
use cinemarec_models::{CatalogMovie, Department, Genre, Person};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Paged {
    #[serde(default)]
    results: Vec<Value>,
    total_pages: Option<u32>,
}

/// Direct TMDB v3 access with a read-access bearer token
#[derive(Clone)]
pub struct TmdbCatalogClient {
    client: Arc<Client>,
    base_url: String,
    api_token: String,
}

impl TmdbCatalogClient {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], action: &str) -> Result<T> {
        let url = join(&self.base_url, path);
        debug!("TMDB request {} {:?}", url, query);
        let request = with_bearer(self.client.get(&url), Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&[("language", "en-US".to_string())])
            .query(query);
        send_json(request, action).await
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        action: &str,
    ) -> Result<CatalogPage<T>> {
        let page: Paged = self.get(path, query, action).await?;
        Ok(CatalogPage::new(parse_all(page.results), page.total_pages))
    }

    async fn results<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], action: &str) -> Result<Vec<T>> {
        Ok(self.page(path, query, action).await?.items)
    }
}

fn in_department(people: Vec<Person>, department: Department) -> Vec<Person> {
    people.into_iter().filter(|p| p.works_in(department)).collect()
}

#[async_trait]
impl CatalogApi for TmdbCatalogClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        let list: GenreList = self.get("/genre/movie/list", &[], "fetch genres").await?;
        Ok(list.genres)
    }

    async fn popular_people(&self, department: Department, page: u32) -> Result<CatalogPage<Person>> {
        let mut people: CatalogPage<Person> = self
            .page("/person/popular", &[("page", page.to_string())], "fetch people")
            .await?;
        people.items = in_department(people.items, department);
        Ok(people)
    }

    async fn popular_movies(&self, page: u32) -> Result<CatalogPage<CatalogMovie>> {
        self.page("/movie/popular", &[("page", page.to_string())], "fetch movies")
            .await
    }

    async fn search_people(&self, department: Department, query: &str) -> Result<Vec<Person>> {
        let people = self
            .results("/search/person", &[("query", query.to_string())], "search people")
            .await?;
        Ok(in_department(people, department))
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<CatalogMovie>> {
        self.results("/search/movie", &[("query", query.to_string())], "search movies")
            .await
    }

    async fn movie(&self, movie_id: u64) -> Result<CatalogMovie> {
        self.get(&format!("/movie/{}", movie_id), &[], "fetch movie").await
    }

    async fn person(&self, person_id: u64) -> Result<Person> {
        self.get(&format!("/person/{}", person_id), &[], "fetch person").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_keeps_total_pages() {
        let page: Paged = serde_json::from_str(r#"{"page": 1, "results": [], "total_pages": 500}"#).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, Some(500));

        let bare: Paged = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(bare.total_pages, None);
    }

    #[test]
    fn test_department_filter() {
        let people = vec![
            Person {
                id: 1,
                name: "Keanu Reeves".to_string(),
                profile_path: None,
                known_for_department: Some("Acting".to_string()),
            },
            Person {
                id: 2,
                name: "Lana Wachowski".to_string(),
                profile_path: None,
                known_for_department: Some("Directing".to_string()),
            },
        ];
        let directors = in_department(people, Department::Directing);
        assert_eq!(directors.len(), 1);
        assert_eq!(directors[0].id, 2);
    }
}
