use crate::adapters;
use crate::error::Result;
use crate::http::{join, send, send_json, with_bearer};
use cinemarec_models::{MovieDetails, MovieSummary, MovieVideo, Statistics};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub async fn get_statistics(client: &Client, base_url: &str, token: Option<&str>, email: &str) -> Result<Statistics> {
    let url = join(base_url, "/statistics");
    debug!("Fetching statistics from {}", url);
    send_json(with_bearer(client.get(&url), token).query(&[("email", email)]), "fetch statistics").await
}

pub async fn get_watched(client: &Client, base_url: &str, token: Option<&str>, email: &str) -> Result<Vec<MovieSummary>> {
    let url = join(base_url, "/statistics/watched");
    let payload: Value =
        send_json(with_bearer(client.get(&url), token).query(&[("email", email)]), "fetch watched movies").await?;
    Ok(adapters::watched_movies(payload))
}

pub async fn add_watched(client: &Client, base_url: &str, token: Option<&str>, email: &str, movie_id: u64) -> Result<()> {
    let url = join(base_url, "/statistics/watched");
    let body = serde_json::json!({ "movieId": movie_id });
    send(
        with_bearer(client.post(&url), token).query(&[("email", email)]).json(&body),
        "mark movie as watched",
    )
    .await?;
    Ok(())
}

pub async fn remove_watched(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    movie_id: u64,
) -> Result<()> {
    let url = join(base_url, &format!("/statistics/watched/{}", movie_id));
    send(
        with_bearer(client.delete(&url), token).query(&[("email", email)]),
        "remove movie from watched",
    )
    .await?;
    Ok(())
}

pub async fn search_movies(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    query: &str,
    page: u32,
) -> Result<Vec<MovieSummary>> {
    let url = join(base_url, "/statistics/movies");
    debug!("Browsing movies at {} (query '{}', page {})", url, query, page);
    let page = page.to_string();
    let payload: Value = send_json(
        with_bearer(client.get(&url), token).query(&[("email", email), ("query", query), ("page", page.as_str())]),
        "browse movies",
    )
    .await?;
    Ok(adapters::movie_summaries(payload))
}

pub async fn get_movie_details(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    movie_id: u64,
) -> Result<MovieDetails> {
    let url = join(base_url, &format!("/statistics/movies/{}", movie_id));
    send_json(with_bearer(client.get(&url), token).query(&[("email", email)]), "fetch movie details").await
}

pub async fn get_movie_videos(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    movie_id: u64,
) -> Result<Vec<MovieVideo>> {
    let url = join(base_url, &format!("/statistics/movies/{}/videos", movie_id));
    send_json(with_bearer(client.get(&url), token).query(&[("email", email)]), "fetch movie videos").await
}

pub fn poster_url(base_url: &str, movie_id: u64) -> String {
    join(base_url, &format!("/tmdb/movies/{}/poster", movie_id))
}
