use crate::adapters;
use crate::error::{Result, ServiceError};
use crate::http::{encode, join, send, send_json, with_bearer};
use crate::traits::StoredPreferences;
use cinemarec_models::{MovieDetails, PreferenceProfile, Recommendation};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Fetch the stored preference profile; a 404 means none was ever saved
pub async fn get_preferences(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
) -> Result<Option<StoredPreferences>> {
    let url = join(base_url, &format!("/users/{}/preferences", encode(email)));
    debug!("Fetching preferences from {}", url);

    let payload: Value = match send_json(with_bearer(client.get(&url), token), "fetch preferences").await {
        Ok(payload) => payload,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    if payload.is_null() {
        return Ok(None);
    }

    let stored = adapters::stored_preferences(payload).map_err(|e| ServiceError::decode("fetch preferences", e))?;
    Ok(Some(stored))
}

pub async fn save_preferences(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    profile: &PreferenceProfile,
) -> Result<()> {
    let url = join(base_url, &format!("/users/{}/preferences", encode(email)));
    debug!("Saving preferences to {}", url);
    let body = adapters::preferences_body(profile);
    send(with_bearer(client.put(&url), token).json(&body), "save preferences").await?;
    Ok(())
}

pub async fn get_recommendations(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
) -> Result<Vec<Recommendation>> {
    let url = join(base_url, &format!("/users/{}/recommendations", encode(email)));
    debug!("Fetching recommendations from {}", url);
    let payload: Value = send_json(with_bearer(client.get(&url), token), "fetch recommendations").await?;
    let recommendations = adapters::recommendations(payload);
    debug!("Received {} recommendations", recommendations.len());
    Ok(recommendations)
}

pub async fn mark_watched(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    movie_id: u64,
) -> Result<()> {
    let url = join(base_url, &format!("/users/{}/watched-movies", encode(email)));
    let body = serde_json::json!({ "movieId": movie_id });
    send(with_bearer(client.post(&url), token).json(&body), "mark movie as watched").await?;
    Ok(())
}

pub async fn refresh_recommendations(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
) -> Result<()> {
    let url = join(base_url, &format!("/users/{}/refresh-recommendations", encode(email)));
    debug!("Requesting recommendation refresh at {}", url);
    send(with_bearer(client.post(&url), token), "refresh recommendations").await?;
    Ok(())
}

/// Extended metadata from the recommendation service
pub async fn get_recommendation_details(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    movie_id: u64,
) -> Result<MovieDetails> {
    let url = join(
        base_url,
        &format!("/api/recommendations/{}/movies/{}", encode(email), movie_id),
    );
    debug!("Fetching recommendation details from {}", url);
    send_json(with_bearer(client.get(&url), token), "fetch movie details").await
}
