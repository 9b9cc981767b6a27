//! Normalization of service payloads into the client's canonical shapes.
//!
//! The backend services disagree on field names for the same concepts (`movieId` vs `id`,
//! `posterUrl` vs `poster_path`, genres as a list or a comma-joined string). Everything
//! passes through here before reaching a view-model.

use crate::traits::StoredPreferences;
use chrono::NaiveDateTime;
use cinemarec_models::catalog::image_url;
use cinemarec_models::{
    CatalogMovie, MovieSummary, Person, PreferenceProfile, Recommendation, TasteCategory,
};
use cinemarec_models::preferences::DEFAULT_MIN_RATING;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const POSTER_WIDTH: u32 = 500;

/// Integer id sent as a JSON number or as a numeric string
pub fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| object.get(*k))
        .find(|v| !v.is_null())
}

fn first_str(object: &Value, keys: &[&str]) -> Option<String> {
    first(object, keys)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Genres as `["Drama"]`, `[{"name":"Drama"}]` or `"Drama, Crime"`
pub fn genres_from_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(_) => item.get("name").and_then(|n| n.as_str()).map(str::to_string),
                _ => None,
            })
            .filter(|g| !g.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Map any movie-like object onto a [`MovieSummary`].
///
/// `movieId` wins over `id` because watched-list entries carry both, where `id` is the
/// record id rather than the movie's.
pub fn movie_summary_from_value(object: &Value) -> Option<MovieSummary> {
    let movie_id = first(object, &["movieId", "id"]).and_then(id_from_value)?;
    let title = first_str(object, &["title", "movieTitle", "name"])?;

    Some(MovieSummary {
        movie_id,
        title,
        poster_url: first_str(object, &["posterUrl", "posterPath", "poster_path"])
            .map(|p| image_url(&p, POSTER_WIDTH)),
        rating: first(object, &["rating", "voteAverage", "vote_average"]).and_then(number_from_value),
        overview: first_str(object, &["overview"]),
        genres: genres_from_value(object.get("genres")),
        release_date: first_str(object, &["releaseDate", "release_date"]),
        watched: object.get("watched").and_then(|w| w.as_bool()).unwrap_or(false),
    })
}

/// Normalize a list payload, dropping entries that lack an id or title
pub fn movie_summaries(payload: Value) -> Vec<MovieSummary> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(ref map) => match map.get("results") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let total = items.len();
    let movies: Vec<MovieSummary> = items.iter().filter_map(movie_summary_from_value).collect();
    if movies.len() < total {
        warn!("Dropped {} malformed movie entries", total - movies.len());
    }
    movies
}

/// Watched-list entries are by definition watched
pub fn watched_movies(payload: Value) -> Vec<MovieSummary> {
    movie_summaries(payload)
        .into_iter()
        .map(|movie| MovieSummary { watched: true, ..movie })
        .collect()
}

fn parse_timestamp(value: Option<&Value>) -> Option<NaiveDateTime> {
    let text = value?.as_str()?;
    text.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| chrono::DateTime::parse_from_rfc3339(text).ok().map(|d| d.naive_utc()))
}

/// `category` is optional: the recommendation service tags each item, the user
/// service's list does not. Unknown tags are kept uncategorized.
pub fn recommendation_from_value(object: &Value) -> Option<Recommendation> {
    let category = object.get("category").and_then(|c| c.as_str()).and_then(|tag| {
        let parsed = TasteCategory::parse(tag);
        if parsed.is_none() {
            debug!("Unknown recommendation category '{}'", tag);
        }
        parsed
    });
    let movie = movie_summary_from_value(object)?;

    Some(Recommendation {
        movie_id: movie.movie_id,
        title: movie.title,
        poster_url: movie.poster_url,
        rating: movie.rating,
        overview: movie.overview,
        genres: movie.genres,
        watched: movie.watched,
        category,
        recommended_at: parse_timestamp(object.get("recommendedAt")),
    })
}

pub fn recommendations(payload: Value) -> Vec<Recommendation> {
    let Value::Array(items) = payload else {
        warn!("Recommendations payload was not a list");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let parsed = recommendation_from_value(item);
            if parsed.is_none() {
                warn!("Skipping malformed recommendation: {}", item);
            }
            parsed
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    #[serde(default)]
    favorite_genres: Vec<Value>,
    #[serde(default)]
    favorite_actors: Vec<Value>,
    #[serde(default)]
    favorite_directors: Vec<Value>,
    #[serde(default)]
    favorite_movies: Vec<Value>,
    #[serde(default)]
    min_rating: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedPreferences {
    preferences: RawProfile,
    #[serde(default)]
    favorite_movies: Vec<Value>,
    #[serde(default)]
    favorite_actors: Vec<Value>,
    #[serde(default)]
    favorite_directors: Vec<Value>,
}

/// The current service wraps the profile with hydrated catalog objects; older builds
/// returned the profile fields at the top level.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PreferencesPayload {
    Wrapped(WrappedPreferences),
    Flat(RawProfile),
}

fn id_set(values: &[Value]) -> BTreeSet<u64> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::Object(_) => v.get("id").and_then(id_from_value),
            other => id_from_value(other),
        })
        .collect()
}

impl RawProfile {
    fn into_profile(self) -> PreferenceProfile {
        PreferenceProfile {
            favorite_genres: id_set(&self.favorite_genres),
            favorite_actors: id_set(&self.favorite_actors),
            favorite_directors: id_set(&self.favorite_directors),
            favorite_movies: id_set(&self.favorite_movies),
            min_rating: self
                .min_rating
                .as_ref()
                .and_then(number_from_value)
                .unwrap_or(DEFAULT_MIN_RATING),
        }
    }
}

/// Decode each element on its own, skipping the ones that do not fit `T`
pub fn parse_all<T: for<'de> Deserialize<'de>>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

pub fn stored_preferences(payload: Value) -> Result<StoredPreferences, serde_json::Error> {
    let stored = match serde_json::from_value::<PreferencesPayload>(payload)? {
        PreferencesPayload::Wrapped(wrapped) => StoredPreferences {
            profile: wrapped.preferences.into_profile(),
            movies: parse_all::<CatalogMovie>(wrapped.favorite_movies),
            actors: parse_all::<Person>(wrapped.favorite_actors),
            directors: parse_all::<Person>(wrapped.favorite_directors),
        },
        PreferencesPayload::Flat(raw) => StoredPreferences {
            profile: raw.into_profile(),
            ..StoredPreferences::default()
        },
    };
    Ok(stored)
}

/// Body for the wholesale preferences PUT. The service stores ids as strings.
pub fn preferences_body(profile: &PreferenceProfile) -> Value {
    let ids = |category: TasteCategory| -> Vec<String> {
        profile.ids(category).iter().map(|id| id.to_string()).collect()
    };
    serde_json::json!({
        "favoriteGenres": ids(TasteCategory::Genres),
        "favoriteActors": ids(TasteCategory::Actors),
        "favoriteDirectors": ids(TasteCategory::Directors),
        "favoriteMovies": ids(TasteCategory::Movies),
        "minRating": profile.min_rating,
    })
}
