use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use crate::preferences::TasteCategory as RecommendationCategory;

/// A suggested movie, tagged with the taste dimension that produced it when the
/// serving endpoint reports one. The user service's list carries no category.
///
/// Recommendations are regenerated by the service on demand; the client only lists them
/// and flags them watched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub movie_id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub watched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RecommendationCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_at: Option<NaiveDateTime>,
}
