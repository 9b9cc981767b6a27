use serde::{Deserialize, Serialize};

/// Canonical shape for a movie shown in a list.
///
/// The watched-list and catalog endpoints name the same concepts differently; both are
/// normalized into this one shape before display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub watched: bool,
}

/// Extended metadata for a single title (read-only catalog projection)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Kind of promotional clip, as labelled by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoKind {
    Trailer,
    Teaser,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieVideo {
    #[serde(default)]
    pub id: Option<String>,
    /// Key on the hosting site (a YouTube video id for site "YouTube")
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub size: Option<u32>,
}

impl MovieVideo {
    pub fn kind(&self) -> VideoKind {
        match self.video_type.as_str() {
            "Trailer" => VideoKind::Trailer,
            "Teaser" => VideoKind::Teaser,
            _ => VideoKind::Other,
        }
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }

    pub fn embed_url(&self, autoplay: bool) -> String {
        format!(
            "https://www.youtube.com/embed/{}?autoplay={}",
            self.key,
            if autoplay { 1 } else { 0 }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_kind_and_urls() {
        let video: MovieVideo = serde_json::from_str(
            r#"{"id":"v1","key":"abc123","name":"Official Trailer","site":"YouTube","type":"Trailer","size":1080}"#,
        )
        .unwrap();
        assert_eq!(video.kind(), VideoKind::Trailer);
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(video.embed_url(true), "https://www.youtube.com/embed/abc123?autoplay=1");

        let clip = MovieVideo { video_type: "Featurette".to_string(), ..video };
        assert_eq!(clip.kind(), VideoKind::Other);
    }

    #[test]
    fn test_movie_details_tolerates_missing_fields() {
        let details: MovieDetails = serde_json::from_str(r#"{"id":550,"title":"Fight Club"}"#).unwrap();
        assert_eq!(details.id, 550);
        assert!(details.genres.is_empty());
        assert_eq!(details.runtime, None);
    }
}
