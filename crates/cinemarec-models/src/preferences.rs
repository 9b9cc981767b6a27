use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Taste dimension a preference (or a recommendation derived from it) belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TasteCategory {
    Genres,
    Actors,
    Directors,
    Movies,
}

impl TasteCategory {
    pub const ALL: [TasteCategory; 4] = [
        TasteCategory::Genres,
        TasteCategory::Actors,
        TasteCategory::Directors,
        TasteCategory::Movies,
    ];

    /// Order in which recommendation groups are shown
    pub const RECOMMENDATION_ORDER: [TasteCategory; 4] = [
        TasteCategory::Actors,
        TasteCategory::Genres,
        TasteCategory::Directors,
        TasteCategory::Movies,
    ];

    /// Parse the category tag used by the services ("actors", "ACTOR", "genre-based", ...)
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        let stem = tag
            .strip_suffix("-based")
            .or_else(|| tag.strip_suffix("_based"))
            .unwrap_or(&tag);
        match stem.trim_end_matches('s') {
            "genre" => Some(TasteCategory::Genres),
            "actor" => Some(TasteCategory::Actors),
            "director" => Some(TasteCategory::Directors),
            "movie" => Some(TasteCategory::Movies),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TasteCategory::Genres => "Genres",
            TasteCategory::Actors => "Actors",
            TasteCategory::Directors => "Directors",
            TasteCategory::Movies => "Movies",
        }
    }
}

pub const MIN_RATING_FLOOR: f64 = 0.0;
pub const MIN_RATING_CEILING: f64 = 10.0;
pub const DEFAULT_MIN_RATING: f64 = 7.0;

/// A user's taste profile. One per user, always replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    #[serde(default)]
    pub favorite_genres: BTreeSet<u64>,
    #[serde(default)]
    pub favorite_actors: BTreeSet<u64>,
    #[serde(default)]
    pub favorite_directors: BTreeSet<u64>,
    #[serde(default)]
    pub favorite_movies: BTreeSet<u64>,
    pub min_rating: f64,
}

impl PreferenceProfile {
    pub fn ids(&self, category: TasteCategory) -> &BTreeSet<u64> {
        match category {
            TasteCategory::Genres => &self.favorite_genres,
            TasteCategory::Actors => &self.favorite_actors,
            TasteCategory::Directors => &self.favorite_directors,
            TasteCategory::Movies => &self.favorite_movies,
        }
    }

    pub fn ids_mut(&mut self, category: TasteCategory) -> &mut BTreeSet<u64> {
        match category {
            TasteCategory::Genres => &mut self.favorite_genres,
            TasteCategory::Actors => &mut self.favorite_actors,
            TasteCategory::Directors => &mut self.favorite_directors,
            TasteCategory::Movies => &mut self.favorite_movies,
        }
    }

    pub fn is_empty(&self) -> bool {
        TasteCategory::ALL.iter().all(|c| self.ids(*c).is_empty())
    }
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            favorite_genres: BTreeSet::new(),
            favorite_actors: BTreeSet::new(),
            favorite_directors: BTreeSet::new(),
            favorite_movies: BTreeSet::new(),
            min_rating: DEFAULT_MIN_RATING,
        }
    }
}
