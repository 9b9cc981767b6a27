use serde::{Deserialize, Serialize};

/// One bar or pie slice of a distribution chart.
///
/// The statistics service fills `name`, and additionally `genre` or `country` for the
/// genre and country distributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Distribution {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub count: u32,
}

impl Distribution {
    /// Display label, whichever of the label fields the service filled
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.genre.as_deref())
            .or(self.country.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub total_watched: u32,
    #[serde(default)]
    pub genre_distribution: Vec<Distribution>,
    #[serde(default)]
    pub actor_distribution: Vec<Distribution>,
    #[serde(default)]
    pub director_distribution: Vec<Distribution>,
    #[serde(default)]
    pub country_distribution: Vec<Distribution>,
    #[serde(default)]
    pub preferences_analysis: Option<String>,
}
