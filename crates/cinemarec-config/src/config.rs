use cinemarec_models::TasteCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Base URLs of the backend services, one per service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    #[serde(default = "default_auth_url")]
    pub auth: String,
    #[serde(default = "default_users_url")]
    pub users: String,
    #[serde(default = "default_recommendations_url")]
    pub recommendations: String,
    #[serde(default = "default_reviews_url")]
    pub reviews: String,
    #[serde(default = "default_quizzes_url")]
    pub quizzes: String,
    #[serde(default = "default_statistics_url")]
    pub statistics: String,
    #[serde(default = "default_tmdb_url")]
    pub tmdb: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogProvider {
    /// Catalog lookups through the user service (`/tmdb/*`)
    Proxy,
    /// Catalog lookups straight against the TMDB API (needs an API token)
    Tmdb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_provider")]
    pub provider: CatalogProvider,
    /// Items per displayed catalog page in the preferences editor
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    /// Request timeout; unset means the transport default
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_review_images")]
    pub max_review_images: usize,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_max_total_image_bytes")]
    pub max_total_image_bytes: u64,
}

/// Minimum number of selections per category before a profile can be saved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_min_genres")]
    pub min_genres: usize,
    #[serde(default = "default_min_actors")]
    pub min_actors: usize,
    #[serde(default)]
    pub min_directors: usize,
    #[serde(default = "default_min_movies")]
    pub min_movies: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause between revealing an answer and moving to the next question
    #[serde(default = "default_quiz_advance_ms")]
    pub quiz_advance_ms: u64,
    /// Settle delay before the first video auto-plays
    #[serde(default = "default_player_initial_settle_ms")]
    pub player_initial_settle_ms: u64,
    /// Settle delay before a newly selected video auto-plays
    #[serde(default = "default_player_select_settle_ms")]
    pub player_select_settle_ms: u64,
    #[serde(default = "default_refresh_initial_backoff_ms")]
    pub refresh_initial_backoff_ms: u64,
    #[serde(default = "default_refresh_max_attempts")]
    pub refresh_max_attempts: u32,
}

fn default_auth_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_users_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_recommendations_url() -> String {
    "http://localhost:8083".to_string()
}

fn default_reviews_url() -> String {
    "http://localhost:8084".to_string()
}

fn default_quizzes_url() -> String {
    "http://localhost:8085".to_string()
}

fn default_statistics_url() -> String {
    "http://localhost:8088".to_string()
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_catalog_provider() -> CatalogProvider {
    CatalogProvider::Proxy
}

fn default_page_size() -> usize {
    20
}

fn default_max_review_images() -> usize {
    5
}

fn default_max_image_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_max_total_image_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_min_genres() -> usize {
    3
}

fn default_min_actors() -> usize {
    1
}

fn default_min_movies() -> usize {
    3
}

fn default_quiz_advance_ms() -> u64 {
    1500
}

fn default_player_initial_settle_ms() -> u64 {
    500
}

fn default_player_select_settle_ms() -> u64 {
    300
}

fn default_refresh_initial_backoff_ms() -> u64 {
    500
}

fn default_refresh_max_attempts() -> u32 {
    5
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            auth: default_auth_url(),
            users: default_users_url(),
            recommendations: default_recommendations_url(),
            reviews: default_reviews_url(),
            quizzes: default_quizzes_url(),
            statistics: default_statistics_url(),
            tmdb: default_tmdb_url(),
        }
    }
}

impl EndpointConfig {
    /// Service name and URL pairs, in a stable order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("auth", self.auth.as_str()),
            ("users", self.users.as_str()),
            ("recommendations", self.recommendations.as_str()),
            ("reviews", self.reviews.as_str()),
            ("quizzes", self.quizzes.as_str()),
            ("statistics", self.statistics.as_str()),
            ("tmdb", self.tmdb.as_str()),
        ]
    }

    pub fn set(&mut self, service: &str, url: String) -> anyhow::Result<()> {
        let slot = match service {
            "auth" => &mut self.auth,
            "users" => &mut self.users,
            "recommendations" => &mut self.recommendations,
            "reviews" => &mut self.reviews,
            "quizzes" => &mut self.quizzes,
            "statistics" => &mut self.statistics,
            "tmdb" => &mut self.tmdb,
            other => return Err(anyhow::anyhow!("Unknown service: {}", other)),
        };
        *slot = url.trim_end_matches('/').to_string();
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            provider: default_catalog_provider(),
            page_size: default_page_size(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_review_images: default_max_review_images(),
            max_image_bytes: default_max_image_bytes(),
            max_total_image_bytes: default_max_total_image_bytes(),
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            min_genres: default_min_genres(),
            min_actors: default_min_actors(),
            min_directors: 0,
            min_movies: default_min_movies(),
        }
    }
}

impl PreferencesConfig {
    pub fn minimum(&self, category: TasteCategory) -> usize {
        match category {
            TasteCategory::Genres => self.min_genres,
            TasteCategory::Actors => self.min_actors,
            TasteCategory::Directors => self.min_directors,
            TasteCategory::Movies => self.min_movies,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            quiz_advance_ms: default_quiz_advance_ms(),
            player_initial_settle_ms: default_player_initial_settle_ms(),
            player_select_settle_ms: default_player_select_settle_ms(),
            refresh_initial_backoff_ms: default_refresh_initial_backoff_ms(),
            refresh_max_attempts: default_refresh_max_attempts(),
        }
    }
}

impl TimingConfig {
    pub fn quiz_advance(&self) -> Duration {
        Duration::from_millis(self.quiz_advance_ms)
    }

    pub fn player_initial_settle(&self) -> Duration {
        Duration::from_millis(self.player_initial_settle_ms)
    }

    pub fn player_select_settle(&self) -> Duration {
        Duration::from_millis(self.player_select_settle_ms)
    }

    pub fn refresh_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.refresh_initial_backoff_ms)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, otherwise fall back to the localhost defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (service, url) in self.endpoints.entries() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "Endpoint for {} must be an http(s) URL, got '{}'",
                    service,
                    url
                ));
            }
        }

        if self.catalog.page_size == 0 {
            return Err(anyhow::anyhow!("catalog.page_size must be greater than zero"));
        }

        if self.limits.max_review_images == 0 {
            return Err(anyhow::anyhow!("limits.max_review_images must be at least 1"));
        }
        if self.limits.max_image_bytes > self.limits.max_total_image_bytes {
            return Err(anyhow::anyhow!(
                "limits.max_image_bytes cannot exceed limits.max_total_image_bytes"
            ));
        }

        if self.timing.refresh_max_attempts == 0 {
            return Err(anyhow::anyhow!("timing.refresh_max_attempts must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.endpoints.set("reviews", "http://reviews.internal:9000/".to_string()).unwrap();
        config.catalog.provider = CatalogProvider::Tmdb;

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.endpoints.reviews, "http://reviews.internal:9000");
        assert_eq!(loaded.endpoints.auth, "http://localhost:8081");
        assert_eq!(loaded.catalog.provider, CatalogProvider::Tmdb);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [endpoints]
            statistics = "http://stats:8086"

            [preferences]
            min_genres = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.statistics, "http://stats:8086");
        assert_eq!(config.endpoints.users, "http://localhost:8082");
        assert_eq!(config.preferences.minimum(TasteCategory::Genres), 1);
        assert_eq!(config.preferences.minimum(TasteCategory::Movies), 3);
        assert_eq!(config.limits.max_review_images, 5);
        assert_eq!(config.timing.player_select_settle(), Duration::from_millis(300));
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.endpoints.auth = "localhost:8081".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.limits.max_image_bytes = config.limits.max_total_image_bytes + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_unknown_endpoint() {
        let mut endpoints = EndpointConfig::default();
        assert!(endpoints.set("billing", "http://x".to_string()).is_err());
    }
}
