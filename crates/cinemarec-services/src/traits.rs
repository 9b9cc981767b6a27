use crate::error::Result;
use async_trait::async_trait;
use cinemarec_models::{
    CatalogMovie, Department, Genre, ImageUpload, MovieDetails, MovieSummary, MovieVideo, NewQuizResult,
    Person, PreferenceProfile, Quiz, QuizDraft, QuizResult, Recommendation, Review, ReviewDraft, Statistics,
};

/// Identity service: trades credentials for a signed session token
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<String>;
    async fn register(&self, email: &str, password: &str) -> Result<String>;
    /// Exchange an identity asserted by Google for a session token
    async fn google_login(&self, email: &str, name: &str) -> Result<String>;
}

/// A stored profile plus whatever display metadata the service sent along with it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredPreferences {
    pub profile: PreferenceProfile,
    pub movies: Vec<CatalogMovie>,
    pub actors: Vec<Person>,
    pub directors: Vec<Person>,
}

#[async_trait]
pub trait PreferencesApi: Send + Sync {
    /// `None` when the user has never saved a profile
    async fn get_preferences(&self, email: &str) -> Result<Option<StoredPreferences>>;
    async fn save_preferences(&self, email: &str, profile: &PreferenceProfile) -> Result<()>;
}

#[async_trait]
pub trait RecommendationsApi: Send + Sync {
    async fn list_recommendations(&self, email: &str) -> Result<Vec<Recommendation>>;
    async fn mark_watched(&self, email: &str, movie_id: u64) -> Result<()>;
    /// Ask the service to regenerate; returns once the request is accepted
    async fn request_refresh(&self, email: &str) -> Result<()>;
    async fn recommendation_details(&self, email: &str, movie_id: u64) -> Result<MovieDetails>;
}

#[async_trait]
pub trait StatisticsApi: Send + Sync {
    async fn statistics(&self, email: &str) -> Result<Statistics>;
    async fn watched_movies(&self, email: &str) -> Result<Vec<MovieSummary>>;
    async fn mark_watched(&self, email: &str, movie_id: u64) -> Result<()>;
    async fn unmark_watched(&self, email: &str, movie_id: u64) -> Result<()>;
    /// One page of the searchable catalog; an empty query lists popular titles
    async fn browse_movies(&self, email: &str, query: &str, page: u32) -> Result<Vec<MovieSummary>>;
    async fn movie_details(&self, email: &str, movie_id: u64) -> Result<MovieDetails>;
    async fn movie_videos(&self, email: &str, movie_id: u64) -> Result<Vec<MovieVideo>>;
    fn poster_url(&self, movie_id: u64) -> String;
}

#[async_trait]
pub trait ReviewsApi: Send + Sync {
    async fn list_reviews(&self) -> Result<Vec<Review>>;
    async fn create_review(&self, email: &str, draft: &ReviewDraft, images: &[ImageUpload]) -> Result<Review>;
    async fn update_review(
        &self,
        email: &str,
        review_id: u64,
        draft: &ReviewDraft,
        images: &[ImageUpload],
        deleted_image_urls: &[String],
    ) -> Result<Review>;
    async fn delete_review(&self, email: &str, review_id: u64) -> Result<()>;
}

#[async_trait]
pub trait QuizzesApi: Send + Sync {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>>;
    async fn create_quiz(&self, email: &str, draft: &QuizDraft) -> Result<Quiz>;
    async fn update_quiz(&self, email: &str, quiz_id: u64, draft: &QuizDraft) -> Result<Quiz>;
    async fn submit_result(&self, email: &str, result: &NewQuizResult) -> Result<()>;
    async fn results(&self, email: &str) -> Result<Vec<QuizResult>>;
}

/// One page of a paged catalog listing.
///
/// `items` may be shorter than the backend's page, or empty, after department or rating
/// filters. `total_pages` counts the unfiltered backend pages; `None` when the provider
/// does not report it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    pub total_pages: Option<u32>,
}

impl<T> CatalogPage<T> {
    pub fn new(items: Vec<T>, total_pages: Option<u32>) -> Self {
        Self { items, total_pages }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CatalogPage<U> {
        CatalogPage {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
        }
    }
}

/// Reference catalog used by the preferences editor
#[async_trait]
pub trait CatalogApi: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn genres(&self) -> Result<Vec<Genre>>;
    /// Popular people filtered to one department; page sizes vary after filtering
    async fn popular_people(&self, department: Department, page: u32) -> Result<CatalogPage<Person>>;
    async fn popular_movies(&self, page: u32) -> Result<CatalogPage<CatalogMovie>>;
    async fn search_people(&self, department: Department, query: &str) -> Result<Vec<Person>>;
    async fn search_movies(&self, query: &str) -> Result<Vec<CatalogMovie>>;
    async fn movie(&self, movie_id: u64) -> Result<CatalogMovie>;
    async fn person(&self, person_id: u64) -> Result<Person>;
}
