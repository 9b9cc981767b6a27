//! In-memory service fakes for view-model tests.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cinemarec_models::{
    CatalogMovie, Department, Genre, ImageUpload, MovieDetails, MovieSummary, MovieVideo, NewQuizResult, Person,
    PreferenceProfile, Quiz, QuizDraft, QuizResult, Recommendation, RecommendationCategory, Review, ReviewDraft,
    Statistics,
};
use cinemarec_services::error::Result;
use cinemarec_services::{
    AuthApi, CatalogApi, CatalogPage, PreferencesApi, QuizzesApi, RecommendationsApi, ReviewsApi, ServiceError, StatisticsApi,
    StoredPreferences,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

pub fn token_for(email: &str, role: &str, exp: i64) -> String {
    jwt(&json!({ "sub": email, "role": role, "exp": exp }))
}

pub struct FakeAuth {
    token: String,
    calls: AtomicUsize,
    google: Mutex<Option<(String, String)>>,
}

impl FakeAuth {
    pub fn issuing(token: String) -> Arc<Self> {
        Arc::new(Self {
            token,
            calls: AtomicUsize::new(0),
            google: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_google(&self) -> Option<(String, String)> {
        self.google.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, _email: &str, _password: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }

    async fn register(&self, _email: &str, _password: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }

    async fn google_login(&self, email: &str, name: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.google.lock().unwrap() = Some((email.to_string(), name.to_string()));
        Ok(self.token.clone())
    }
}

pub fn movie(id: u64, title: &str) -> MovieSummary {
    MovieSummary {
        movie_id: id,
        title: title.to_string(),
        poster_url: None,
        rating: Some(7.5),
        overview: None,
        genres: vec!["Drama".to_string()],
        release_date: None,
        watched: false,
    }
}

pub fn recommendation(id: u64, category: RecommendationCategory) -> Recommendation {
    Recommendation {
        movie_id: id,
        title: format!("Movie {}", id),
        poster_url: None,
        rating: Some(8.0),
        overview: None,
        genres: Vec::new(),
        watched: false,
        category: Some(category),
        recommended_at: None,
    }
}

pub fn details(id: u64, title: &str) -> MovieDetails {
    MovieDetails {
        id,
        title: title.to_string(),
        overview: Some("Overview".to_string()),
        poster_path: None,
        vote_average: Some(8.1),
        release_date: Some("1999-10-15".to_string()),
        runtime: Some(139),
        genres: vec!["Drama".to_string()],
        actors: vec!["Brad Pitt".to_string()],
        directors: vec!["David Fincher".to_string()],
        country: Some("US".to_string()),
    }
}

pub fn video(key: &str, kind: &str) -> MovieVideo {
    MovieVideo {
        id: Some(key.to_string()),
        key: key.to_string(),
        name: format!("{} {}", kind, key),
        site: Some("YouTube".to_string()),
        video_type: kind.to_string(),
        size: Some(1080),
    }
}

pub fn person(id: u64, name: &str, department: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
        profile_path: None,
        known_for_department: Some(department.to_string()),
    }
}

pub fn catalog_movie(id: u64, title: &str) -> CatalogMovie {
    CatalogMovie {
        id,
        title: title.to_string(),
        poster_path: None,
        vote_average: None,
        overview: None,
        release_date: None,
    }
}

/// One fake standing in for every backend service.
///
/// Each call is logged by name so tests can assert what was (or was not) requested.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    unauthorized: Mutex<HashSet<&'static str>>,

    pub preferences: Mutex<Option<StoredPreferences>>,
    pub saved_profiles: Mutex<Vec<PreferenceProfile>>,

    pub recommendations: Mutex<Vec<Recommendation>>,
    /// List returned once a refresh was requested and `refresh_lag` more list calls passed
    pub refreshed: Mutex<Option<Vec<Recommendation>>>,
    pub refresh_lag: Mutex<usize>,
    refresh_requested: Mutex<bool>,
    pub details: Mutex<HashMap<u64, MovieDetails>>,

    pub statistics: Mutex<Statistics>,
    pub watched: Mutex<Vec<MovieSummary>>,
    /// Browse pages per query, page 1 first
    pub browse_pages: Mutex<HashMap<String, Vec<Vec<MovieSummary>>>>,
    pub videos: Mutex<Vec<MovieVideo>>,

    pub reviews: Mutex<Vec<Review>>,
    pub review_uploads: Mutex<Vec<(ReviewDraft, usize, Vec<String>)>>,

    pub quizzes: Mutex<Vec<Quiz>>,
    pub saved_quizzes: Mutex<Vec<QuizDraft>>,
    pub results: Mutex<Vec<QuizResult>>,
    pub posted_results: Mutex<Vec<NewQuizResult>>,

    pub genres: Mutex<Vec<Genre>>,
    pub people_pages: Mutex<HashMap<&'static str, Vec<Vec<Person>>>>,
    pub movie_pages: Mutex<Vec<Vec<CatalogMovie>>>,
    pub people_search: Mutex<HashMap<String, Vec<Person>>>,
    pub movie_search: Mutex<HashMap<String, Vec<CatalogMovie>>>,
    pub catalog_movies: Mutex<HashMap<u64, CatalogMovie>>,
    pub catalog_people: Mutex<HashMap<u64, Person>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn reject_on(&self, operation: &'static str) {
        self.unauthorized.lock().unwrap().insert(operation);
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == operation).count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        self.record_detail(operation, operation.to_string())
    }

    fn record_detail(&self, operation: &'static str, entry: String) -> Result<()> {
        self.calls.lock().unwrap().push(entry);
        if self.unauthorized.lock().unwrap().contains(operation) {
            return Err(ServiceError::Unauthorized(format!("{} was rejected", operation)));
        }
        if self.failing.lock().unwrap().contains(operation) {
            return Err(ServiceError::Status {
                action: operation.to_string(),
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

/// Serve 1-based `page` from a seeded list, reporting the list length as the page count
fn page_of<T: Clone>(pages: Vec<Vec<T>>, page: u32) -> CatalogPage<T> {
    let items = pages.get(page as usize - 1).cloned().unwrap_or_default();
    CatalogPage::new(items, Some(pages.len() as u32))
}

fn department_key(department: Department) -> &'static str {
    match department {
        Department::Acting => "actors",
        Department::Directing => "directors",
    }
}

#[async_trait]
impl PreferencesApi for FakeBackend {
    async fn get_preferences(&self, _email: &str) -> Result<Option<StoredPreferences>> {
        self.record("get_preferences")?;
        Ok(self.preferences.lock().unwrap().clone())
    }

    async fn save_preferences(&self, _email: &str, profile: &PreferenceProfile) -> Result<()> {
        self.record("save_preferences")?;
        self.saved_profiles.lock().unwrap().push(profile.clone());
        Ok(())
    }
}

#[async_trait]
impl RecommendationsApi for FakeBackend {
    async fn list_recommendations(&self, _email: &str) -> Result<Vec<Recommendation>> {
        self.record("list_recommendations")?;
        if *self.refresh_requested.lock().unwrap() {
            let mut lag = self.refresh_lag.lock().unwrap();
            if *lag > 0 {
                *lag -= 1;
            } else if let Some(fresh) = self.refreshed.lock().unwrap().clone() {
                return Ok(fresh);
            }
        }
        Ok(self.recommendations.lock().unwrap().clone())
    }

    async fn mark_watched(&self, _email: &str, _movie_id: u64) -> Result<()> {
        self.record("recommendation_watched")
    }

    async fn request_refresh(&self, _email: &str) -> Result<()> {
        self.record("request_refresh")?;
        *self.refresh_requested.lock().unwrap() = true;
        Ok(())
    }

    async fn recommendation_details(&self, _email: &str, movie_id: u64) -> Result<MovieDetails> {
        self.record("recommendation_details")?;
        self.details
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| ServiceError::Status {
                action: "fetch movie details".to_string(),
                status: 404,
                body: String::new(),
            })
    }
}

#[async_trait]
impl StatisticsApi for FakeBackend {
    async fn statistics(&self, _email: &str) -> Result<Statistics> {
        self.record("statistics")?;
        Ok(self.statistics.lock().unwrap().clone())
    }

    async fn watched_movies(&self, _email: &str) -> Result<Vec<MovieSummary>> {
        self.record("watched_movies")?;
        Ok(self.watched.lock().unwrap().clone())
    }

    async fn mark_watched(&self, _email: &str, _movie_id: u64) -> Result<()> {
        self.record("stats_mark_watched")
    }

    async fn unmark_watched(&self, _email: &str, _movie_id: u64) -> Result<()> {
        self.record("stats_unmark_watched")
    }

    async fn browse_movies(&self, _email: &str, query: &str, page: u32) -> Result<Vec<MovieSummary>> {
        self.record_detail("browse_movies", "browse_movies".to_string())?;
        self.calls.lock().unwrap().push(format!("browse:{}:{}", query, page));
        let pages = self.browse_pages.lock().unwrap();
        Ok(pages
            .get(query)
            .and_then(|p| p.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn movie_details(&self, _email: &str, movie_id: u64) -> Result<MovieDetails> {
        self.record("movie_details")?;
        self.details
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| ServiceError::Status {
                action: "fetch movie details".to_string(),
                status: 404,
                body: String::new(),
            })
    }

    async fn movie_videos(&self, _email: &str, _movie_id: u64) -> Result<Vec<MovieVideo>> {
        self.record("movie_videos")?;
        Ok(self.videos.lock().unwrap().clone())
    }

    fn poster_url(&self, movie_id: u64) -> String {
        format!("http://stats.test/tmdb/movies/{}/poster", movie_id)
    }
}

#[async_trait]
impl ReviewsApi for FakeBackend {
    async fn list_reviews(&self) -> Result<Vec<Review>> {
        self.record("list_reviews")?;
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn create_review(&self, email: &str, draft: &ReviewDraft, images: &[ImageUpload]) -> Result<Review> {
        self.record("create_review")?;
        self.review_uploads
            .lock()
            .unwrap()
            .push((draft.clone(), images.len(), Vec::new()));
        let mut reviews = self.reviews.lock().unwrap();
        let review = Review {
            id: reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            user_email: email.to_string(),
            movie_title: draft.movie_title.clone(),
            rating: draft.rating,
            text: draft.text.clone(),
            image_urls: images.iter().map(|i| format!("http://img.test/{}", i.file_name)).collect(),
            created_at: None,
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(
        &self,
        _email: &str,
        review_id: u64,
        draft: &ReviewDraft,
        images: &[ImageUpload],
        deleted_image_urls: &[String],
    ) -> Result<Review> {
        self.record("update_review")?;
        self.review_uploads
            .lock()
            .unwrap()
            .push((draft.clone(), images.len(), deleted_image_urls.to_vec()));
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| ServiceError::Status {
                action: "update review".to_string(),
                status: 404,
                body: String::new(),
            })?;
        review.movie_title = draft.movie_title.clone();
        review.rating = draft.rating;
        review.text = draft.text.clone();
        review.image_urls.retain(|u| !deleted_image_urls.contains(u));
        review
            .image_urls
            .extend(images.iter().map(|i| format!("http://img.test/{}", i.file_name)));
        Ok(review.clone())
    }

    async fn delete_review(&self, _email: &str, review_id: u64) -> Result<()> {
        self.record("delete_review")?;
        self.reviews.lock().unwrap().retain(|r| r.id != review_id);
        Ok(())
    }
}

#[async_trait]
impl QuizzesApi for FakeBackend {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        self.record("list_quizzes")?;
        Ok(self.quizzes.lock().unwrap().clone())
    }

    async fn create_quiz(&self, email: &str, draft: &QuizDraft) -> Result<Quiz> {
        self.record("create_quiz")?;
        self.saved_quizzes.lock().unwrap().push(draft.clone());
        let mut quizzes = self.quizzes.lock().unwrap();
        let quiz = quiz_from_draft(quizzes.iter().map(|q| q.id).max().unwrap_or(0) + 1, email, draft);
        quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, email: &str, quiz_id: u64, draft: &QuizDraft) -> Result<Quiz> {
        self.record("update_quiz")?;
        self.saved_quizzes.lock().unwrap().push(draft.clone());
        let quiz = quiz_from_draft(quiz_id, email, draft);
        let mut quizzes = self.quizzes.lock().unwrap();
        quizzes.retain(|q| q.id != quiz_id);
        quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn submit_result(&self, _email: &str, result: &NewQuizResult) -> Result<()> {
        self.record("submit_result")?;
        self.posted_results.lock().unwrap().push(*result);
        Ok(())
    }

    async fn results(&self, _email: &str) -> Result<Vec<QuizResult>> {
        self.record("results")?;
        Ok(self.results.lock().unwrap().clone())
    }
}

fn quiz_from_draft(id: u64, email: &str, draft: &QuizDraft) -> Quiz {
    Quiz {
        id,
        title: draft.title.clone(),
        description: draft.description.clone(),
        creator_email: Some(email.to_string()),
        questions: draft
            .questions
            .iter()
            .map(|q| cinemarec_models::Question {
                id: None,
                text: q.text.clone(),
                image_url: q.image_url.clone(),
                answers: q.answers.clone(),
                correct_answer: q.correct_answer,
            })
            .collect(),
        is_public: draft.is_public,
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        self.record("genres")?;
        Ok(self.genres.lock().unwrap().clone())
    }

    async fn popular_people(&self, department: Department, page: u32) -> Result<CatalogPage<Person>> {
        let key = department_key(department);
        self.record_detail("popular_people", format!("people:{}:{}", key, page))?;
        let all = self.people_pages.lock().unwrap();
        let pages = all.get(key).cloned().unwrap_or_default();
        Ok(page_of(pages, page))
    }

    async fn popular_movies(&self, page: u32) -> Result<CatalogPage<CatalogMovie>> {
        self.record_detail("popular_movies", format!("movies:{}", page))?;
        let pages = self.movie_pages.lock().unwrap().clone();
        Ok(page_of(pages, page))
    }

    async fn search_people(&self, department: Department, query: &str) -> Result<Vec<Person>> {
        self.record("search_people")?;
        Ok(self
            .people_search
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.works_in(department))
            .collect())
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<CatalogMovie>> {
        self.record("search_movies")?;
        Ok(self.movie_search.lock().unwrap().get(query).cloned().unwrap_or_default())
    }

    async fn movie(&self, movie_id: u64) -> Result<CatalogMovie> {
        self.record("catalog_movie")?;
        self.catalog_movies
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| ServiceError::Unsupported(format!("no movie {}", movie_id)))
    }

    async fn person(&self, person_id: u64) -> Result<Person> {
        self.record("catalog_person")?;
        self.catalog_people
            .lock()
            .unwrap()
            .get(&person_id)
            .cloned()
            .ok_or_else(|| ServiceError::Unsupported(format!("no person {}", person_id)))
    }
}

pub fn session_for(email: &str) -> crate::session::Session {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp();
    crate::session::Session::from_token(&token_for(email, "USER", exp), chrono::Utc::now())
        .expect("valid test session")
}
