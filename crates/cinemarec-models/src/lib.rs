pub mod catalog;
pub mod movie;
pub mod preferences;
pub mod quiz;
pub mod recommendation;
pub mod review;
pub mod session;
pub mod statistics;
pub mod upload;

pub use catalog::{CatalogMovie, Department, Genre, Person};
pub use movie::{MovieDetails, MovieSummary, MovieVideo, VideoKind};
pub use preferences::{PreferenceProfile, TasteCategory};
pub use quiz::{NewQuizResult, Question, QuestionDraft, Quiz, QuizDraft, QuizResult, ANSWERS_PER_QUESTION};
pub use recommendation::{Recommendation, RecommendationCategory};
pub use review::{Review, ReviewDraft};
pub use session::{Role, SessionClaims};
pub use statistics::{Distribution, Statistics};
pub use upload::ImageUpload;
