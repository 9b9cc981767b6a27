pub mod adapters;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod factory;
pub mod http;
pub mod multipart;
pub mod quizzes;
pub mod reviews;
pub mod statistics;
pub mod traits;
pub mod users;

pub use auth::AuthClient;
pub use catalog::{ProxyCatalogClient, TmdbCatalogClient};
pub use error::ServiceError;
pub use factory::{CatalogFactory, CatalogFactoryRegistry, Services};
pub use quizzes::QuizzesClient;
pub use reviews::ReviewsClient;
pub use statistics::StatisticsClient;
pub use traits::{
    AuthApi, CatalogApi, CatalogPage, PreferencesApi, QuizzesApi, RecommendationsApi, ReviewsApi, StatisticsApi,
    StoredPreferences,
};
pub use users::UsersClient;
