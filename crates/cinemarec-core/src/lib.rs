pub mod error;
pub mod generation;
pub mod player;
pub mod preferences;
pub mod quiz;
pub mod recommendations;
pub mod retry;
pub mod reviews;
pub mod session;
pub mod statistics;

#[cfg(test)]
pub(crate) mod fakes;

pub use error::{ViewError, ViewResult};
pub use generation::{Generation, Ticket};
pub use player::{PlayerState, PlayerView};
pub use preferences::{CatalogEntry, CatalogWindow, ListMode, PreferencesEditor, SaveOutcome, Shortfall};
pub use quiz::{validate_quiz, AnswerFeedback, QuizPlay, QuizzesView};
pub use recommendations::{DetailOverlay, RecommendationGroup, RecommendationsState, RecommendationsView, RefreshOutcome};
pub use retry::Backoff;
pub use reviews::{validate_draft, ImageLimits, Lightbox, ReviewFilter, ReviewsView};
pub use session::{
    Authenticator, DashboardTab, GuardOutcome, MemorySessionStore, Route, Session, SessionGuard, SessionStore, SignedIn,
};
pub use statistics::{ChartSlice, MovieBrowser, MovieOverlay, StatisticsCharts, StatisticsView};
