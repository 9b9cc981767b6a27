//! Statistics tab: aggregate charts, the watched list and a searchable catalog with
//! infinite scroll.

use crate::error::{ViewError, ViewResult};
use crate::generation::{Generation, Ticket};
use crate::session::Session;
use cinemarec_models::{Distribution, MovieDetails, MovieSummary, Statistics};
use cinemarec_services::{ServiceError, StatisticsApi};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One bar or pie slice, with its share of the distribution total
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    pub label: String,
    pub count: u32,
    pub percent: f64,
}

pub fn chart(distribution: &[Distribution]) -> Vec<ChartSlice> {
    let total: u32 = distribution.iter().map(|d| d.count).sum();
    distribution
        .iter()
        .map(|d| ChartSlice {
            label: d.label().to_string(),
            count: d.count,
            percent: if total == 0 {
                0.0
            } else {
                f64::from(d.count) * 100.0 / f64::from(total)
            },
        })
        .collect()
}

/// Chart-ready view of [`Statistics`]
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsCharts {
    pub total_watched: u32,
    pub genres: Vec<ChartSlice>,
    pub actors: Vec<ChartSlice>,
    pub directors: Vec<ChartSlice>,
    pub countries: Vec<ChartSlice>,
    pub analysis: Option<String>,
}

impl From<&Statistics> for StatisticsCharts {
    fn from(stats: &Statistics) -> Self {
        Self {
            total_watched: stats.total_watched,
            genres: chart(&stats.genre_distribution),
            actors: chart(&stats.actor_distribution),
            directors: chart(&stats.director_distribution),
            countries: chart(&stats.country_distribution),
            analysis: stats.preferences_analysis.clone(),
        }
    }
}

/// Request for the next catalog page of the current query
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub query: String,
    pub page: u32,
    ticket: Ticket,
}

/// Paging state of the catalog browser.
///
/// Pages are appended as they arrive. A page with no items ends paging for the query,
/// and results for a superseded query are dropped.
#[derive(Debug, Clone)]
pub struct MovieBrowser {
    query: String,
    items: Vec<MovieSummary>,
    seen: HashSet<u64>,
    next_page: u32,
    exhausted: bool,
    in_flight: bool,
    generation: Generation,
}

impl Default for MovieBrowser {
    fn default() -> Self {
        Self {
            query: String::new(),
            items: Vec::new(),
            seen: HashSet::new(),
            next_page: 1,
            exhausted: false,
            in_flight: false,
            generation: Generation::new(),
        }
    }
}

impl MovieBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[MovieSummary] {
        &self.items
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Start over with a new query; anything in flight becomes stale
    pub fn begin_query(&mut self, query: &str) {
        let generation = std::mem::take(&mut self.generation);
        *self = Self {
            query: query.trim().to_string(),
            generation,
            ..Self::default()
        };
        self.generation.invalidate();
    }

    /// The page the scroll sentinel should load, if any
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if self.exhausted || self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(PageRequest {
            query: self.query.clone(),
            page: self.next_page,
            ticket: self.generation.issue(),
        })
    }

    /// Append a fetched page; returns false when the request was superseded
    pub fn apply_page(&mut self, request: &PageRequest, items: Vec<MovieSummary>) -> bool {
        if !self.generation.is_current(request.ticket) {
            debug!("Dropping stale page {} for '{}'", request.page, request.query);
            return false;
        }
        self.in_flight = false;
        if items.is_empty() {
            self.exhausted = true;
            return true;
        }
        self.next_page = request.page + 1;
        for item in items {
            if self.seen.insert(item.movie_id) {
                self.items.push(item);
            }
        }
        true
    }

    /// Release a failed request so the page can be asked for again
    pub fn abandon(&mut self, request: &PageRequest) {
        if self.generation.is_current(request.ticket) {
            self.in_flight = false;
        }
    }

    pub fn set_watched(&mut self, movie_id: u64, watched: bool) {
        for item in self.items.iter_mut().filter(|m| m.movie_id == movie_id) {
            item.watched = watched;
        }
    }

    pub fn find(&self, movie_id: u64) -> Option<&MovieSummary> {
        self.items.iter().find(|m| m.movie_id == movie_id)
    }
}

/// A movie opened from the watched list or the browser
#[derive(Debug, Clone, PartialEq)]
pub struct MovieOverlay {
    pub details: MovieDetails,
    pub poster_url: String,
    pub watched: bool,
}

pub struct StatisticsView {
    api: Arc<dyn StatisticsApi>,
    statistics: Option<Statistics>,
    statistics_owner: Option<String>,
    watched: Vec<MovieSummary>,
    browser: MovieBrowser,
    overlay: Option<MovieOverlay>,
    background: Option<JoinHandle<Result<Statistics, ServiceError>>>,
}

impl StatisticsView {
    pub fn new(api: Arc<dyn StatisticsApi>) -> Self {
        Self {
            api,
            statistics: None,
            statistics_owner: None,
            watched: Vec::new(),
            browser: MovieBrowser::new(),
            overlay: None,
            background: None,
        }
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn charts(&self) -> Option<StatisticsCharts> {
        self.statistics.as_ref().map(StatisticsCharts::from)
    }

    pub fn watched(&self) -> &[MovieSummary] {
        &self.watched
    }

    pub fn browser(&self) -> &MovieBrowser {
        &self.browser
    }

    pub fn overlay(&self) -> Option<&MovieOverlay> {
        self.overlay.as_ref()
    }

    /// Aggregate statistics, fetched once per signed-in user
    pub async fn load_statistics(&mut self, session: &Session) -> ViewResult<&Statistics> {
        let email = session.email();
        if self.statistics_owner.as_deref() != Some(email) || self.statistics.is_none() {
            let stats = self.api.statistics(email).await?;
            debug!("Loaded statistics: {} watched", stats.total_watched);
            self.statistics_owner = Some(email.to_string());
            self.statistics = Some(stats);
        }
        self.statistics
            .as_ref()
            .ok_or_else(|| ViewError::Service("Statistics unavailable".to_string()))
    }

    pub async fn load_watched(&mut self, session: &Session) -> ViewResult<&[MovieSummary]> {
        self.watched = self.api.watched_movies(session.email()).await?;
        debug!("Loaded {} watched movies", self.watched.len());
        Ok(&self.watched)
    }

    /// Reset the browser to `query` and load its first page
    pub async fn search(&mut self, session: &Session, query: &str) -> ViewResult<usize> {
        self.browser.begin_query(query);
        self.load_more(session).await
    }

    /// Load the next page, if paging is not finished; returns the number of new items
    pub async fn load_more(&mut self, session: &Session) -> ViewResult<usize> {
        let Some(request) = self.browser.next_request() else {
            return Ok(0);
        };
        let before = self.browser.items().len();
        match self
            .api
            .browse_movies(session.email(), &request.query, request.page)
            .await
        {
            Ok(mut items) => {
                let watched: HashSet<u64> = self.watched.iter().map(|m| m.movie_id).collect();
                for item in items.iter_mut() {
                    item.watched |= watched.contains(&item.movie_id);
                }
                self.browser.apply_page(&request, items);
                Ok(self.browser.items().len() - before)
            }
            Err(e) => {
                self.browser.abandon(&request);
                Err(e.into())
            }
        }
    }

    pub async fn mark_watched(&mut self, session: &Session, movie_id: u64) -> ViewResult<()> {
        self.api.mark_watched(session.email(), movie_id).await?;
        self.patch_watched(movie_id, true);
        self.refetch_in_background(session);
        info!("Marked movie {} watched", movie_id);
        Ok(())
    }

    pub async fn unmark_watched(&mut self, session: &Session, movie_id: u64) -> ViewResult<()> {
        self.api.unmark_watched(session.email(), movie_id).await?;
        self.patch_watched(movie_id, false);
        self.refetch_in_background(session);
        info!("Removed movie {} from watched", movie_id);
        Ok(())
    }

    fn patch_watched(&mut self, movie_id: u64, watched: bool) {
        self.browser.set_watched(movie_id, watched);

        if watched {
            if !self.watched.iter().any(|m| m.movie_id == movie_id) {
                let summary = self
                    .browser
                    .find(movie_id)
                    .cloned()
                    .or_else(|| self.overlay.as_ref().map(|o| self.summary_from(o)));
                if let Some(summary) = summary {
                    self.watched.push(MovieSummary { watched: true, ..summary });
                }
            }
        } else {
            self.watched.retain(|m| m.movie_id != movie_id);
        }

        if let Some(overlay) = self.overlay.as_mut().filter(|o| o.details.id == movie_id) {
            overlay.watched = watched;
        }
    }

    fn summary_from(&self, overlay: &MovieOverlay) -> MovieSummary {
        let details = &overlay.details;
        MovieSummary {
            movie_id: details.id,
            title: details.title.clone(),
            poster_url: Some(overlay.poster_url.clone()),
            rating: details.vote_average,
            overview: details.overview.clone(),
            genres: details.genres.clone(),
            release_date: details.release_date.clone(),
            watched: overlay.watched,
        }
    }

    /// Refetch the aggregates without blocking the screen. A previous refetch still in
    /// flight is replaced.
    fn refetch_in_background(&mut self, session: &Session) {
        let api = self.api.clone();
        let email = session.email().to_string();
        if let Some(previous) = self.background.take() {
            previous.abort();
        }
        self.background = Some(tokio::spawn(async move { api.statistics(&email).await }));
    }

    fn apply_background(&mut self, outcome: Result<Result<Statistics, ServiceError>, tokio::task::JoinError>) {
        match outcome {
            Ok(Ok(stats)) => {
                debug!("Background statistics landed: {} watched", stats.total_watched);
                self.statistics = Some(stats);
            }
            Ok(Err(e)) => warn!("Background statistics refresh failed: {}", e),
            Err(e) => warn!("Background statistics task did not finish: {}", e),
        }
    }

    /// Apply the background refetch if it already landed; returns whether it did
    pub fn poll_background(&mut self) -> bool {
        let Some(handle) = self.background.as_mut() else {
            return false;
        };
        match handle.now_or_never() {
            Some(outcome) => {
                self.background = None;
                self.apply_background(outcome);
                true
            }
            None => false,
        }
    }

    /// Wait for the background refetch, if any, and apply it
    pub async fn settle(&mut self) {
        if let Some(handle) = self.background.take() {
            let outcome = handle.await;
            self.apply_background(outcome);
        }
    }

    /// Open a movie overlay with full details
    pub async fn open_movie(&mut self, session: &Session, movie_id: u64) -> ViewResult<&MovieOverlay> {
        let details = self.api.movie_details(session.email(), movie_id).await?;
        let watched = self.watched.iter().any(|m| m.movie_id == movie_id)
            || self.browser.find(movie_id).is_some_and(|m| m.watched);
        let overlay = MovieOverlay {
            poster_url: self.api.poster_url(movie_id),
            details,
            watched,
        };
        Ok(self.overlay.insert(overlay))
    }

    pub fn close_movie(&mut self) {
        self.overlay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{details, movie, session_for, FakeBackend};

    fn slice(name: &str, count: u32) -> Distribution {
        Distribution {
            name: Some(name.to_string()),
            genre: None,
            country: None,
            count,
        }
    }

    fn pages(backend: &FakeBackend, query: &str, pages: Vec<Vec<MovieSummary>>) {
        backend.browse_pages.lock().unwrap().insert(query.to_string(), pages);
    }

    #[test]
    fn test_chart_percentages() {
        let slices = chart(&[slice("Drama", 3), slice("Comedy", 1)]);
        assert_eq!(slices[0].percent, 75.0);
        assert_eq!(slices[1].label, "Comedy");
        assert!(chart(&[slice("None", 0)])[0].percent == 0.0);
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut browser = MovieBrowser::new();
        browser.begin_query("matrix");
        let old = browser.next_request().unwrap();
        browser.begin_query("fight");
        let current = browser.next_request().unwrap();

        assert!(!browser.apply_page(&old, vec![movie(603, "The Matrix")]));
        assert!(browser.apply_page(&current, vec![movie(550, "Fight Club")]));
        assert_eq!(browser.items().len(), 1);
        assert_eq!(browser.query(), "fight");
    }

    #[test]
    fn test_one_request_in_flight() {
        let mut browser = MovieBrowser::new();
        let first = browser.next_request().unwrap();
        assert!(browser.next_request().is_none());
        browser.abandon(&first);
        assert_eq!(browser.next_request().unwrap().page, 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_paging() {
        let backend = FakeBackend::new();
        pages(&backend, "", vec![vec![movie(1, "A"), movie(2, "B")], vec![]]);
        let mut view = StatisticsView::new(backend.clone());
        let session = session_for("ann@x.io");

        assert_eq!(view.search(&session, "").await.unwrap(), 2);
        assert_eq!(view.load_more(&session).await.unwrap(), 0);
        assert!(view.browser().is_exhausted());
        assert_eq!(view.load_more(&session).await.unwrap(), 0);
        assert_eq!(view.load_more(&session).await.unwrap(), 0);

        assert_eq!(backend.count("browse_movies"), 2);
        assert_eq!(backend.count("browse::3"), 0);
    }

    #[tokio::test]
    async fn test_new_query_resets_paging() {
        let backend = FakeBackend::new();
        pages(&backend, "", vec![vec![movie(1, "A")], vec![movie(2, "B")]]);
        pages(&backend, "club", vec![vec![movie(550, "Fight Club")]]);
        let mut view = StatisticsView::new(backend.clone());
        let session = session_for("ann@x.io");

        view.search(&session, "").await.unwrap();
        view.load_more(&session).await.unwrap();
        assert_eq!(view.browser().items().len(), 2);

        view.search(&session, "club").await.unwrap();
        let ids: Vec<u64> = view.browser().items().iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![550]);
        assert_eq!(backend.count("browse:club:1"), 1);
    }

    #[tokio::test]
    async fn test_statistics_loaded_once_per_user() {
        let backend = FakeBackend::new();
        backend.statistics.lock().unwrap().total_watched = 4;
        let mut view = StatisticsView::new(backend.clone());

        view.load_statistics(&session_for("ann@x.io")).await.unwrap();
        view.load_statistics(&session_for("ann@x.io")).await.unwrap();
        assert_eq!(backend.count("statistics"), 1);

        view.load_statistics(&session_for("bob@x.io")).await.unwrap();
        assert_eq!(backend.count("statistics"), 2);
        assert_eq!(view.charts().unwrap().total_watched, 4);
    }

    #[tokio::test]
    async fn test_mark_watched_patches_lists_and_refetches_stats() {
        let backend = FakeBackend::new();
        pages(&backend, "", vec![vec![movie(550, "Fight Club"), movie(13, "Forrest Gump")]]);
        backend.details.lock().unwrap().insert(550, details(550, "Fight Club"));
        let mut view = StatisticsView::new(backend.clone());
        let session = session_for("ann@x.io");
        view.load_statistics(&session).await.unwrap();
        view.search(&session, "").await.unwrap();
        view.open_movie(&session, 550).await.unwrap();

        backend.statistics.lock().unwrap().total_watched = 1;
        view.mark_watched(&session, 550).await.unwrap();

        assert!(view.browser().find(550).unwrap().watched);
        assert!(!view.browser().find(13).unwrap().watched);
        assert_eq!(view.watched()[0].movie_id, 550);
        assert!(view.overlay().unwrap().watched);

        view.settle().await;
        assert_eq!(view.statistics().unwrap().total_watched, 1);
        assert_eq!(backend.count("statistics"), 2);
        assert_eq!(backend.count("watched_movies"), 0);
    }

    #[tokio::test]
    async fn test_unmark_removes_from_watched_list() {
        let backend = FakeBackend::new();
        *backend.watched.lock().unwrap() = vec![MovieSummary {
            watched: true,
            ..movie(550, "Fight Club")
        }];
        let mut view = StatisticsView::new(backend.clone());
        let session = session_for("ann@x.io");
        view.load_watched(&session).await.unwrap();

        view.unmark_watched(&session, 550).await.unwrap();
        assert!(view.watched().is_empty());
        assert_eq!(backend.count("stats_unmark_watched"), 1);
        view.settle().await;
    }

    #[tokio::test]
    async fn test_failed_mark_keeps_state() {
        let backend = FakeBackend::new();
        pages(&backend, "", vec![vec![movie(550, "Fight Club")]]);
        backend.fail_on("stats_mark_watched");
        let mut view = StatisticsView::new(backend.clone());
        let session = session_for("ann@x.io");
        view.search(&session, "").await.unwrap();

        assert!(view.mark_watched(&session, 550).await.is_err());
        assert!(!view.browser().find(550).unwrap().watched);
        assert!(!view.poll_background());
    }

    #[tokio::test]
    async fn test_opened_movie_uses_poster_proxy() {
        let backend = FakeBackend::new();
        backend.details.lock().unwrap().insert(550, details(550, "Fight Club"));
        let mut view = StatisticsView::new(backend.clone());
        let overlay = view.open_movie(&session_for("ann@x.io"), 550).await.unwrap();
        assert_eq!(overlay.poster_url, "http://stats.test/tmdb/movies/550/poster");
        assert!(!overlay.watched);
        view.close_movie();
        assert!(view.overlay().is_none());
    }
}
