//! Recommendations tab: grouped cards, mark watched, refresh and the detail overlay.

use crate::error::ViewResult;
use crate::retry::Backoff;
use crate::session::Session;
use cinemarec_models::{MovieDetails, Recommendation, RecommendationCategory, TasteCategory};
use cinemarec_services::{PreferencesApi, RecommendationsApi};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Recommendations sharing the taste dimension that produced them; `None` holds
/// the ones the service did not tag
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationGroup {
    pub category: Option<RecommendationCategory>,
    pub items: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationsState {
    /// Nothing loaded yet
    Idle,
    /// The user has no preference profile; nothing to recommend from
    Onboarding,
    /// Non-empty groups in display order
    Ready(Vec<RecommendationGroup>),
}

/// Partition into the fixed categories with uncategorized items last, dropping empty groups
pub fn group(recommendations: Vec<Recommendation>) -> Vec<RecommendationGroup> {
    TasteCategory::RECOMMENDATION_ORDER
        .iter()
        .map(|category| Some(*category))
        .chain(std::iter::once(None))
        .filter_map(|category| {
            let items: Vec<Recommendation> = recommendations
                .iter()
                .filter(|r| r.category == category)
                .cloned()
                .collect();
            (!items.is_empty()).then_some(RecommendationGroup { category, items })
        })
        .collect()
}

/// Card opened over the list; details are fetched once per opening
#[derive(Debug, Clone, PartialEq)]
pub struct DetailOverlay {
    pub card: Recommendation,
    pub details: Option<MovieDetails>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Whether the service produced a different list
    pub changed: bool,
    pub attempts: u32,
}

pub struct RecommendationsView {
    preferences: Arc<dyn PreferencesApi>,
    recommendations: Arc<dyn RecommendationsApi>,
    backoff: Backoff,
    state: RecommendationsState,
    overlay: Option<DetailOverlay>,
}

impl RecommendationsView {
    pub fn new(
        preferences: Arc<dyn PreferencesApi>,
        recommendations: Arc<dyn RecommendationsApi>,
        backoff: Backoff,
    ) -> Self {
        Self {
            preferences,
            recommendations,
            backoff,
            state: RecommendationsState::Idle,
            overlay: None,
        }
    }

    pub fn state(&self) -> &RecommendationsState {
        &self.state
    }

    pub fn groups(&self) -> &[RecommendationGroup] {
        match &self.state {
            RecommendationsState::Ready(groups) => groups,
            _ => &[],
        }
    }

    fn flattened(&self) -> Vec<Recommendation> {
        self.groups().iter().flat_map(|g| g.items.iter().cloned()).collect()
    }

    pub fn find(&self, movie_id: u64) -> Option<&Recommendation> {
        self.groups()
            .iter()
            .flat_map(|g| g.items.iter())
            .find(|r| r.movie_id == movie_id)
    }

    /// Check the profile first; without one, show onboarding and skip the list fetch.
    /// Any stored profile counts, even one with no selections.
    pub async fn load(&mut self, session: &Session) -> ViewResult<&RecommendationsState> {
        let email = session.email();
        let has_profile = self.preferences.get_preferences(email).await?.is_some();

        if !has_profile {
            info!("No preference profile for {}, showing onboarding", email);
            self.state = RecommendationsState::Onboarding;
            return Ok(&self.state);
        }

        let list = self.recommendations.list_recommendations(email).await?;
        debug!("Loaded {} recommendations", list.len());
        self.state = RecommendationsState::Ready(group(list));
        Ok(&self.state)
    }

    /// Flag a recommendation watched once the service accepts it
    pub async fn mark_watched(&mut self, session: &Session, movie_id: u64) -> ViewResult<()> {
        self.recommendations.mark_watched(session.email(), movie_id).await?;

        if let RecommendationsState::Ready(groups) = &mut self.state {
            for item in groups.iter_mut().flat_map(|g| g.items.iter_mut()) {
                if item.movie_id == movie_id {
                    item.watched = true;
                }
            }
        }
        if let Some(overlay) = self.overlay.as_mut().filter(|o| o.card.movie_id == movie_id) {
            overlay.card.watched = true;
        }
        info!("Marked movie {} watched", movie_id);
        Ok(())
    }

    /// Ask for regeneration, then poll the list with backoff until it changes
    pub async fn refresh(&mut self, session: &Session) -> ViewResult<RefreshOutcome> {
        let email = session.email();
        let before = self.flattened();
        self.recommendations.request_refresh(email).await?;

        let api = self.recommendations.clone();
        let polled = self
            .backoff
            .poll_until(
                || {
                    let api = api.clone();
                    let email = email.to_string();
                    async move { api.list_recommendations(&email).await }
                },
                |list| *list != before,
            )
            .await?;

        if !polled.satisfied {
            warn!(
                "Recommendations unchanged after {} attempts, keeping latest list",
                polled.attempts
            );
        }
        self.state = RecommendationsState::Ready(group(polled.value));
        Ok(RefreshOutcome {
            changed: polled.satisfied,
            attempts: polled.attempts,
        })
    }

    pub fn overlay(&self) -> Option<&DetailOverlay> {
        self.overlay.as_ref()
    }

    /// Open the overlay for a card and fetch its extended metadata.
    /// A failed detail fetch stays inside the overlay unless the session is gone.
    pub async fn open_details(&mut self, session: &Session, movie_id: u64) -> ViewResult<&DetailOverlay> {
        let card = self.find(movie_id).cloned().ok_or_else(|| {
            crate::error::ViewError::validation(format!("Movie {} is not in the recommendation list", movie_id))
        })?;

        let mut overlay = DetailOverlay {
            card,
            details: None,
            error: None,
        };
        match self
            .recommendations
            .recommendation_details(session.email(), movie_id)
            .await
        {
            Ok(details) => overlay.details = Some(details),
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                warn!("Could not load details for {}: {}", movie_id, e);
                overlay.error = Some(e.to_string());
            }
        }
        Ok(self.overlay.insert(overlay))
    }

    pub fn close_details(&mut self) {
        self.overlay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{details, recommendation, session_for, FakeBackend};
    use crate::ViewError;
    use cinemarec_models::PreferenceProfile;
    use cinemarec_services::StoredPreferences;
    use std::time::Duration;

    fn with_profile() -> Arc<FakeBackend> {
        let backend = FakeBackend::new();
        let mut profile = PreferenceProfile::default();
        profile.favorite_genres.insert(18);
        *backend.preferences.lock().unwrap() = Some(StoredPreferences {
            profile,
            ..StoredPreferences::default()
        });
        *backend.recommendations.lock().unwrap() = vec![
            recommendation(1, RecommendationCategory::Genres),
            recommendation(2, RecommendationCategory::Actors),
            recommendation(3, RecommendationCategory::Genres),
        ];
        backend
    }

    fn view(backend: &Arc<FakeBackend>) -> RecommendationsView {
        RecommendationsView::new(backend.clone(), backend.clone(), Backoff::new(Duration::ZERO, 4))
    }

    #[tokio::test]
    async fn test_no_profile_shows_onboarding_without_fetch() {
        let backend = FakeBackend::new();
        let mut view = view(&backend);
        let state = view.load(&session_for("ann@x.io")).await.unwrap();
        assert_eq!(state, &RecommendationsState::Onboarding);
        assert_eq!(backend.count("list_recommendations"), 0);
    }

    #[tokio::test]
    async fn test_empty_stored_profile_still_lists() {
        let backend = with_profile();
        *backend.preferences.lock().unwrap() = Some(StoredPreferences::default());
        let mut view = view(&backend);
        view.load(&session_for("ann@x.io")).await.unwrap();

        assert_eq!(backend.count("list_recommendations"), 1);
        assert_eq!(view.groups().len(), 2);
    }

    #[tokio::test]
    async fn test_groups_follow_display_order_and_skip_empty() {
        let backend = with_profile();
        let mut view = view(&backend);
        view.load(&session_for("ann@x.io")).await.unwrap();

        let categories: Vec<Option<RecommendationCategory>> = view.groups().iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            vec![Some(RecommendationCategory::Actors), Some(RecommendationCategory::Genres)]
        );
        assert_eq!(view.groups()[1].items.len(), 2);
    }

    #[tokio::test]
    async fn test_uncategorized_recommendations_group_last() {
        let backend = with_profile();
        let mut untagged = recommendation(4, RecommendationCategory::Movies);
        untagged.category = None;
        backend.recommendations.lock().unwrap().insert(0, untagged);
        let mut view = view(&backend);
        view.load(&session_for("ann@x.io")).await.unwrap();

        let categories: Vec<Option<RecommendationCategory>> = view.groups().iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            vec![
                Some(RecommendationCategory::Actors),
                Some(RecommendationCategory::Genres),
                None
            ]
        );
        assert!(view.find(4).is_some());
    }

    #[tokio::test]
    async fn test_mark_watched_flips_without_refetch() {
        let backend = with_profile();
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        view.mark_watched(&session, 3).await.unwrap();
        assert!(view.find(3).unwrap().watched);
        assert!(!view.find(1).unwrap().watched);
        assert_eq!(backend.count("list_recommendations"), 1);
    }

    #[tokio::test]
    async fn test_failed_mark_watched_leaves_state() {
        let backend = with_profile();
        backend.fail_on("recommendation_watched");
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        let err = view.mark_watched(&session, 1).await.unwrap_err();
        assert!(matches!(err, ViewError::Service(_)));
        assert!(!view.find(1).unwrap().watched);
    }

    #[tokio::test]
    async fn test_refresh_polls_until_list_changes() {
        let backend = with_profile();
        *backend.refreshed.lock().unwrap() = Some(vec![recommendation(9, RecommendationCategory::Movies)]);
        *backend.refresh_lag.lock().unwrap() = 2;
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        let outcome = view.refresh(&session).await.unwrap();
        assert_eq!(outcome, RefreshOutcome { changed: true, attempts: 3 });
        assert_eq!(view.groups().len(), 1);
        assert!(view.find(9).is_some());
    }

    #[tokio::test]
    async fn test_refresh_gives_up_after_bounded_attempts() {
        let backend = with_profile();
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        let outcome = view.refresh(&session).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(backend.count("list_recommendations"), 5);
    }

    #[tokio::test]
    async fn test_overlay_mark_watched_updates_overlay_and_list() {
        let backend = with_profile();
        backend.details.lock().unwrap().insert(2, details(2, "Se7en"));
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        let overlay = view.open_details(&session, 2).await.unwrap();
        assert_eq!(overlay.details.as_ref().unwrap().title, "Se7en");

        view.mark_watched(&session, 2).await.unwrap();
        assert!(view.overlay().unwrap().card.watched);
        assert!(view.find(2).unwrap().watched);
    }

    #[tokio::test]
    async fn test_overlay_keeps_detail_failure_local() {
        let backend = with_profile();
        let mut view = view(&backend);
        let session = session_for("ann@x.io");
        view.load(&session).await.unwrap();

        let overlay = view.open_details(&session, 1).await.unwrap();
        assert!(overlay.details.is_none());
        assert!(overlay.error.is_some());

        backend.reject_on("recommendation_details");
        assert!(view.open_details(&session, 1).await.unwrap_err().is_auth());
        view.close_details();
        assert!(view.overlay().is_none());
    }
}
