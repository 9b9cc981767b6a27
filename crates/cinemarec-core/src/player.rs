//! Movie player: metadata plus promotional videos for one title.

use crate::error::{ViewError, ViewResult};
use cinemarec_config::TimingConfig;
use cinemarec_models::{MovieDetails, MovieVideo, VideoKind};
use cinemarec_services::StatisticsApi;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No videos to play
    Empty,
    /// Video `index` is loaded and starts once the delay passes
    Settling { index: usize, delay: Duration },
    Playing { index: usize },
}

pub struct PlayerView {
    details: MovieDetails,
    videos: Vec<MovieVideo>,
    poster_url: String,
    state: PlayerState,
    select_settle: Duration,
}

impl PlayerView {
    /// Open the player for the route's movie and user. The movie is required; videos are
    /// optional and a failure to fetch them leaves the player empty.
    pub async fn open(
        api: Arc<dyn StatisticsApi>,
        timing: &TimingConfig,
        movie_id: Option<u64>,
        email: Option<&str>,
    ) -> ViewResult<Self> {
        let (Some(movie_id), Some(email)) = (movie_id, email.filter(|e| !e.trim().is_empty())) else {
            return Err(ViewError::validation("A movie id and user email are required to play"));
        };

        let (details, videos) = futures::join!(api.movie_details(email, movie_id), api.movie_videos(email, movie_id));
        let details = details?;
        let videos = videos.unwrap_or_else(|e| {
            warn!("No videos for movie {}: {}", movie_id, e);
            Vec::new()
        });
        debug!("Player opened for {} with {} videos", movie_id, videos.len());

        let state = if videos.is_empty() {
            PlayerState::Empty
        } else {
            PlayerState::Settling {
                index: 0,
                delay: timing.player_initial_settle(),
            }
        };
        Ok(Self {
            poster_url: api.poster_url(movie_id),
            details,
            videos,
            state,
            select_settle: timing.player_select_settle(),
        })
    }

    pub fn details(&self) -> &MovieDetails {
        &self.details
    }

    pub fn poster_url(&self) -> &str {
        &self.poster_url
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn videos(&self) -> &[MovieVideo] {
        &self.videos
    }

    /// Videos of one kind, with their index for [`PlayerView::select`]
    pub fn of_kind(&self, kind: VideoKind) -> Vec<(usize, &MovieVideo)> {
        self.videos
            .iter()
            .enumerate()
            .filter(|(_, v)| v.kind() == kind)
            .collect()
    }

    pub fn trailers(&self) -> Vec<(usize, &MovieVideo)> {
        self.of_kind(VideoKind::Trailer)
    }

    pub fn teasers(&self) -> Vec<(usize, &MovieVideo)> {
        self.of_kind(VideoKind::Teaser)
    }

    pub fn others(&self) -> Vec<(usize, &MovieVideo)> {
        self.of_kind(VideoKind::Other)
    }

    pub fn selected(&self) -> Option<&MovieVideo> {
        match self.state {
            PlayerState::Empty => None,
            PlayerState::Settling { index, .. } | PlayerState::Playing { index } => self.videos.get(index),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlayerState::Playing { .. })
    }

    /// Swap the source; playback restarts after the selection delay
    pub fn select(&mut self, index: usize) -> ViewResult<&MovieVideo> {
        if index >= self.videos.len() {
            return Err(ViewError::validation(format!("No video {}", index + 1)));
        }
        self.state = PlayerState::Settling {
            index,
            delay: self.select_settle,
        };
        Ok(&self.videos[index])
    }

    /// Wait out a pending settle delay and start playback
    pub async fn settle(&mut self) {
        if let PlayerState::Settling { index, delay } = self.state {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.state = PlayerState::Playing { index };
        }
    }

    /// Embed URL of the selected video, autoplaying once settled
    pub fn embed_url(&self) -> Option<String> {
        self.selected().map(|v| v.embed_url(self.is_playing()))
    }

    pub fn watch_url(&self) -> Option<String> {
        self.selected().map(MovieVideo::watch_url)
    }
}
