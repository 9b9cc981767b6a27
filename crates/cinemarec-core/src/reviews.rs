//! Reviews tab: list, filter, author-only edit and delete, image uploads and the viewer.

use crate::error::{ViewError, ViewResult};
use crate::session::Session;
use cinemarec_config::LimitsConfig;
use cinemarec_models::{ImageUpload, Review, ReviewDraft};
use cinemarec_services::ReviewsApi;
use std::sync::Arc;
use tracing::{debug, info};

pub const MIN_REVIEW_RATING: u8 = 1;
pub const MAX_REVIEW_RATING: u8 = 10;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_images: usize,
    pub max_image_bytes: u64,
    pub max_total_bytes: u64,
}

impl From<&LimitsConfig> for ImageLimits {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_images: limits.max_review_images,
            max_image_bytes: limits.max_image_bytes,
            max_total_bytes: limits.max_total_image_bytes,
        }
    }
}

fn megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB as f64)
}

impl ImageLimits {
    /// Check new attachments against the limits, counting `kept` images already stored
    pub fn validate(&self, kept: usize, new: &[ImageUpload]) -> ViewResult<()> {
        if kept + new.len() > self.max_images {
            return Err(ViewError::validation(format!(
                "Too many images: {} selected (max {} images)",
                kept + new.len(),
                self.max_images
            )));
        }
        if let Some(large) = new.iter().find(|i| i.size() > self.max_image_bytes) {
            return Err(ViewError::validation(format!(
                "{} is {} (max {} per image)",
                large.file_name,
                megabytes(large.size()),
                megabytes(self.max_image_bytes)
            )));
        }
        let total: u64 = new.iter().map(ImageUpload::size).sum();
        if total > self.max_total_bytes {
            return Err(ViewError::validation(format!(
                "Images total {} (max {} combined)",
                megabytes(total),
                megabytes(self.max_total_bytes)
            )));
        }
        Ok(())
    }
}

pub fn validate_draft(draft: &ReviewDraft) -> ViewResult<()> {
    if draft.movie_title.trim().is_empty() {
        return Err(ViewError::validation("Movie title is required"));
    }
    if draft.text.trim().is_empty() {
        return Err(ViewError::validation("Review text is required"));
    }
    if !(MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&draft.rating) {
        return Err(ViewError::validation(format!(
            "Rating must be between {} and {}",
            MIN_REVIEW_RATING, MAX_REVIEW_RATING
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    /// Case-insensitive substring of the movie title
    pub title_query: String,
    pub mine_only: bool,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review, viewer_email: &str) -> bool {
        if self.mine_only && !review.is_authored_by(viewer_email) {
            return false;
        }
        let needle = self.title_query.trim().to_lowercase();
        needle.is_empty() || review.movie_title.to_lowercase().contains(&needle)
    }
}

/// Full-screen image browser over one review's images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    images: Vec<String>,
    index: usize,
}

impl Lightbox {
    pub fn new(images: Vec<String>, start: usize) -> Option<Self> {
        if images.is_empty() {
            return None;
        }
        let index = start.min(images.len() - 1);
        Some(Self { images, index })
    }

    pub fn current(&self) -> &str {
        &self.images[self.index]
    }

    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.images.len())
    }

    pub fn next(&mut self) -> &str {
        self.index = (self.index + 1) % self.images.len();
        self.current()
    }

    pub fn prev(&mut self) -> &str {
        self.index = (self.index + self.images.len() - 1) % self.images.len();
        self.current()
    }
}

pub struct ReviewsView {
    api: Arc<dyn ReviewsApi>,
    limits: ImageLimits,
    reviews: Vec<Review>,
}

impl ReviewsView {
    pub fn new(api: Arc<dyn ReviewsApi>, limits: ImageLimits) -> Self {
        Self {
            api,
            limits,
            reviews: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> ViewResult<&[Review]> {
        self.reviews = self.api.list_reviews().await?;
        debug!("Loaded {} reviews", self.reviews.len());
        Ok(&self.reviews)
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn find(&self, review_id: u64) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == review_id)
    }

    pub fn visible<'a>(&'a self, filter: &'a ReviewFilter, session: &'a Session) -> impl Iterator<Item = &'a Review> {
        self.reviews
            .iter()
            .filter(move |r| filter.matches(r, session.email()))
    }

    /// Edit and delete are offered on the viewer's own reviews only
    pub fn can_edit(&self, session: &Session, review: &Review) -> bool {
        review.is_authored_by(session.email())
    }

    fn owned(&self, session: &Session, review_id: u64) -> ViewResult<&Review> {
        let review = self
            .find(review_id)
            .ok_or_else(|| ViewError::validation(format!("Review {} not found", review_id)))?;
        if !self.can_edit(session, review) {
            return Err(ViewError::validation("You can only change your own reviews"));
        }
        Ok(review)
    }

    pub async fn create(&mut self, session: &Session, draft: &ReviewDraft, images: &[ImageUpload]) -> ViewResult<&Review> {
        validate_draft(draft)?;
        self.limits.validate(0, images)?;

        let review = self.api.create_review(session.email(), draft, images).await?;
        info!("Created review {} for '{}'", review.id, review.movie_title);
        self.reviews.insert(0, review);
        Ok(&self.reviews[0])
    }

    /// Update a review. `delete_image_urls` names stored images to drop; entries that are
    /// not on the review are ignored.
    pub async fn edit(
        &mut self,
        session: &Session,
        review_id: u64,
        draft: &ReviewDraft,
        new_images: &[ImageUpload],
        delete_image_urls: &[String],
    ) -> ViewResult<&Review> {
        let existing = self.owned(session, review_id)?;
        validate_draft(draft)?;

        let deleted: Vec<String> = existing
            .image_urls
            .iter()
            .filter(|url| delete_image_urls.contains(url))
            .cloned()
            .collect();
        let kept = existing.image_urls.len() - deleted.len();
        self.limits.validate(kept, new_images)?;

        let updated = self
            .api
            .update_review(session.email(), review_id, draft, new_images, &deleted)
            .await?;
        info!("Updated review {}", review_id);

        let index = self
            .reviews
            .iter()
            .position(|r| r.id == review_id)
            .unwrap_or(self.reviews.len());
        if index == self.reviews.len() {
            self.reviews.push(updated);
        } else {
            self.reviews[index] = updated;
        }
        Ok(&self.reviews[index])
    }

    pub async fn delete(&mut self, session: &Session, review_id: u64) -> ViewResult<()> {
        self.owned(session, review_id)?;
        self.api.delete_review(session.email(), review_id).await?;
        self.reviews.retain(|r| r.id != review_id);
        info!("Deleted review {}", review_id);
        Ok(())
    }

    /// Lightbox over a review's images, starting at `start`
    pub fn open_viewer(&self, review_id: u64, start: usize) -> Option<Lightbox> {
        self.find(review_id)
            .and_then(|r| Lightbox::new(r.image_urls.clone(), start))
    }
}
