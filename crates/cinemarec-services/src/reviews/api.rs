use crate::error::{Result, ServiceError};
use crate::http::{join, send, send_json, with_bearer};
use crate::multipart::{into_form, FormField};
use cinemarec_models::{ImageUpload, Review, ReviewDraft};
use reqwest::Client;
use tracing::debug;

/// Multipart fields for a create or edit
pub fn review_fields(email: &str, draft: &ReviewDraft, images: &[ImageUpload]) -> Vec<FormField> {
    let mut fields = vec![
        FormField::text("userEmail", email),
        FormField::text("movieTitle", &draft.movie_title),
        FormField::text("rating", draft.rating),
        FormField::text("text", &draft.text),
    ];
    fields.extend(images.iter().map(|image| FormField::file("images", image)));
    fields
}

pub async fn list_reviews(client: &Client, base_url: &str, token: Option<&str>) -> Result<Vec<Review>> {
    let url = join(base_url, "/reviews");
    debug!("Fetching reviews from {}", url);
    send_json(with_bearer(client.get(&url), token), "fetch reviews").await
}

pub async fn create_review(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    draft: &ReviewDraft,
    images: &[ImageUpload],
) -> Result<Review> {
    let url = join(base_url, "/reviews");
    let form = into_form(review_fields(email, draft, images))?;
    debug!("Creating review of '{}' with {} images", draft.movie_title, images.len());
    send_json(
        with_bearer(client.post(&url), token).query(&[("email", email)]).multipart(form),
        "create review",
    )
    .await
}

pub async fn update_review(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    review_id: u64,
    draft: &ReviewDraft,
    images: &[ImageUpload],
    deleted_image_urls: &[String],
) -> Result<Review> {
    let url = join(base_url, &format!("/reviews/{}", review_id));
    let deleted = serde_json::to_string(deleted_image_urls).map_err(|e| ServiceError::decode("update review", e))?;
    let form = into_form(review_fields(email, draft, images))?;
    debug!(
        "Updating review {} ({} new images, {} removed)",
        review_id,
        images.len(),
        deleted_image_urls.len()
    );
    send_json(
        with_bearer(client.put(&url), token)
            .query(&[("email", email), ("deletedImageUrls", deleted.as_str())])
            .multipart(form),
        "update review",
    )
    .await
}

pub async fn delete_review(client: &Client, base_url: &str, token: Option<&str>, email: &str, review_id: u64) -> Result<()> {
    let url = join(base_url, &format!("/reviews/{}", review_id));
    send(with_bearer(client.delete(&url), token).query(&[("email", email)]), "delete review").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_fields() {
        let draft = ReviewDraft {
            movie_title: "Heat".to_string(),
            rating: 9,
            text: "Tense.".to_string(),
        };
        let images = vec![ImageUpload::new("a.png", vec![1]), ImageUpload::new("b.jpg", vec![2])];
        let fields = review_fields("ann@x.io", &draft, &images);

        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["userEmail", "movieTitle", "rating", "text", "images", "images"]);
        assert_eq!(fields[2], FormField::text("rating", "9"));
    }
}
