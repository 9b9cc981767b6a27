use super::context::AppContext;
use super::prompts;
use super::ui::{self, Spinner};
use crate::output::Output;
use crate::ReviewsCommands;
use cinemarec_core::reviews::{MAX_REVIEW_RATING, MIN_REVIEW_RATING};
use cinemarec_core::{DashboardTab, ImageLimits, Lightbox, ReviewFilter, ReviewsView, Route, Session};
use cinemarec_models::{ImageUpload, Review, ReviewDraft};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 60;

pub async fn run_reviews(cmd: ReviewsCommands, output: &Output) -> Result<()> {
    let route = Route::Dashboard(DashboardTab::Reviews);
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;
    let mut view = ReviewsView::new(services.reviews.clone(), ImageLimits::from(&ctx.config.limits));

    let spinner = Spinner::start("Loading reviews...", output);
    let loaded = view.load().await.map(|_| ());
    spinner.finish();
    loaded.map_err(|e| ctx.fail(e, &route))?;

    match cmd {
        ReviewsCommands::List { title, mine } => {
            let filter = ReviewFilter {
                title_query: title.unwrap_or_default(),
                mine_only: mine,
            };
            let visible: Vec<&Review> = view.visible(&filter, &session).collect();
            print_reviews(&view, &session, &visible, output);
        }
        ReviewsCommands::Show { review_id } => {
            let review = view
                .find(review_id)
                .ok_or_else(|| eyre!("Review {} not found", review_id))?;
            show_review(&view, &session, review, output)?;
        }
        ReviewsCommands::Create {
            title,
            rating,
            text,
            images,
        } => {
            let draft = read_draft(None, title, rating, text)?;
            let uploads = read_images(&images).await?;
            let spinner = Spinner::start("Publishing review...", output);
            let created = view.create(&session, &draft, &uploads).await.map(|r| r.id);
            spinner.finish();
            let id = created.map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Published review {} for '{}'", id, draft.movie_title));
        }
        ReviewsCommands::Edit {
            review_id,
            title,
            rating,
            text,
            images,
            delete_images,
        } => {
            let existing = view
                .find(review_id)
                .ok_or_else(|| eyre!("Review {} not found", review_id))?;
            if !view.can_edit(&session, existing) {
                return Err(eyre!("You can only edit your own reviews"));
            }
            let draft = read_draft(Some(existing), title, rating, text)?;
            let uploads = read_images(&images).await?;
            let spinner = Spinner::start("Saving review...", output);
            let updated = view
                .edit(&session, review_id, &draft, &uploads, &delete_images)
                .await
                .map(|r| r.image_urls.len());
            spinner.finish();
            let image_count = updated.map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Updated review {} ({} images)", review_id, image_count));
        }
        ReviewsCommands::Delete { review_id, yes } => {
            let review = view
                .find(review_id)
                .ok_or_else(|| eyre!("Review {} not found", review_id))?;
            if !view.can_edit(&session, review) {
                return Err(eyre!("You can only delete your own reviews"));
            }
            let prompt = format!("Delete your review of '{}'?", review.movie_title);
            if !yes && !prompts::prompt_yes_no(&prompt, Some(false))? {
                output.info("Cancelled");
                return Ok(());
            }
            view.delete(&session, review_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Deleted review {}", review_id));
        }
    }
    Ok(())
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(ui::read_image(path).await?);
    }
    Ok(uploads)
}

/// Fill the draft from flags, prompting for anything missing. When editing, the
/// existing values are the defaults.
fn read_draft(
    existing: Option<&Review>,
    title: Option<String>,
    rating: Option<u8>,
    text: Option<String>,
) -> Result<ReviewDraft> {
    let movie_title = match title {
        Some(title) => title,
        None => prompts::prompt_required("Movie title", existing.map(|r| r.movie_title.as_str()))?,
    };
    let rating = match rating {
        Some(rating) => rating,
        None => {
            let prompt = format!("Rating ({}-{})", MIN_REVIEW_RATING, MAX_REVIEW_RATING);
            let default = existing.map(|r| u32::from(r.rating));
            let value = prompts::prompt_number(
                &prompt,
                default,
                u32::from(MIN_REVIEW_RATING),
                u32::from(MAX_REVIEW_RATING),
            )?;
            u8::try_from(value).map_err(|_| eyre!("Rating out of range"))?
        }
    };
    let text = match text {
        Some(text) => text,
        None => prompts::prompt_required("Review", existing.map(|r| r.text.as_str()))?,
    };
    Ok(ReviewDraft {
        movie_title,
        rating,
        text,
    })
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

fn print_reviews(view: &ReviewsView, session: &Session, reviews: &[&Review], output: &Output) {
    if !output.is_human() {
        output.json(&json!({ "reviews": reviews }));
        return;
    }

    if reviews.is_empty() {
        output.info("No reviews match");
        return;
    }
    let mut table = ui::table(&["ID", "Movie", "Rating", "Author", "Images", "Review"]);
    for review in reviews {
        let author = if view.can_edit(session, review) {
            "you".to_string()
        } else {
            review.user_email.clone()
        };
        table.add_row(vec![
            Cell::new(review.id),
            Cell::new(&review.movie_title),
            Cell::new(format!("{}/{}", review.rating, MAX_REVIEW_RATING)),
            Cell::new(author),
            Cell::new(review.image_urls.len()),
            Cell::new(preview(&review.text)),
        ]);
    }
    output.println(table.to_string());
}

const VIEW_NEXT: &str = "Next image";
const VIEW_PREV: &str = "Previous image";
const VIEW_CLOSE: &str = "Close";

fn show_review(view: &ReviewsView, session: &Session, review: &Review, output: &Output) -> Result<()> {
    if !output.is_human() {
        output.json(&json!({ "review": review, "editable": view.can_edit(session, review) }));
        return Ok(());
    }

    ui::section(&format!("{} ({}/{})", review.movie_title, review.rating, MAX_REVIEW_RATING), output);
    output.println(format!("By {}", review.user_email));
    if let Some(created) = &review.created_at {
        output.println(format!("Posted {}", created));
    }
    output.println("");
    output.println(&review.text);

    let Some(mut lightbox) = view.open_viewer(review.id, 0) else {
        return Ok(());
    };
    if !ui::is_interactive() {
        for url in &review.image_urls {
            output.println(format!("Image: {}", url));
        }
        return Ok(());
    }
    browse_images(&mut lightbox, output)
}

fn browse_images(lightbox: &mut Lightbox, output: &Output) -> Result<()> {
    let actions = [VIEW_NEXT, VIEW_PREV, VIEW_CLOSE];
    loop {
        let (position, total) = lightbox.position();
        output.println(format!("Image {}/{}: {}", position, total, lightbox.current()));
        match actions[prompts::prompt_select("Viewer", &actions, 0)?] {
            VIEW_NEXT => {
                lightbox.next();
            }
            VIEW_PREV => {
                lightbox.prev();
            }
            _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(PREVIEW_CHARS + 5);
        let shown = preview(&long);
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_draft_from_flags_skips_prompts() {
        let draft = read_draft(None, Some("Heat".into()), Some(9), Some("Tense".into())).unwrap();
        assert_eq!(draft.movie_title, "Heat");
        assert_eq!(draft.rating, 9);
        assert_eq!(draft.text, "Tense");
    }
}
