use super::context::AppContext;
use super::ui::{self, Spinner};
use crate::output::Output;
use crate::RecommendationsCommands;
use cinemarec_core::{Backoff, DashboardTab, RecommendationsState, RecommendationsView, Route};
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;

pub async fn run_recommendations(cmd: RecommendationsCommands, output: &Output) -> Result<()> {
    let route = Route::Dashboard(DashboardTab::Recommendations);
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;

    let mut view = RecommendationsView::new(
        services.preferences.clone(),
        services.recommendations.clone(),
        Backoff::from_timing(&ctx.config.timing),
    );

    let spinner = Spinner::start("Loading recommendations...", output);
    let loaded = view.load(&session).await.map(|_| ());
    spinner.finish();
    loaded.map_err(|e| ctx.fail(e, &route))?;

    if matches!(view.state(), RecommendationsState::Onboarding) {
        if output.is_human() {
            output.warn("Tell us what you like first: run `cinemarec preferences edit`");
        } else {
            output.json(&json!({ "onboarding": true, "groups": [] }));
        }
        return Ok(());
    }

    match cmd {
        RecommendationsCommands::List => {
            print_groups(&view, output);
        }
        RecommendationsCommands::Watched { movie_id } => {
            if view.find(movie_id).is_none() {
                output.warn(format!("Movie {} is not in your recommendations", movie_id));
                return Ok(());
            }
            view.mark_watched(&session, movie_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Marked movie {} watched", movie_id));
        }
        RecommendationsCommands::Refresh => {
            let spinner = Spinner::start("Generating new recommendations...", output);
            let refreshed = view.refresh(&session).await;
            spinner.finish();
            let outcome = refreshed.map_err(|e| ctx.fail(e, &route))?;
            if outcome.changed {
                output.success(format!("Recommendations updated after {} checks", outcome.attempts));
            } else {
                output.warn("The service has not produced a new list yet; showing the latest one");
            }
            print_groups(&view, output);
        }
        RecommendationsCommands::Details { movie_id } => {
            let overlay = view
                .open_details(&session, movie_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;

            if !output.is_human() {
                output.json(&json!({
                    "movie": overlay.card,
                    "details": overlay.details,
                    "error": overlay.error,
                }));
                return Ok(());
            }

            let card = &overlay.card;
            ui::section(&card.title, output);
            output.println(format!("Rating: {}   Watched: {}", ui::rating(card.rating), ui::check_mark(card.watched)));
            if !card.genres.is_empty() {
                output.println(format!("Genres: {}", card.genres.join(", ")));
            }
            if let Some(overview) = &card.overview {
                output.println(overview);
            }
            match (&overlay.details, &overlay.error) {
                (Some(details), _) => {
                    if let Some(runtime) = details.runtime {
                        output.println(format!("Runtime: {} min", runtime));
                    }
                    if let Some(date) = &details.release_date {
                        output.println(format!("Released: {}", date));
                    }
                    if !details.directors.is_empty() {
                        output.println(format!("Directed by: {}", details.directors.join(", ")));
                    }
                    if !details.actors.is_empty() {
                        output.println(format!("Starring: {}", details.actors.join(", ")));
                    }
                }
                (None, Some(error)) => output.warn(format!("Could not load extended details: {}", error)),
                (None, None) => {}
            }
            view.close_details();
        }
    }
    Ok(())
}

fn print_groups(view: &RecommendationsView, output: &Output) {
    if !output.is_human() {
        let groups: Vec<_> = view
            .groups()
            .iter()
            .map(|g| json!({ "category": g.category.map_or("other", |c| c.label()), "items": g.items }))
            .collect();
        output.json(&json!({ "onboarding": false, "groups": groups }));
        return;
    }

    if view.groups().is_empty() {
        output.info("No recommendations yet. Run `cinemarec recommendations refresh`.");
        return;
    }

    for group in view.groups() {
        let heading = match group.category {
            Some(category) => format!("Because of your favorite {}", category.label().to_lowercase()),
            None => "More picks for you".to_string(),
        };
        ui::section(&heading, output);
        let mut table = ui::table(&["ID", "Title", "Rating", "Genres", "Watched"]);
        for item in &group.items {
            table.add_row(vec![
                Cell::new(item.movie_id),
                Cell::new(&item.title),
                Cell::new(ui::rating(item.rating)),
                Cell::new(item.genres.join(", ")),
                Cell::new(ui::check_mark(item.watched)),
            ]);
        }
        output.println(table.to_string());
    }
}
