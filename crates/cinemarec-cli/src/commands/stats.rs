use super::context::AppContext;
use super::ui::{self, Spinner};
use crate::output::Output;
use crate::StatsCommands;
use cinemarec_core::{ChartSlice, DashboardTab, Route, StatisticsView};
use cinemarec_models::MovieSummary;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;

const BAR_WIDTH: usize = 30;
const TOP_SLICES: usize = 10;

pub async fn run_stats(cmd: StatsCommands, output: &Output) -> Result<()> {
    let route = Route::Dashboard(DashboardTab::Statistics);
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;
    let mut view = StatisticsView::new(services.statistics.clone());

    match cmd {
        StatsCommands::Summary => {
            let spinner = Spinner::start("Loading statistics...", output);
            let loaded = view.load_statistics(&session).await.map(|_| ());
            spinner.finish();
            loaded.map_err(|e| ctx.fail(e, &route))?;
            print_summary(&view, output);
        }
        StatsCommands::Watched => {
            view.load_watched(&session).await.map_err(|e| ctx.fail(e, &route))?;
            print_movies("Watched movies", view.watched(), output);
        }
        StatsCommands::Browse { query, pages } => {
            // Watched flags in the results come from the watched list
            view.load_watched(&session).await.map_err(|e| ctx.fail(e, &route))?;

            let query = query.unwrap_or_default();
            let spinner = Spinner::start("Searching movies...", output);
            let mut loaded = view.search(&session, &query).await;
            for page in 1..pages.max(1) {
                if view.browser().is_exhausted() {
                    break;
                }
                spinner.set_message(format!("Loading page {}...", page + 1));
                loaded = view.load_more(&session).await;
                if loaded.is_err() {
                    break;
                }
            }
            spinner.finish();
            loaded.map_err(|e| ctx.fail(e, &route))?;

            let title = if query.trim().is_empty() {
                "Popular movies".to_string()
            } else {
                format!("Movies matching '{}'", query.trim())
            };
            print_movies(&title, view.browser().items(), output);
            if view.browser().is_exhausted() {
                output.info("No more results");
            }
        }
        StatsCommands::Movie { movie_id } => {
            view.load_watched(&session).await.map_err(|e| ctx.fail(e, &route))?;
            let overlay = view
                .open_movie(&session, movie_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;

            if !output.is_human() {
                output.json(&json!({
                    "details": overlay.details,
                    "posterUrl": overlay.poster_url,
                    "watched": overlay.watched,
                }));
                return Ok(());
            }

            let details = &overlay.details;
            ui::section(&details.title, output);
            output.println(format!(
                "Rating: {}   Watched: {}",
                ui::rating(details.vote_average),
                ui::check_mark(overlay.watched)
            ));
            if let Some(date) = &details.release_date {
                output.println(format!("Released: {}", date));
            }
            if let Some(country) = &details.country {
                output.println(format!("Country: {}", country));
            }
            if !details.genres.is_empty() {
                output.println(format!("Genres: {}", details.genres.join(", ")));
            }
            if !details.directors.is_empty() {
                output.println(format!("Directed by: {}", details.directors.join(", ")));
            }
            if !details.actors.is_empty() {
                output.println(format!("Starring: {}", details.actors.join(", ")));
            }
            if let Some(overview) = &details.overview {
                output.println(overview);
            }
            output.println(format!("Poster: {}", overlay.poster_url));
            view.close_movie();
        }
        StatsCommands::Mark { movie_id } => {
            view.mark_watched(&session, movie_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Marked movie {} watched", movie_id));
            refreshed_total(&mut view, output).await;
        }
        StatsCommands::Unmark { movie_id } => {
            view.unmark_watched(&session, movie_id)
                .await
                .map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Removed movie {} from your watched list", movie_id));
            refreshed_total(&mut view, output).await;
        }
    }
    Ok(())
}

/// Wait for the background statistics refetch so the new total can be shown
async fn refreshed_total(view: &mut StatisticsView, output: &Output) {
    view.settle().await;
    if let Some(stats) = view.statistics() {
        output.info(format!("Total watched: {}", stats.total_watched));
    }
}

fn slices_json(slices: &[ChartSlice]) -> serde_json::Value {
    json!(slices
        .iter()
        .map(|s| json!({ "label": s.label, "count": s.count, "percent": s.percent }))
        .collect::<Vec<_>>())
}

fn print_chart(title: &str, slices: &[ChartSlice], output: &Output) {
    ui::section(title, output);
    if slices.is_empty() {
        output.println("  (no data)");
        return;
    }
    let width = slices
        .iter()
        .take(TOP_SLICES)
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0);
    for slice in slices.iter().take(TOP_SLICES) {
        output.println(format!(
            "  {:<width$}  {} {:>5.1}% ({})",
            slice.label,
            ui::bar(slice.percent, BAR_WIDTH),
            slice.percent,
            slice.count,
            width = width
        ));
    }
}

fn print_summary(view: &StatisticsView, output: &Output) {
    let Some(charts) = view.charts() else {
        output.warn("No statistics available");
        return;
    };

    if !output.is_human() {
        output.json(&json!({
            "totalWatched": charts.total_watched,
            "genres": slices_json(&charts.genres),
            "actors": slices_json(&charts.actors),
            "directors": slices_json(&charts.directors),
            "countries": slices_json(&charts.countries),
            "analysis": charts.analysis,
        }));
        return;
    }

    output.println(format!("Total watched: {}", charts.total_watched));
    print_chart("Genres", &charts.genres, output);
    print_chart("Actors", &charts.actors, output);
    print_chart("Directors", &charts.directors, output);
    print_chart("Countries", &charts.countries, output);
    if let Some(analysis) = &charts.analysis {
        ui::section("Your taste", output);
        output.println(analysis);
    }
}

fn print_movies(title: &str, movies: &[MovieSummary], output: &Output) {
    if !output.is_human() {
        output.json(&json!({ "title": title, "movies": movies }));
        return;
    }

    ui::section(title, output);
    if movies.is_empty() {
        output.println("  (none)");
        return;
    }
    let mut table = ui::table(&["ID", "Title", "Rating", "Released", "Watched"]);
    for movie in movies {
        table.add_row(vec![
            Cell::new(movie.movie_id),
            Cell::new(&movie.title),
            Cell::new(ui::rating(movie.rating)),
            Cell::new(movie.release_date.as_deref().unwrap_or("-")),
            Cell::new(ui::check_mark(movie.watched)),
        ]);
    }
    output.println(table.to_string());
}
