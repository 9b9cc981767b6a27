use super::context::AppContext;
use super::prompts;
use super::ui::{self, Spinner};
use crate::output::Output;
use cinemarec_core::{PlayerState, PlayerView, Route};
use cinemarec_models::MovieVideo;
use color_eyre::Result;
use serde_json::json;

pub async fn run_watch(movie_id: Option<u64>, email: Option<String>, output: &Output) -> Result<()> {
    let route = Route::Watch {
        movie_id: movie_id.unwrap_or_default(),
        email: email.clone(),
    };
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;
    let email = email.unwrap_or_else(|| session.email().to_string());

    let spinner = Spinner::start("Loading movie...", output);
    let opened = PlayerView::open(services.statistics.clone(), &ctx.config.timing, movie_id, Some(&email)).await;
    spinner.finish();
    let mut player = opened.map_err(|e| ctx.fail(e, &route))?;

    if !output.is_human() {
        output.json(&json!({
            "details": player.details(),
            "posterUrl": player.poster_url(),
            "videos": player.videos(),
            "selected": player.watch_url(),
        }));
        return Ok(());
    }

    print_details(&player, output);
    if player.state() == PlayerState::Empty {
        output.warn("No trailers available for this movie");
        return Ok(());
    }

    print_section("Trailers", &player.trailers(), output);
    print_section("Teasers", &player.teasers(), output);
    print_section("Clips and featurettes", &player.others(), output);

    player.settle().await;
    print_now_playing(&player, output);

    if !ui::is_interactive() {
        return Ok(());
    }
    let mut labels: Vec<String> = player
        .videos()
        .iter()
        .map(|v| format!("{} [{}]", v.name, v.video_type))
        .collect();
    labels.push("Close".to_string());
    loop {
        let choice = prompts::prompt_select("Play", &labels, labels.len() - 1)?;
        if choice >= player.videos().len() {
            return Ok(());
        }
        player.select(choice)?;
        player.settle().await;
        print_now_playing(&player, output);
    }
}

fn print_details(player: &PlayerView, output: &Output) {
    let details = player.details();
    ui::section(&details.title, output);
    let mut facts = vec![format!("Rating: {}", ui::rating(details.vote_average))];
    if let Some(date) = &details.release_date {
        facts.push(format!("Released: {}", date));
    }
    if let Some(runtime) = details.runtime {
        facts.push(format!("{} min", runtime));
    }
    output.println(facts.join("   "));
    if !details.genres.is_empty() {
        output.println(format!("Genres: {}", details.genres.join(", ")));
    }
    if let Some(overview) = &details.overview {
        output.println(overview);
    }
    output.println(format!("Poster: {}", player.poster_url()));
}

fn print_section(title: &str, videos: &[(usize, &MovieVideo)], output: &Output) {
    if videos.is_empty() {
        return;
    }
    ui::section(title, output);
    for (index, video) in videos {
        output.println(format!("  {}. {}", index + 1, video.name));
    }
}

fn print_now_playing(player: &PlayerView, output: &Output) {
    if let (Some(video), Some(url)) = (player.selected(), player.watch_url()) {
        output.info(format!("Now playing: {} ({})", video.name, url));
    }
}
