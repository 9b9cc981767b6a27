use super::context::AppContext;
use super::prompts;
use super::ui::{self, Spinner};
use crate::output::Output;
use crate::PreferencesCommands;
use cinemarec_core::{DashboardTab, ListMode, PreferencesEditor, Route, Session};
use cinemarec_models::TasteCategory;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;

pub async fn run_preferences(cmd: PreferencesCommands, output: &Output) -> Result<()> {
    let route = Route::Dashboard(DashboardTab::Preferences);
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;

    let spinner = Spinner::start("Loading catalog and profile...", output);
    let opened = PreferencesEditor::open(
        &session,
        services.catalog.clone(),
        services.preferences.clone(),
        ctx.config.preferences.clone(),
        ctx.config.catalog.page_size,
    )
    .await;
    spinner.finish();
    let mut editor = opened.map_err(|e| ctx.fail(e, &route))?;

    match cmd {
        PreferencesCommands::Show => {
            show_profile(&editor, output);
            Ok(())
        }
        PreferencesCommands::Edit => {
            edit_profile(&mut editor, &session, output)
                .await
                .map_err(|report| ctx.recover(report, &route))?;
            let saved = editor
                .save(&session, |profile| {
                    tracing::debug!("Profile saved with min rating {}", profile.min_rating);
                })
                .await;
            match saved {
                Ok(_) => {
                    output.success("Preferences saved. Run `cinemarec recommendations refresh` for new picks.");
                    Ok(())
                }
                Err(e) => Err(ctx.fail(e, &route)),
            }
        }
    }
}

fn show_profile(editor: &PreferencesEditor, output: &Output) {
    if !output.is_human() {
        let categories: serde_json::Map<String, serde_json::Value> = TasteCategory::ALL
            .iter()
            .map(|category| {
                let entries: Vec<_> = editor
                    .selected_entries(*category)
                    .into_iter()
                    .map(|e| json!({ "id": e.id, "name": e.label }))
                    .collect();
                (category.label().to_lowercase(), json!(entries))
            })
            .collect();
        output.json(&json!({
            "saved": editor.had_profile(),
            "minRating": editor.profile().min_rating,
            "favorites": categories,
        }));
        return;
    }

    if !editor.had_profile() {
        output.warn("No preferences saved yet. Run `cinemarec preferences edit` to get recommendations.");
        return;
    }

    let mut table = ui::table(&["Category", "Selected"]);
    for category in TasteCategory::ALL {
        let names: Vec<String> = editor
            .selected_entries(category)
            .into_iter()
            .map(|e| e.label)
            .collect();
        table.add_row(vec![Cell::new(category.label()), Cell::new(names.join(", "))]);
    }
    table.add_row(vec![
        Cell::new("Minimum rating"),
        Cell::new(format!("{:.1}", editor.profile().min_rating)),
    ]);
    output.println(table.to_string());
}

const ACTION_TOGGLE: &str = "Select items on this page";
const ACTION_NEXT: &str = "Next page";
const ACTION_PREV: &str = "Previous page";
const ACTION_SEARCH: &str = "Search";
const ACTION_CLEAR_SEARCH: &str = "Back to popular";
const ACTION_DONE: &str = "Done with this category";

async fn edit_category(editor: &mut PreferencesEditor, category: TasteCategory, output: &Output) -> Result<()> {
    // The first backend page may have filtered down to nothing
    editor.show_page(category, 0).await?;
    loop {
        let page = match editor.mode(category) {
            Some(ListMode::Popular { page }) => Some(*page),
            _ => None,
        };
        let selected = editor.profile().ids(category).len();
        let title = match (&page, editor.mode(category)) {
            (Some(page), _) => format!("{} (page {}, {} selected)", category.label(), page + 1, selected),
            (None, Some(ListMode::Search { query, .. })) => {
                format!("{} matching '{}' ({} selected)", category.label(), query, selected)
            }
            _ => category.label().to_string(),
        };
        ui::section(&title, output);

        let mut actions = vec![ACTION_TOGGLE];
        if let Some(page) = page {
            if editor.has_page(category, page + 1) {
                actions.push(ACTION_NEXT);
            }
            if page > 0 {
                actions.push(ACTION_PREV);
            }
        } else {
            actions.push(ACTION_CLEAR_SEARCH);
        }
        actions.extend([ACTION_SEARCH, ACTION_DONE]);

        match actions[prompts::prompt_select("Action", &actions, 0)?] {
            ACTION_TOGGLE => {
                let visible = editor.visible(category);
                if visible.is_empty() {
                    output.warn("Nothing to select here");
                    continue;
                }
                let labels: Vec<String> = visible
                    .iter()
                    .map(|e| match &e.detail {
                        Some(detail) => format!("{} ({})", e.label, detail),
                        None => e.label.clone(),
                    })
                    .collect();
                let checked: Vec<bool> = visible.iter().map(|e| editor.is_selected(category, e.id)).collect();
                let chosen = prompts::prompt_multi_select("Toggle with space, confirm with enter", &labels, &checked)?;
                for (index, entry) in visible.iter().enumerate() {
                    if chosen.contains(&index) != checked[index] {
                        editor.toggle(category, entry.id);
                    }
                }
            }
            ACTION_NEXT => {
                editor.show_page(category, page.unwrap_or(0) + 1).await?;
            }
            ACTION_PREV => {
                editor.show_page(category, page.unwrap_or(0).saturating_sub(1)).await?;
            }
            ACTION_SEARCH => {
                let query = prompts::prompt_string("Search", None)?;
                editor.search(category, &query).await?;
            }
            ACTION_CLEAR_SEARCH => {
                editor.show_page(category, 0).await?;
            }
            _ => return Ok(()),
        }
    }
}

async fn edit_profile(editor: &mut PreferencesEditor, session: &Session, output: &Output) -> Result<()> {
    output.info(format!("Editing preferences for {}", session.email()));
    loop {
        for category in TasteCategory::ALL {
            edit_category(editor, category, output).await?;
        }

        let rating = prompts::prompt_decimal("Minimum rating (0-10, steps of 0.5)", editor.profile().min_rating)?;
        let rating = editor.set_min_rating(rating);
        output.info(format!("Minimum rating set to {:.1}", rating));

        let shortfalls = editor.shortfalls();
        if shortfalls.is_empty() {
            return Ok(());
        }
        for shortfall in shortfalls {
            output.warn(format!(
                "{}: {} selected, at least {} needed",
                shortfall.category.label(),
                shortfall.selected,
                shortfall.required
            ));
        }
        if !prompts::prompt_yes_no("Keep editing?", Some(true))? {
            return Ok(());
        }
    }
}
