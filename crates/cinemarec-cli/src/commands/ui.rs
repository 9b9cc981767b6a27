use crate::output::Output;
use cinemarec_models::ImageUpload;
use color_eyre::eyre::eyre;
use comfy_table::{Attribute, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Spinner shown while a request is in flight. Falls back to structured logging when
/// not attached to a terminal.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(message: impl Into<String>, output: &Output) -> Self {
        let message = message.into();
        if !is_interactive() || !output.is_human() || output.is_quiet() {
            tracing::info!(operation = "progress", message = %message, "Progress update");
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        match &self.bar {
            Some(bar) => bar.set_message(message),
            None => tracing::info!(operation = "progress", message = %message, "Progress update"),
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Styled heading; human output only
pub fn section(title: &str, output: &Output) {
    if !output.is_human() {
        return;
    }
    output.println("");
    output.println(format!("{}", title.bright_cyan().bold()));
}

/// Horizontal bar for a percentage, `width` cells at 100%
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn check_mark(on: bool) -> String {
    if on {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

pub fn rating(value: Option<f64>) -> String {
    value.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())
}

/// Read an image file for upload; the file name is kept for the content type
pub async fn read_image(path: &Path) -> color_eyre::Result<ImageUpload> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre!("Invalid image path: {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
    Ok(ImageUpload::new(file_name, bytes))
}
