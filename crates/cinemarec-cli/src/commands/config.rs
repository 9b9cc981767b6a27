use super::prompts;
use super::ui;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use cinemarec_config::{CatalogProvider, Config, CredentialStore, PathManager};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&paths, full, output),
        ConfigCommands::Init { force } => init_config(&paths, force, output),
        ConfigCommands::SetEndpoint { service, url } => {
            let mut config = load(&paths)?;
            config.endpoints.set(&service, url).map_err(|e| eyre!("{}", e))?;
            save(&paths, &config)?;
            output.success(format!("Endpoint for {} updated", service));
            Ok(())
        }
        ConfigCommands::SetCatalog { provider } => {
            let provider = parse_provider(&provider)?;
            let mut config = load(&paths)?;
            config.catalog.provider = provider;
            save(&paths, &config)?;
            output.success(format!("Catalog provider set to {}", provider_name(provider)));

            if provider == CatalogProvider::Tmdb && load_credentials(&paths)?.get_tmdb_api_token().is_none() {
                output.warn("No TMDB token stored yet. Run `cinemarec config set-tmdb-token`.");
            }
            Ok(())
        }
        ConfigCommands::SetTmdbToken { token } => {
            let token = match token {
                Some(token) => token,
                None => prompts::prompt_password("TMDB API read token")?,
            };
            let token = token.trim();
            if token.is_empty() {
                return Err(eyre!("Token cannot be empty"));
            }
            let mut credentials = load_credentials(&paths)?;
            credentials.set_tmdb_api_token(token.to_string());
            credentials
                .save()
                .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
            output.success("TMDB token saved");
            Ok(())
        }
    }
}

/// Load without validating, so a broken file can still be repaired
fn load(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn save(paths: &PathManager, config: &Config) -> Result<()> {
    config.validate().map_err(|e| eyre!("Invalid configuration: {}", e))?;
    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    Ok(credentials)
}

fn parse_provider(value: &str) -> Result<CatalogProvider> {
    match value.trim().to_lowercase().as_str() {
        "proxy" => Ok(CatalogProvider::Proxy),
        "tmdb" => Ok(CatalogProvider::Tmdb),
        other => Err(eyre!("Unknown catalog provider '{}' (expected proxy or tmdb)", other)),
    }
}

fn provider_name(provider: CatalogProvider) -> &'static str {
    match provider {
        CatalogProvider::Proxy => "proxy",
        CatalogProvider::Tmdb => "tmdb",
    }
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
        return Ok(());
    }
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create {}: {}", paths.config_dir().display(), e))?;
    save(paths, &Config::default())?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let config = load(paths)?;
    let credentials = load_credentials(paths)?;
    let token = credentials.get_tmdb_api_token().map(|t| {
        if full {
            t.clone()
        } else {
            mask_string(t)
        }
    });

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if !config_file.exists() {
                output.info(format!(
                    "No configuration file at {}; showing defaults. Run `cinemarec config init` to create one.",
                    config_file.display()
                ));
            }

            ui::section("Endpoints", output);
            let mut endpoints = ui::table(&["Service", "URL"]);
            for (service, url) in config.endpoints.entries() {
                endpoints.add_row(vec![Cell::new(service), Cell::new(url)]);
            }
            output.println(endpoints.to_string());

            ui::section("Settings", output);
            let mut settings = ui::table(&["Setting", "Value"]);
            let timeout = config
                .http
                .timeout_seconds
                .map(|s| format!("{}s", s))
                .unwrap_or_else(|| "default".to_string());
            let rows = [
                ("Catalog provider", provider_name(config.catalog.provider).to_string()),
                ("Catalog page size", config.catalog.page_size.to_string()),
                ("TMDB token", token.unwrap_or_else(|| "<not set>".to_string())),
                ("HTTP timeout", timeout),
                ("Max review images", config.limits.max_review_images.to_string()),
                ("Max image size", format!("{} bytes", config.limits.max_image_bytes)),
                ("Max total image size", format!("{} bytes", config.limits.max_total_image_bytes)),
                (
                    "Minimum selections",
                    format!(
                        "genres {}, actors {}, directors {}, movies {}",
                        config.preferences.min_genres,
                        config.preferences.min_actors,
                        config.preferences.min_directors,
                        config.preferences.min_movies
                    ),
                ),
                ("Quiz advance delay", format!("{} ms", config.timing.quiz_advance_ms)),
                (
                    "Refresh polling",
                    format!(
                        "{} attempts from {} ms",
                        config.timing.refresh_max_attempts, config.timing.refresh_initial_backoff_ms
                    ),
                ),
            ];
            for (name, value) in rows {
                settings.add_row(vec![Cell::new(name), Cell::new(value)]);
            }
            output.println(settings.to_string());
            output.println(format!("Config file: {}", config_file.display()));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "configFile": config_file.display().to_string(),
                "exists": config_file.exists(),
                "config": config,
                "tmdbToken": token,
            }));
        }
    }
    Ok(())
}
