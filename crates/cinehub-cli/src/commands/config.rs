use super::{load_config, load_credentials};
use crate::output::Output;
use crate::ConfigCommands;
use cinema_config::{Config, PathManager};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&paths, full, output),
        ConfigCommands::Init { force, tmdb_api_key } => init_config(&paths, force, tmdb_api_key, output),
    }
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let config = load_config(paths)?;
    let credentials = load_credentials(paths)?;
    let api_key = credentials
        .tmdb_api_key()
        .map(|key| if full { key } else { mask_string(&key) });

    if !output.is_human() {
        output.data(&json!({
            "configFile": config_file.display().to_string(),
            "configFileExists": config_file.exists(),
            "snapshotDir": paths.snapshot_dir().display().to_string(),
            "tmdbApiKey": api_key,
            "config": config,
        }));
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "No configuration file at {}; showing defaults. Run 'cinehub config init' to create one.",
            config_file.display()
        ));
    }

    let mut files = section("Files");
    files.add_row(vec![Cell::new("Config File"), Cell::new(config_file.display())]);
    files.add_row(vec![Cell::new("Snapshots"), Cell::new(paths.snapshot_dir().display())]);
    output.table(files);

    let mut sources = section("Sources");
    sources.add_row(vec![Cell::new("Enabled"), Cell::new(config.sources.enabled.join(", "))]);
    sources.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{} seconds", config.fetch.timeout_secs))]);
    sources.add_row(vec![
        Cell::new("Detail Page Delay"),
        Cell::new(format!("{} ms", config.fetch.detail_delay_ms)),
    ]);
    sources.add_row(vec![Cell::new("User Agent"), Cell::new(&config.fetch.user_agent)]);
    output.table(sources);

    let mut enrichment = section("Enrichment (TMDB)");
    enrichment.add_row(vec![Cell::new("Enabled"), Cell::new(check_mark(config.enrichment.enabled))]);
    enrichment.add_row(vec![
        Cell::new("API Key"),
        Cell::new(api_key.unwrap_or_else(|| "<not set>".bright_black().to_string())),
    ]);
    enrichment.add_row(vec![Cell::new("Delay"), Cell::new(format!("{} ms", config.enrichment.delay_ms))]);
    enrichment.add_row(vec![Cell::new("Poster Size"), Cell::new(&config.enrichment.poster_size)]);
    enrichment.add_row(vec![
        Cell::new("Language"),
        Cell::new(config.enrichment.language.as_deref().unwrap_or("<default>")),
    ]);
    output.table(enrichment);

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is invalid: {}", e));
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, tmdb_api_key: Option<String>, output: &Output) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create {}: {}", paths.config_dir().display(), e))?;

    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
    } else {
        Config::default()
            .save_to_file(&config_file)
            .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
        output.success(format!("Wrote default configuration to {}", config_file.display()));
    }

    if let Some(key) = tmdb_api_key {
        let mut credentials = load_credentials(paths)?;
        credentials.set_tmdb_api_key(key.trim().to_string());
        credentials
            .save()
            .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
        output.success(format!("Stored TMDB API key in {}", paths.credentials_file().display()));
    }

    Ok(())
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn check_mark(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
