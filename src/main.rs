use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use codeprompt::archive::ArchiveStore;
use codeprompt::auth::{GithubOauth, MemorySessionStore};
use codeprompt::chat::{ChatClient, ChatHistory};
use codeprompt::envfile::EnvEditor;
use codeprompt::http::{self, AppState};
use codeprompt::store::{GroupStore, SettingsStore, TemplateStore};
use codeprompt::Config;

/// Codeprompt - web workbench that turns uploaded codebases into LLM prompt
/// context
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Listen port (overrides config and the PORT env var)
    #[arg(long)]
    port: Option<u16>,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let port = cli.port.unwrap_or(config.server.port);

    let state = build_state(config.clone()).await?;

    log::info!("Codeprompt v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "AI: {}",
        if state.ai.enabled() {
            "Enabled"
        } else {
            "Disabled (set OPENROUTER_API_KEY)"
        }
    );
    log::info!(
        "Max upload: {}MB",
        state.settings.app_settings().max_file_size_mb
    );

    http::serve(state, port).await?;
    Ok(())
}

/// Create the stores, seed the default documents and wire up shared state.
async fn build_state(config: Config) -> Result<AppState> {
    let archives = ArchiveStore::new(&config.storage.uploads_dir)?;
    let groups = GroupStore::new(&config.storage.groups_dir)?;
    let templates = TemplateStore::new(&config.storage.templates_dir)?;
    let settings = SettingsStore::new(&config.storage.config_dir)?;

    templates.seed()?;
    settings.seed(config.server.default_max_upload_mb)?;

    let history = ChatHistory::new(&config.storage.db_path);
    history.ensure_schema().await?;

    let ai = ChatClient::new(&config.ai);
    let oauth = GithubOauth::new(&config.github, config.oauth_redirect_url());
    if !oauth.configured() {
        log::warn!("GitHub OAuth disabled (set GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET)");
    }

    let env_editor = EnvEditor::new(&config.storage.env_file);

    Ok(AppState {
        config: Arc::new(config),
        archives: Arc::new(archives),
        groups: Arc::new(groups),
        templates: Arc::new(templates),
        settings: Arc::new(settings),
        env_editor: Arc::new(env_editor),
        ai: Arc::new(ai),
        history: Arc::new(history),
        sessions: Arc::new(MemorySessionStore::new()),
        oauth: Arc::new(oauth),
        http: reqwest::Client::new(),
    })
}
