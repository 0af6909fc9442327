//! Thin binary entry point: parses the CLI surface the core leaves
//! unspecified and wires the pluggable ports — storage, model
//! transport, terminal UI — into a running [`AgentLoop`].

mod cli;
mod http_transport;
mod terminal_ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use kestrel_core::index::WorkspaceIndexer;
use kestrel_core::model::session::Session;
use kestrel_core::path_guard::PathGuard;
use kestrel_core::ports::model_transport::ModelTransport;
use kestrel_core::ports::ui::Ui;
use kestrel_core::storage::{JsonFileStorage, StoragePort};
use kestrel_core::tools::storage_helpers::{load_session, persist_workspace_index};
use kestrel_core::tools::build_registry;
use kestrel_core::{AgentLoop, KestrelConfig};

use cli::{Cli, Commands};
use http_transport::HttpModelTransport;
use terminal_ui::TerminalUi;

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn project_name(path: &Path) -> String {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("project").to_string()
}

fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
    let path = path.unwrap_or(std::env::current_dir()?);
    path.canonicalize().with_context(|| format!("project path does not exist: {}", path.display()))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn open_storage(workspace: &Path, config: &KestrelConfig) -> Result<Arc<dyn StoragePort>> {
    match &config.storage.path {
        Some(rel) => {
            let storage = JsonFileStorage::open(workspace.join(rel))
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            Ok(Arc::new(storage))
        }
        None => Ok(Arc::new(kestrel_core::storage::InMemoryStorage::new())),
    }
}

async fn cmd_init(path: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_path(path)?;
    let config_dir = workspace.join(".kestrel");
    std::fs::create_dir_all(&config_dir)?;
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        println!("{} already exists; leaving it untouched", config_path.display());
        return Ok(());
    }
    let toml = toml::to_string_pretty(&KestrelConfig::default())?;
    std::fs::write(&config_path, toml)?;
    println!("wrote {}", config_path.display());
    Ok(())
}

async fn cmd_index(path: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_path(path)?;
    let config = KestrelConfig::load_from_workspace(&workspace)?;
    let storage = open_storage(&workspace, &config).await?;

    let indexer = WorkspaceIndexer::new(&workspace);
    let index = indexer.index_workspace().map_err(|e| anyhow::anyhow!(e.message().to_string()))?;
    let file_count = index.contents.len();
    persist_workspace_index(storage.as_ref(), &index, now_secs()).await;
    println!("indexed {file_count} files under {}", workspace.display());
    Ok(())
}

async fn cmd_start(path: Option<PathBuf>, auto_apply: bool, model: Option<String>) -> Result<()> {
    let workspace = resolve_path(path)?;
    let mut config = KestrelConfig::load_from_workspace(&workspace)?;
    if auto_apply {
        config.agent.auto_apply = true;
    }
    if let Some(model) = model {
        config.model.name = model;
    }

    let storage = open_storage(&workspace, &config).await?;
    let path_guard = PathGuard::new(&workspace);
    let registry = Arc::new(build_registry());

    let base_url = std::env::var("KESTREL_MODEL_BASE_URL").unwrap_or_else(|_| "http://localhost:11434/v1".to_string());
    let transport: Arc<dyn ModelTransport> =
        Arc::new(HttpModelTransport::new(base_url, config.model.name.clone(), config.model.context_window_size));
    let ui: Arc<dyn Ui> = Arc::new(TerminalUi);

    let project = project_name(&workspace);
    let session = match storage.latest_session_by_project(&project).await.ok().flatten() {
        Some(id) => load_session(storage.as_ref(), &id).await.unwrap_or_else(|| Session::new(id, &project, now_secs())),
        None => Session::new(uuid::Uuid::new_v4().to_string(), &project, now_secs()),
    };

    println!("kestrel — {} ({})", project, workspace.display());
    println!("model: {} via {}", config.model.name, std::env::var("KESTREL_MODEL_BASE_URL").unwrap_or_else(|_| "http://localhost:11434/v1".to_string()));
    println!("type a request, or 'exit' to quit\n");

    let mut agent = AgentLoop::new(session, registry, storage, transport, ui, path_guard, config.loop_config());

    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        agent.submit(line).await.map_err(|e| anyhow::anyhow!(e.message().to_string()))?;
        if let Err(e) = agent.run().await {
            eprintln!("error: {}", e.message());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { path, auto_apply, model } => cmd_start(path, auto_apply, model).await,
        Commands::Init { path } => cmd_init(path).await,
        Commands::Index { path } => cmd_index(path).await,
    };

    if let Err(err) = &result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}
