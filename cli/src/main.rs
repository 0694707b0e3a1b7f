//! CLI entrypoint for parley
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use parley_application::{
    AuthError, AuthPort, AuthStatus, ChatTransport, ConversationLogger, HistoryApi,
    ReconciliationEngine,
};
use parley_infrastructure::{
    ApiClient, ConfigLoader, ConnectionManager, ConnectionSettings, CookieJar, FileConfig,
    HttpAuthClient, HttpHistoryClient, JsonlConversationLogger, Severity,
};
use parley_presentation::{ChatRepl, Cli, ReplExit};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOGIN_ATTEMPTS: usize = 3;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("config: {}", e))?
    };
    apply_overrides(&mut config, &cli);

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("config error: {}", issue.message),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
    if issues.iter().any(|i| i.severity == Severity::Error) {
        bail!("invalid configuration");
    }

    info!("Starting parley against {}", config.server.api_base_url);

    let jar = Arc::new(CookieJar::default());
    let api = Arc::new(ApiClient::new(&config.server.api_base_url, Arc::clone(&jar))?);
    let auth = HttpAuthClient::new(Arc::clone(&api));
    // Only the login prompts read stdin directly; the REPL has its own editor.
    let identity = {
        let mut stdin = BufReader::new(tokio::io::stdin());
        authenticate(&auth, &cli, &mut stdin).await?
    };

    let settings = ConnectionSettings::default()
        .with_reconnect_interval(config.connection.reconnect_interval())
        .with_cookies(jar);
    let (connection, transport_events) = ConnectionManager::open(&config.server.ws_url, settings)?;
    let transport: Arc<dyn ChatTransport> = connection;
    let history: Arc<dyn HistoryApi> = Arc::new(HttpHistoryClient::new(Arc::clone(&api)));

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let mut engine = ReconciliationEngine::new(history, transport, identity, ui_tx)
        .with_config(config.engine_config());
    if let Some(path) = &config.logging.conversation_log {
        let logger = JsonlConversationLogger::open(path)
            .with_context(|| format!("opening conversation log {}", path))?;
        engine = engine.with_conversation_logger(Arc::new(logger) as Arc<dyn ConversationLogger>);
    }
    engine.start()?;

    let handle = engine.handle();
    let engine_task = tokio::spawn(engine.run(transport_events));

    let exit = ChatRepl::new(handle.clone(), ui_rx).run().await?;

    // The loop may already be gone if the engine stopped first.
    let _ = handle.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, engine_task).await.is_err() {
        warn!("Engine did not stop within {:?}", SHUTDOWN_GRACE);
    }

    if exit == ReplExit::Logout {
        auth.logout().await?;
        println!("Logged out.");
    }
    Ok(())
}

/// Command-line values take precedence over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(url) = &cli.api_url {
        config.server.api_base_url = url.clone();
    }
    if let Some(url) = &cli.ws_url {
        config.server.ws_url = url.clone();
    }
    if let Some(path) = &cli.conversation_log {
        config.logging.conversation_log = Some(path.display().to_string());
    }
}

/// Reuse the server session if the cookie store already has one, otherwise
/// log in interactively.
async fn authenticate(
    auth: &HttpAuthClient,
    cli: &Cli,
    stdin: &mut BufReader<Stdin>,
) -> Result<AuthStatus> {
    auth.prime_csrf().await?;
    let status = auth.check().await?;
    if status.authenticated {
        info!("Already signed in as {:?}", status.username);
        return Ok(status);
    }

    let username = match &cli.username {
        Some(name) => name.clone(),
        None => prompt(stdin, "Username: ").await?,
    };
    for attempt in 1..=LOGIN_ATTEMPTS {
        let password = match std::env::var("PARLEY_PASSWORD") {
            Ok(password) if attempt == 1 => password,
            _ => prompt(stdin, "Password (visible): ").await?,
        };
        match auth.login(&username, &password).await {
            Ok(status) if status.authenticated => return Ok(status),
            Ok(_) => eprintln!("Login was not accepted."),
            Err(AuthError::InvalidCredentials(message)) => eprintln!("{}", message),
            Err(e) => return Err(e.into()),
        }
    }
    bail!("not authenticated after {} attempts", LOGIN_ATTEMPTS)
}

async fn prompt(stdin: &mut BufReader<Stdin>, label: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    if stdin.read_line(&mut line).await? == 0 {
        bail!("input closed");
    }
    Ok(line.trim().to_string())
}
