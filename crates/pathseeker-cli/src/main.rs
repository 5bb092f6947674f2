//! PathSeeker CLI - a terminal client for the PathSeeker career guidance service.
//!
//! Sign in, manage your profile, and take the career assessment quiz from
//! the command line. Sessions persist between runs and renew themselves
//! while the refresh token is valid.

mod commands;
mod prompt;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pathseeker_core::auth::{IdentityClient, SessionManager};
use pathseeker_core::config::{normalize_base_url, Config};
use pathseeker_core::models::{Education, WorkExperience};
use pathseeker_core::ApiClient;

/// When set, logs go to this file instead of stderr
const LOG_FILE_ENV: &str = "PATHSEEKER_LOG_FILE";

#[derive(Parser)]
#[command(name = "pathseeker", version, about = "PathSeeker career guidance from the terminal")]
struct Cli {
    /// API base URL (defaults to PATHSEEKER_API_BASE, then the config file)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget stored tokens
    Logout,
    /// Show session and configuration state
    Status,
    /// Create a new account
    Register,
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Take the career assessment quiz
    Quiz,
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Edit(EditArgs),
}

#[derive(Args, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long = "add-skill")]
    pub add_skills: Vec<String>,
    #[arg(long = "remove-skill")]
    pub remove_skills: Vec<String>,
    #[arg(long = "add-interest")]
    pub add_interests: Vec<String>,
    #[arg(long = "remove-interest")]
    pub remove_interests: Vec<String>,
    /// "institution,degree,field,start,end"
    #[arg(long = "add-education", value_parser = commands::parse_education)]
    pub add_education: Vec<Education>,
    /// Entry number as listed by `profile show`
    #[arg(long = "remove-education")]
    pub remove_education: Vec<usize>,
    /// "company,title,start,end,description"
    #[arg(long = "add-work", value_parser = commands::parse_work_experience)]
    pub add_work: Vec<WorkExperience>,
    #[arg(long = "remove-work")]
    pub remove_work: Vec<usize>,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing() -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = std::env::var_os(LOG_FILE_ENV).map(PathBuf::from) else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing()?;
    info!("PathSeeker CLI starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let base_url = match cli.api_base {
        Some(ref base) => normalize_base_url(base),
        None => config.effective_api_base(),
    };

    let store = config.token_store()?;
    let identity = IdentityClient::new(&base_url)?;
    let session = Arc::new(SessionManager::new(store, identity));
    session.initialize();
    let mut redirects = session.redirects();
    let client = ApiClient::new(session)?;

    let result = match cli.command {
        Command::Login { email } => commands::login(&client, &mut config, email).await,
        Command::Logout => commands::logout(&client),
        Command::Status => commands::status(&client, &config),
        Command::Register => commands::register(&client).await,
        Command::Profile { action: ProfileAction::Show } => commands::profile_show(&client).await,
        Command::Profile { action: ProfileAction::Edit(args) } => {
            commands::profile_edit(&client, args).await
        }
        Command::Quiz => commands::quiz(),
    };

    if let Ok(redirect) = redirects.try_recv() {
        info!(path = %redirect.path, "Session ended, login required");
        eprintln!("Your session has expired. Run `pathseeker login` to sign in again.");
    }

    info!("PathSeeker CLI shutting down");
    result
}
