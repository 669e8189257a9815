mod auth;
mod body;
mod config;
mod error;
mod gmail;
mod models;
mod quotes;
mod render;
mod search;

use crate::config::{Config, DEFAULT_SETTINGS_PATH};
use crate::error::SetupError;
use crate::gmail::GmailClient;
use crate::render::ThreadRenderer;
use anyhow::Context;
use clap::Parser;
use google_gmail1::Gmail;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Search Gmail and display threads.
///
/// Examples:
///
///     gsearch "is:unread"
///
///     gsearch "from:sarah@example.com" --limit 5
///
///     gsearch "subject:invoice" --page 2
#[derive(Parser)]
#[command(name = "gsearch", version, verbatim_doc_comment)]
struct Cli {
    /// Gmail search query
    #[arg(required_unless_present = "reset_token")]
    query: Option<String>,

    /// Maximum number of threads to return
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=500))]
    limit: Option<u32>,

    /// Page number (1-based)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Settings file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// Print without colors
    #[arg(long)]
    no_color: bool,

    /// Log API calls and token handling to stderr
    #[arg(long)]
    debug: bool,

    /// Forget the stored token and exit
    #[arg(long)]
    reset_token: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::load(&cli.config);
    let storage = auth::FileTokenStorage::new(&config.token_path);

    // Handle token reset
    if cli.reset_token {
        storage.clear().await?;
        println!("Token cleared. Please restart without --reset-token to re-authenticate.");
        return Ok(ExitCode::SUCCESS);
    }

    let Some(query) = cli.query else {
        anyhow::bail!("A search query is required");
    };
    let limit = cli.limit.unwrap_or(config.default_limit);

    let secret = match auth::Authenticator::load_secret(&config.credentials_path).await {
        Ok(secret) => secret,
        Err(e) => match e.downcast_ref::<SetupError>() {
            Some(setup) => {
                print_setup_help(setup);
                return Ok(ExitCode::from(1));
            }
            None => return Err(e),
        },
    };

    let authenticator = auth::Authenticator::authorize(secret, storage).await?;

    let hub = Gmail::new(
        hyper::Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .context("Failed to load native root certificates")?
                .https_only()
                .enable_http1()
                .build(),
        ),
        authenticator,
    );
    let client = GmailClient::new(hub);

    let stdout = io::stdout();
    let color = config.color && !cli.no_color && stdout.is_terminal();
    let mut renderer = ThreadRenderer::new(stdout, config.rule_width, color);

    search::run_search(&client, &mut renderer, &query, limit, cli.page).await?;

    Ok(ExitCode::SUCCESS)
}

fn init_logging(debug: bool) {
    let level = if debug { "warn,gsearch=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn print_setup_help(err: &SetupError) {
    eprintln!("Error: {err}");
    eprintln!("\nTo set up Gmail API access:");
    for (i, step) in err.remediation().iter().enumerate() {
        eprintln!("{}. {}", i + 1, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["gsearch", "is:unread"]).unwrap();
        assert_eq!(cli.query.as_deref(), Some("is:unread"));
        assert_eq!(cli.limit, None);
        assert_eq!(cli.page, 1);
        assert_eq!(cli.config, PathBuf::from("settings.toml"));
        assert!(!cli.reset_token);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from(["gsearch", "subject:invoice", "-n", "5", "-p", "3"]).unwrap();
        assert_eq!(cli.limit, Some(5));
        assert_eq!(cli.page, 3);
    }

    #[test]
    fn test_cli_rejects_zero_page_and_limit() {
        assert!(Cli::try_parse_from(["gsearch", "q", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["gsearch", "q", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["gsearch", "q", "--limit", "501"]).is_err());
    }

    #[test]
    fn test_cli_query_required_unless_resetting() {
        assert!(Cli::try_parse_from(["gsearch"]).is_err());

        let cli = Cli::try_parse_from(["gsearch", "--reset-token"]).unwrap();
        assert!(cli.reset_token);
        assert_eq!(cli.query, None);
    }
}
