use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use palisade::filter::{Evaluator, NullResolver};
use palisade::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "palisade",
    version,
    about = "Password policy filter for directory-service password changes"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Account name the password would be set for
    #[arg(short, long)]
    account: String,
}

/// Dry-run a candidate password against the configured rule files. The
/// password is read from the first line of stdin so it never appears in the
/// process argument list. No directory is contacted; the identity-substring
/// check is a no-op here.
#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    let evaluator = Evaluator::new(
        settings.rules,
        Arc::new(NullResolver),
        settings.directory.lookup_timeout(),
    )?;

    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .into_diagnostic()?;
    let password = password.trim_end_matches(['\r', '\n']);

    let verdict = evaluator.judge(password, &cli.account).await;
    match verdict {
        palisade::filter::Verdict::Allow => {
            println!("allow");
            Ok(())
        }
        palisade::filter::Verdict::Deny(reason) => {
            println!("deny: {reason}");
            std::process::exit(1);
        }
    }
}
