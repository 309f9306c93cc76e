//! variant-edge — entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use variant_edge_server::cli;
use variant_edge_server::config::{Overrides, ServerConfig};

#[derive(Parser)]
#[command(
    name = "variant-edge",
    about = "variant-edge — sticky A/B variant pages, rewritten on the fly",
    version
)]
struct Cli {
    /// Listen address (host:port). Also reads VARIANT_EDGE_ADDR.
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Variants API URL. Also reads VARIANTS_API_URL.
    #[arg(long, global = true)]
    variants_url: Option<String>,

    /// Outbound request timeout in milliseconds. Also reads VARIANT_EDGE_TIMEOUT_MS.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Sticky cookie lifetime in seconds. Also reads VARIANT_COOKIE_TTL.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    cookie_ttl: Option<u64>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve variant pages over HTTP (default).
    Serve,

    /// Print the rewrite rule table as JSON.
    Rules,

    /// Rewrite a local HTML document and print the result.
    Transform {
        /// HTML file to rewrite, or "-" for stdin.
        input: PathBuf,
    },

    /// Print the resolved configuration as JSON.
    Info,

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        addr: cli.addr.clone(),
        variants_url: cli.variants_url.clone(),
        timeout_ms: cli.timeout_ms,
        cookie_ttl: cli.cookie_ttl,
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = ServerConfig::resolve(&overrides)?;
            tracing::info!("variant-edge v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Variants API: {}", config.variants_url);
            let handler = config.build_handler()?;
            variant_edge_server::serve(config.addr, handler).await?;
        }

        Commands::Rules => {
            let config = ServerConfig::resolve(&overrides)?;
            println!("{}", cli::rules_json(&config.branding)?);
        }

        Commands::Transform { input } => {
            let config = ServerConfig::resolve(&overrides)?;
            print!("{}", cli::transform_input(&input, &config.branding)?);
        }

        Commands::Info => {
            let config = ServerConfig::resolve(&overrides)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "variant-edge", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_numeric_flags_rejected() {
        assert!(Cli::try_parse_from(["variant-edge", "--timeout-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["variant-edge", "--cookie-ttl", "0"]).is_err());
    }

    #[test]
    fn test_positive_numeric_flags_accepted() {
        let cli = Cli::try_parse_from(["variant-edge", "--timeout-ms", "250", "--cookie-ttl", "60"])
            .unwrap();
        assert_eq!(cli.timeout_ms, Some(250));
        assert_eq!(cli.cookie_ttl, Some(60));
    }
}
