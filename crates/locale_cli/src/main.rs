//! `locale` command-line front end.
//!
//! # Responsibility
//! - Classify location codes and inspect language tags.
//! - Seed, list and count a country/region database chosen by config.
//!
//! # See also
//! - `locale_storage::StorageConfig` for the `--config` file format and the
//!   `LOCALE_*` environment variables.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use locale_core::StorageProvider;
use locale_storage::StorageConfig;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "locale", about = "Locale and geography data tools", version)]
struct Cli {
    /// Storage config file (TOML). Defaults to `LOCALE_*` environment variables.
    #[arg(long, global = true, value_name = "path")]
    config: Option<PathBuf>,
    /// Absolute directory for rotated log files; logging is off when omitted.
    #[arg(long, global = true, value_name = "dir")]
    log_dir: Option<String>,
    #[arg(long, global = true, value_name = "level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate codes and report whether each is a country or a region.
    Classify {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Parse a BCP 47 tag and print its parts and display names.
    Locale {
        tag: String,
        /// Locale used for display names; the system default when omitted.
        #[arg(long = "in", value_name = "tag")]
        display_in: Option<String>,
    },
    /// Upsert countries and regions from a JSON array of
    /// `{"country": {...}, "regions": [...]}` objects.
    Import { file: PathBuf },
    /// Print stored rows as JSON lines, ordered by code.
    List(ListArgs),
    /// Print stored row counts.
    Count {
        /// Count only regions of this country.
        #[arg(long)]
        country: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(value_enum)]
    entity: commands::Entity,
    /// Restrict regions to one country.
    #[arg(long)]
    country: Option<String>,
    #[arg(long, default_value_t = locale_core::DEFAULT_PAGE_SIZE)]
    limit: u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("locale: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = log_level(cli.log_level.as_deref());
        locale_core::init_logging(level, log_dir).context("failed to start logging")?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Classify { codes } => commands::classify(&codes, &mut out),
        Command::Locale { tag, display_in } => {
            commands::describe_locale(&tag, display_in.as_deref(), &mut out)
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            with_storage(cli.config, |provider| {
                commands::import(provider, &raw, &mut out)
            })
        }
        Command::List(args) => with_storage(cli.config, |provider| {
            commands::list(
                provider,
                args.entity,
                args.country.as_deref(),
                locale_core::Page::new(args.limit, args.offset),
                &mut out,
            )
        }),
        Command::Count { country } => with_storage(cli.config, |provider| {
            commands::count(provider, country.as_deref(), &mut out)
        }),
    }?;
    out.flush()?;
    Ok(())
}

/// `--log-level` when given, otherwise the build's default level.
fn log_level(requested: Option<&str>) -> &str {
    match requested {
        Some(level) => level,
        None => locale_core::default_log_level(),
    }
}

/// Opens the configured provider, runs `op`, and always closes the provider.
fn with_storage(
    config: Option<PathBuf>,
    op: impl FnOnce(&dyn StorageProvider) -> Result<()>,
) -> Result<()> {
    let config = match config {
        Some(path) => StorageConfig::load(&path)?,
        None => StorageConfig::from_env()?,
    };
    log::info!(
        "event=cli_storage module=cli status=start backend={}",
        config.backend_name()
    );
    let provider = config.into_provider(locale_storage::system_clock())?;
    let result = op(provider.as_ref());
    let closed = provider.close().context("failed to close storage");
    result.and(closed)
}

#[cfg(test)]
mod tests {
    use super::{log_level, Cli, Command};
    use clap::Parser;

    #[test]
    fn explicit_log_level_wins_over_default() {
        let cli = Cli::try_parse_from(["locale", "--log-level", "warn", "count"]).unwrap();

        assert_eq!(log_level(cli.log_level.as_deref()), "warn");
        assert!(matches!(cli.command, Command::Count { country: None }));
    }

    #[test]
    fn missing_log_level_uses_build_default() {
        let cli = Cli::try_parse_from(["locale", "classify", "us"]).unwrap();

        assert_eq!(
            log_level(cli.log_level.as_deref()),
            locale_core::default_log_level()
        );
    }
}
