//! `lecternctl`: inspect a Lectern catalog fixture as a given role.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use lectern_model::{Role, SortBy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "lecternctl", about = "Inspect a Lectern catalog as a given role")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the paginated view a role gets for a fixture
    Browse {
        /// JSON export with `categories`, `tags` and `documents` arrays
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long, default_value = "guest")]
        role: Role,
        /// Shareable query string, e.g. `q=rebar&tag=t1&page=2`
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Catalog config file (defaults to lectern.toml when present)
        #[arg(long, env = "LECTERN_CONFIG")]
        config: Option<PathBuf>,
        /// JSON object of translation key to display text
        #[arg(long)]
        translations: Option<PathBuf>,
        /// Reject malformed query parameters instead of dropping them
        #[arg(long)]
        strict: bool,
    },
    /// Show why each document is or is not visible to a role
    Explain {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        role: Role,
    },
    /// List the known roles
    Roles,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SortArg {
    Recent,
    Alpha,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Recent => SortBy::Recent,
            SortArg::Alpha => SortBy::Alpha,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lectern_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Browse {
            fixture,
            role,
            query,
            sort,
            config,
            translations,
            strict,
        } => commands::browse(commands::BrowseArgs {
            fixture,
            role,
            query,
            sort: sort.map(SortBy::from),
            config,
            translations,
            strict,
        })?,
        Command::Explain { fixture, role } => {
            commands::explain(&fixture, role)?
        }
        Command::Roles => commands::roles(),
    };
    println!("{output}");
    Ok(())
}
