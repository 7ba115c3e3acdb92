//! Advisor directory browser.
//!
//! ## Usage
//!
//! ```bash
//! # Load advisors from a JSON array
//! adv-browse import advisors.json
//!
//! # First page of Ontario advisors named like "an", by last name descending
//! adv-browse browse --province Ontario --search an --sort last_name --desc
//!
//! # Materialize the current result set as a report
//! adv-browse report-save "Ontario leads" --province Ontario --pages 3
//! adv-browse report-show "Ontario leads" --page 2
//! ```
#![forbid(unsafe_code)]

mod commands;
mod config;
mod output;

use adv_core::UserId;
use adv_storage::{SharedStore, SqliteStore};
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use commands::{FilterArgs, SortArgs};
use config::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adv-browse")]
#[command(about = "Filter, sort and page through the advisors directory")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "ADV_BROWSE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "ADV_BROWSE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// User owning favorite lists and reports
    #[arg(long, env = "ADV_BROWSE_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsert advisors from a JSON array file
    Import { file: PathBuf },
    /// Distinct values available to each filter
    Options,
    /// Query the directory and print the accumulated rows
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
        /// Pages to fetch (40 rows, then 100 per page)
        #[arg(long)]
        pages: Option<u64>,
    },
    /// Your favorite lists with member counts
    Lists,
    ListCreate {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add advisors to one of your favorite lists
    ListAdd {
        list: String,
        #[arg(required = true)]
        advisor_ids: Vec<String>,
    },
    /// Your saved reports
    Reports,
    /// Run a browse and save the accumulated advisor ids as a report
    ReportSave {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        pages: Option<u64>,
    },
    /// One 50-row page of a saved report
    ReportShow {
        name: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[command(flatten)]
        sort: SortArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("adv_browse=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(user) = args.user {
        config.user_id = user;
    }

    let user = UserId::try_new(config.user_id.as_str())
        .map_err(|err| anyhow!("invalid user id: {err}"))?;
    let store = SharedStore::new(SqliteStore::open(&config.storage_dir)?);

    let config_path = config.config_path();
    if args.config.is_none() && !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "created default config");
    }

    match args.command {
        Command::Import { file } => commands::import(&store, &file),
        Command::Options => commands::options(&store),
        Command::Browse { filters, pages } => {
            commands::browse(&store, &user, &filters, pages.unwrap_or(config.pages)).await
        }
        Command::Lists => commands::lists(&store, &user),
        Command::ListCreate { name, description } => {
            commands::list_create(&store, &user, &name, description)
        }
        Command::ListAdd { list, advisor_ids } => {
            commands::list_add(&store, &user, &list, &advisor_ids)
        }
        Command::Reports => commands::reports(&store, &user),
        Command::ReportSave {
            name,
            description,
            filters,
            pages,
        } => {
            commands::report_save(
                &store,
                &user,
                &name,
                description,
                &filters,
                pages.unwrap_or(config.pages),
            )
            .await
        }
        Command::ReportShow { name, page, sort } => {
            commands::report_show(&store, &user, &name, page, &sort)
        }
    }
}
