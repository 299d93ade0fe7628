#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the London crime dashboard.
//!
//! Imports the dashboard CSV extract into `DuckDB`, runs one-off summary
//! and ranking queries, resolves postcodes, and starts the API server.
//! Query results are printed as JSON.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use london_crime_analytics::filter::RecordFilterBuilder;
use london_crime_analytics::{ranking, trend};
use london_crime_analytics_models::RankingOutcome;
use london_crime_database::duck::DuckDbStore;
use london_crime_database::{StoreBackend, csv_import, paths};
use london_crime_geography::PostcodeResolver;
use london_crime_server::config::ServerConfig;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "london_crime_cli", about = "London crime dashboard toolchain")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where records are read from.
#[derive(Args)]
struct StoreArgs {
    /// Record store backend (`memory` loads the CSV, `duckdb` reads an import)
    #[arg(long, env = "CRIME_STORE", default_value = "memory", global = true)]
    store: StoreBackend,
    /// Dashboard CSV extract
    #[arg(long, env = "CRIME_DATA_CSV", global = true)]
    csv: Option<PathBuf>,
    /// `DuckDB` record store file
    #[arg(long, env = "CRIME_DUCKDB_PATH", global = true)]
    duckdb: Option<PathBuf>,
}

impl StoreArgs {
    fn csv_path(&self) -> PathBuf {
        self.csv.clone().unwrap_or_else(paths::crime_csv_path)
    }

    fn duckdb_path(&self) -> PathBuf {
        self.duckdb.clone().unwrap_or_else(paths::crime_duckdb_path)
    }
}

/// Dashboard filter flags.
#[derive(Args)]
struct FilterArgs {
    /// Inclusive lower period bound
    #[arg(long)]
    start_date: Option<String>,
    /// Inclusive upper period bound
    #[arg(long)]
    end_date: Option<String>,
    /// Exact area name
    #[arg(long)]
    borough: Option<String>,
    /// Single offence group (wins over `--offence-groups`)
    #[arg(long)]
    offence_group: Option<String>,
    /// Comma-separated offence groups
    #[arg(long)]
    offence_groups: Option<String>,
    #[arg(long)]
    offence_subgroup: Option<String>,
    #[arg(long)]
    area_type: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the CSV extract into the `DuckDB` record store, replacing its
    /// contents
    Import,
    /// Print total offences and change percentages for a filtered slice
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Rank the borough a postcode falls in
    Rank {
        /// UK postcode, e.g. "E1 6AN"
        postcode: String,
        /// Offence group, or OVERALL
        #[arg(long)]
        offence_group: Option<String>,
    },
    /// Print the borough a postcode falls in
    Resolve {
        /// UK postcode, e.g. "E1 6AN"
        postcode: String,
    },
    /// Start the API server
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
        bind_addr: String,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
        /// Built frontend to serve at `/`
        #[arg(long, env = "STATIC_DIR")]
        static_dir: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let store_args = cli.store;

    match cli.command {
        Commands::Import => {
            let start = Instant::now();
            let records = csv_import::read_records(&store_args.csv_path())?;
            let store = DuckDbStore::open(&store_args.duckdb_path())?;
            let written = store.replace_all(records)?;
            log::info!(
                "Imported {written} records in {:.1}s",
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Summary { filter } => {
            let store = london_crime_database::open_store(
                store_args.store,
                &store_args.csv_path(),
                &store_args.duckdb_path(),
            )?;
            let filter = RecordFilterBuilder::new()
                .start_period(filter.start_date.as_deref())
                .end_period(filter.end_date.as_deref())
                .borough(filter.borough.as_deref())
                .offence_group(filter.offence_group.as_deref())
                .offence_groups(filter.offence_groups.as_deref())
                .offence_subgroup(filter.offence_subgroup.as_deref())
                .area_type(filter.area_type.as_deref())
                .build();
            print_json(&trend::summary(store.as_ref(), &filter)?)?;
        }
        Commands::Rank {
            postcode,
            offence_group,
        } => {
            let store = london_crime_database::open_store(
                store_args.store,
                &store_args.csv_path(),
                &store_args.duckdb_path(),
            )?;
            match ranking::borough_ranking(
                store.as_ref(),
                PostcodeResolver::london(),
                Some(postcode.as_str()),
                offence_group.as_deref(),
            )? {
                RankingOutcome::Ranked(result) => print_json(&result)?,
                RankingOutcome::Miss(miss) => return Err(miss.message().into()),
            }
        }
        Commands::Resolve { postcode } => match london_crime_geography::lookup_borough(&postcode) {
            Some(borough) => println!("{borough}"),
            None => return Err(format!("{postcode}: not a recognised London postcode").into()),
        },
        Commands::Serve {
            bind_addr,
            port,
            static_dir,
        } => {
            let config = ServerConfig {
                bind_addr,
                port,
                store: store_args.store,
                csv_path: store_args.csv_path(),
                duckdb_path: store_args.duckdb_path(),
                static_dir,
            };
            let store = london_crime_server::open_store(&config)?;
            london_crime_server::run_server(config, store).await?;
        }
    }

    Ok(())
}
