use anyhow::{Context, Result};
use dotenv::dotenv;
use nafstat_sync::{
    cli::{Cli, Commands, DatabaseArgs, LoadArgs},
    config::Destination,
    pipeline,
    report::{LogReporter, RunReport},
    schema::LoadPlan,
    store::{PostgresStore, SqliteStore, Store},
    Error,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Sync { fetch, db, load } => {
            let config = fetch.pipeline_config(load.commit_mode());
            let report = with_store(&db, |store| {
                pipeline::run(store, &config, &mut LogReporter::new())
            })?;
            finish(&report, &load)?;
        }

        Commands::Download { fetch } => {
            let config = fetch.pipeline_config(Default::default());
            let dump = pipeline::fetch_dump(&config, &mut LogReporter::new())?;
            println!(
                "Downloaded {} bytes from {}, data in {:?}",
                dump.archive_bytes, config.url, dump.source_root
            );
        }

        Commands::Load {
            source_dir,
            db,
            load,
        } => {
            let mode = load.commit_mode();
            let report = with_store(&db, |store| {
                pipeline::load_local(store, &source_dir, mode, &mut LogReporter::new())
            })?;
            finish(&report, &load)?;
        }

        Commands::InitSchema { db } => {
            let plan = LoadPlan::standard()?;
            with_store(&db, |store| Ok(store.create_tables(plan.tables())?))?;
            println!("Schema ready ({} tables)", plan.len());
        }

        Commands::ListTables => {
            let plan = LoadPlan::standard()?;
            println!("Tables in load order:\n");
            for table in plan.tables() {
                println!("  [{}] {:<24} <- {}", table.rank, table.name, table.source_file);
            }
        }
    }

    Ok(())
}

/// Open the configured backend and hand it to `f`
fn with_store<T>(
    db: &DatabaseArgs,
    f: impl FnOnce(&mut dyn Store) -> nafstat_sync::Result<T>,
) -> Result<T> {
    let destination = db
        .destination()
        .context("PostgreSQL needs --db-user and --db-name (or use --sqlite)")?;
    tracing::info!(destination = %destination, "opening destination");

    let value = match &destination {
        Destination::Sqlite(path) => {
            let mut store = SqliteStore::open(path).map_err(Error::Connect)?;
            f(&mut store)
        }
        Destination::Postgres(target) => {
            let mut store = PostgresStore::connect(target).map_err(Error::Connect)?;
            f(&mut store)
        }
    };
    value.with_context(|| format!("run against {} failed", destination))
}

fn finish(report: &RunReport, load: &LoadArgs) -> Result<()> {
    if let Some(path) = &load.report {
        report.write_json(path)?;
    }
    print_summary(report, load.report.as_deref());
    Ok(())
}

fn print_summary(report: &RunReport, report_path: Option<&Path>) {
    println!();
    for table in &report.tables {
        println!(
            "  {:<24} {:>9} rows  (+{} sentinel, +{} placeholder)",
            table.table, table.rows_loaded, table.sentinels_inserted, table.placeholders_inserted
        );
    }
    println!(
        "\nLoaded {} rows into {} tables in {:.1}s ({} commit)",
        report.total_rows(),
        report.tables.len(),
        report.elapsed_secs,
        report.commit_mode
    );
    if let Some(path) = report_path {
        println!("Run report written to {:?}", path);
    }
}
