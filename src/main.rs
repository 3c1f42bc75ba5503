use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dedupe_lib::dedup::catalog::RuleCatalog;
use dedupe_lib::dedup::config::DedupConfig;
use dedupe_lib::dedup::matcher::find_duplicate_ids;
use dedupe_lib::dedup::report::{
    find_duplicates, id_duplicate_messages, DuplicateMessage, DuplicateReport,
};
use dedupe_lib::models::individual::Individual;
use dedupe_lib::store::postgres::PgIndividualStore;
use dedupe_lib::utils::db_connect::connect;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::settings::DedupSettings;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Duplicate detection for individual registrations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selectable field groups as JSON
    Groups,
    /// Check a batch for duplicates without writing anything
    Check(CheckArgs),
    /// Check a batch and insert it when no duplicates were found
    Import {
        #[command(flatten)]
        check: CheckArgs,

        /// Insert even when duplicates were found
        #[arg(long)]
        allow_duplicates: bool,
    },
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Country the batch belongs to
    #[arg(long)]
    country: String,

    /// JSON file holding an array of individuals
    #[arg(long)]
    input: PathBuf,

    /// Comma separated field groups, e.g. "Ids,Names"
    #[arg(long)]
    groups: Option<String>,

    /// AND or OR
    #[arg(long)]
    operator: Option<String>,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    groups: Vec<&'static str>,
    operator: &'static str,
    report: &'a DuplicateReport,
    messages: Vec<DuplicateMessage>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    let catalog = RuleCatalog::standard();
    let settings = DedupSettings::from_env(&catalog);

    match cli.command {
        Command::Groups => {
            println!("{}", serde_json::to_string_pretty(&catalog.list_field_groups())?);
            Ok(())
        }
        Command::Check(args) => {
            let clean = run_check(&catalog, &settings, &args).await?;
            if !clean {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Import {
            check,
            allow_duplicates,
        } => {
            let clean = run_import(&catalog, &settings, &check, allow_duplicates).await?;
            if !clean {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn read_batch(args: &CheckArgs) -> Result<Vec<Individual>> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let batch: Vec<Individual> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} as a JSON array of individuals", args.input.display()))?;
    info!("Read {} individuals from {}", batch.len(), args.input.display());
    Ok(batch)
}

fn print_findings(
    batch: &[Individual],
    config: &DedupConfig,
    report: &DuplicateReport,
) -> Result<bool> {
    let id_duplicates = find_duplicate_ids(batch);
    let mut messages = id_duplicate_messages(&id_duplicates, batch);
    messages.extend(report.messages(batch, config));

    let output = CheckOutput {
        groups: config.group_ids(),
        operator: config.operator().as_str(),
        report,
        messages,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(id_duplicates.is_empty() && !report.has_duplicates())
}

/// Returns whether the batch is free of duplicates.
async fn run_check(catalog: &RuleCatalog, settings: &DedupSettings, args: &CheckArgs) -> Result<bool> {
    let config = settings.config_for(catalog, args.groups.as_deref(), args.operator.as_deref())?;
    let batch = read_batch(args)?;

    let pool = connect().await.context("Failed to connect to database")?;
    let mut conn = pool.get().await.context("Failed to get DB connection")?;
    let transaction = conn
        .build_transaction()
        .read_only(true)
        .start()
        .await
        .context("Failed to start read transaction")?;

    let store = PgIndividualStore::with_max_params(&transaction, settings.max_query_params);
    let report = find_duplicates(&store, &batch, &config, &args.country)
        .await
        .context("Duplicate check failed")?;
    transaction.commit().await.context("Failed to close read transaction")?;

    print_findings(&batch, &config, &report)
}

/// Returns whether the batch was clean; it is inserted when clean or when
/// `allow_duplicates` is set.
async fn run_import(
    catalog: &RuleCatalog,
    settings: &DedupSettings,
    args: &CheckArgs,
    allow_duplicates: bool,
) -> Result<bool> {
    let config = settings.config_for(catalog, args.groups.as_deref(), args.operator.as_deref())?;
    let mut batch = read_batch(args)?;
    for individual in batch.iter_mut() {
        individual.country_id = args.country.clone();
    }

    let pool = connect().await.context("Failed to connect to database")?;
    let mut conn = pool.get().await.context("Failed to get DB connection")?;
    let transaction = conn
        .transaction()
        .await
        .context("Failed to start import transaction")?;

    let store = PgIndividualStore::with_max_params(&transaction, settings.max_query_params);
    let report = find_duplicates(&store, &batch, &config, &args.country)
        .await
        .context("Duplicate check failed")?;
    let clean = print_findings(&batch, &config, &report)?;

    if !clean && !allow_duplicates {
        warn!("Duplicates found, nothing was imported");
        transaction.rollback().await.context("Failed to roll back import")?;
        return Ok(false);
    }
    if !clean {
        warn!("Importing despite duplicates (--allow-duplicates)");
    }

    for individual in batch.iter_mut() {
        if individual.id.trim().is_empty() {
            individual.id = Uuid::new_v4().to_string();
        }
    }
    let inserted = store
        .insert_many(&batch)
        .await
        .context("Failed to insert individuals")?;
    transaction.commit().await.context("Failed to commit import")?;

    info!("Imported {} individuals for country {}", inserted, args.country);
    Ok(clean)
}
