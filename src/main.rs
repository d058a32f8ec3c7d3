use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use parfumvilag_importer::config::{EntryErrorPolicy, Settings};
use parfumvilag_importer::{db, logging, metrics, pipeline};

#[derive(Parser)]
#[command(name = "parfumvilag_importer")]
#[command(about = "Loads the Notino shopping feed into the Parfumvilág catalog")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to ./importer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the feed into the catalog database in one transaction
    Import(ImportArgs),
    /// Parse, filter and normalize the feed without touching the database
    Inspect {
        /// Feed XML file
        #[arg(long)]
        feed: Option<PathBuf>,
        /// Number of normalized entries to print
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// fail_fast stops at the first entry that fails to normalize, skip_entry counts it and goes on
        #[arg(long)]
        on_entry_error: Option<EntryErrorPolicy>,
    },
    /// Create the catalog tables in the configured database
    InitDb {
        /// SQLite/libSQL database file
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ImportArgs {
    /// Feed XML file
    #[arg(long)]
    feed: Option<PathBuf>,
    /// SQLite/libSQL database file
    #[arg(long)]
    database: Option<PathBuf>,
    /// fail_fast aborts the run on the first bad entry, skip_entry rolls back just that entry
    #[arg(long)]
    on_entry_error: Option<EntryErrorPolicy>,
    /// Roll back instead of committing (`--dry-run=false` overrides the config file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    dry_run: Option<bool>,
    /// Create missing catalog tables before importing (`--create-schema=false` overrides the config file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    create_schema: Option<bool>,
    /// Write Prometheus metrics to this file after the run
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

impl ImportArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(feed) = self.feed {
            settings.feed.path = feed;
        }
        if let Some(database) = self.database {
            settings.database.path = database;
        }
        if let Some(policy) = self.on_entry_error {
            settings.import.on_entry_error = policy;
        }
        if let Some(path) = self.metrics_file {
            settings.metrics.textfile = Some(path);
        }
        if let Some(dry_run) = self.dry_run {
            settings.import.dry_run = dry_run;
        }
        if let Some(create_schema) = self.create_schema {
            settings.database.create_schema = create_schema;
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let _log_guard = logging::init_logging(&settings.logging);

    match cli.command {
        Commands::Import(args) => {
            args.apply(&mut settings);
            if settings.metrics.textfile.is_some() {
                metrics::init_metrics();
            }

            println!("🔄 Importing {} ...", settings.feed.path.display());
            let report = match pipeline::run_import(&settings) {
                Ok(report) => report,
                Err(e) => {
                    error!("Import failed: {}", e);
                    println!("❌ Import failed, nothing was committed: {}", e);
                    return Err(e).context("Import failed");
                }
            };

            let stats = &report.stats;
            println!("\n📊 Import results (run {}):", report.run_id);
            println!("   Entries in feed: {}", stats.entries_total);
            println!("   Accepted: {}", stats.accepted);
            println!("   Skipped (not perfume): {}", stats.rejected_not_fragrance);
            println!("   Skipped (soap): {}", stats.rejected_soap);
            println!("   Failed: {}", stats.failed);
            println!(
                "   Brands: {} new, {} existing",
                stats.brands_created, stats.brands_reused
            );
            println!("   Perfumes: {}", stats.perfumes_inserted);
            println!("   Store listings: {}", stats.store_listings_inserted);
            println!(
                "   Notes: {} new, {} existing, {} links",
                stats.notes_created, stats.notes_reused, stats.note_links_inserted
            );

            tracing::info!(report = %serde_json::to_string(&report)?, "Import report");

            if report.committed {
                println!("\n✅ Data successfully loaded into the database!");
            } else {
                println!("\n🧪 Dry run finished, transaction rolled back");
            }
        }
        Commands::Inspect {
            feed,
            limit,
            on_entry_error,
        } => {
            if let Some(feed) = feed {
                settings.feed.path = feed;
            }
            if let Some(policy) = on_entry_error {
                settings.import.on_entry_error = policy;
            }
            let preview =
                pipeline::inspect_feed(&settings, limit).context("Failed to inspect feed")?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::InitDb { database } => {
            if let Some(database) = database {
                settings.database.path = database;
            }
            settings.database.create_schema = true;
            let conn = db::open(&settings.database).context("Failed to open database")?;
            let counts = db::count_rows(&conn)?;
            println!(
                "✅ Catalog schema ready at {} ({} perfumes, {} brands, {} notes)",
                settings.database.path.display(),
                counts.perfumes,
                counts.brands,
                counts.notes
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_args(args: &[&str]) -> ImportArgs {
        let argv = ["parfumvilag_importer", "import"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Import(args) => args,
            _ => panic!("expected the import subcommand"),
        }
    }

    #[test]
    fn test_cli_can_turn_config_flags_off() {
        let mut settings = Settings::default();
        settings.import.dry_run = true;
        settings.database.create_schema = true;

        import_args(&["--dry-run=false", "--create-schema=false"]).apply(&mut settings);

        assert!(!settings.import.dry_run);
        assert!(!settings.database.create_schema);
    }

    #[test]
    fn test_bare_flags_turn_options_on() {
        let mut settings = Settings::default();

        import_args(&["--dry-run", "--create-schema"]).apply(&mut settings);

        assert!(settings.import.dry_run);
        assert!(settings.database.create_schema);
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let mut settings = Settings::default();
        settings.import.dry_run = true;

        import_args(&[]).apply(&mut settings);

        assert!(settings.import.dry_run);
        assert!(!settings.database.create_schema);
    }

    #[test]
    fn test_inspect_accepts_entry_error_policy() {
        let cli = Cli::try_parse_from([
            "parfumvilag_importer",
            "inspect",
            "--on-entry-error",
            "skip-entry",
        ])
        .unwrap();

        match cli.command {
            Commands::Inspect { on_entry_error, .. } => {
                assert_eq!(on_entry_error, Some(EntryErrorPolicy::SkipEntry));
            }
            _ => panic!("expected the inspect subcommand"),
        }
    }
}
