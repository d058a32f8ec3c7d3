//! The import run: read the feed, filter, normalize and load every entry inside a
//! single transaction that is committed once at the end.

use crate::catalog::{CatalogLoader, LoadOutcome};
use crate::config::{EntryErrorPolicy, Settings};
use crate::db::{self, SqliteCatalog};
use crate::error::Result;
use crate::feed::{self, RawEntry};
use crate::filter::{EntryFilter, FilterOutcome};
use crate::metrics::{self, ImportMetrics};
use crate::normalize::Normalizer;
use crate::types::NormalizedPerfume;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Counters for one pass over the feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub entries_total: usize,
    pub accepted: usize,
    pub rejected_not_fragrance: usize,
    pub rejected_soap: usize,
    pub failed: usize,
    pub brands_created: usize,
    pub brands_reused: usize,
    pub perfumes_inserted: usize,
    pub store_listings_inserted: usize,
    pub notes_created: usize,
    pub notes_reused: usize,
    pub note_links_inserted: usize,
}

impl ImportStats {
    fn record_filter(&mut self, outcome: FilterOutcome) {
        self.entries_total += 1;
        match outcome {
            FilterOutcome::Accepted => self.accepted += 1,
            FilterOutcome::NotFragrance => self.rejected_not_fragrance += 1,
            FilterOutcome::Soap => self.rejected_soap += 1,
        }
        ImportMetrics::record_filter_outcome(outcome);
    }

    fn record_load(&mut self, outcome: &LoadOutcome) {
        if outcome.brand_created {
            self.brands_created += 1;
        } else {
            self.brands_reused += 1;
        }
        self.perfumes_inserted += 1;
        self.store_listings_inserted += 1;
        self.notes_created += outcome.notes.notes_created;
        self.notes_reused += outcome.notes.notes_reused;
        self.note_links_inserted += outcome.notes.links_written;

        ImportMetrics::record_brand(outcome.brand_created);
        ImportMetrics::record_perfume_inserted();
        ImportMetrics::record_notes(
            outcome.notes.notes_created,
            outcome.notes.notes_reused,
            outcome.notes.links_written,
        );
    }

    fn record_failure(&mut self) {
        self.failed += 1;
        ImportMetrics::record_entry_failed();
    }
}

/// Summary of a finished import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub feed_path: PathBuf,
    pub database_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub committed: bool,
    pub on_entry_error: EntryErrorPolicy,
    pub stats: ImportStats,
}

/// Filter, normalize and load feed entries through one transaction
pub struct Importer {
    filter: EntryFilter,
    normalizer: Normalizer,
    loader: CatalogLoader,
    on_entry_error: EntryErrorPolicy,
    dry_run: bool,
}

impl Importer {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            filter: EntryFilter::new(&settings.markers),
            normalizer: Normalizer::new(&settings.markers),
            loader: CatalogLoader::from_settings(settings)?,
            on_entry_error: settings.import.on_entry_error,
            dry_run: settings.import.dry_run,
        })
    }

    /// Load `entries` into the catalog behind `conn`.
    ///
    /// Commits once after the last entry, or rolls back for a dry run. Any error
    /// returned from here leaves the database as it was.
    pub fn import(&self, conn: &mut Connection, entries: &[RawEntry]) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let mut tx = conn.transaction()?;

        for (index, entry) in entries.iter().enumerate() {
            let outcome = self.filter.evaluate(entry);
            stats.record_filter(outcome);
            if !outcome.is_accepted() {
                debug!(entry = index, reason = outcome.as_str(), "Skipping entry");
                continue;
            }

            match self.on_entry_error {
                EntryErrorPolicy::FailFast => {
                    let loaded = self.load(&tx, entry)?;
                    stats.record_load(&loaded);
                }
                EntryErrorPolicy::SkipEntry => {
                    let sp = tx.savepoint()?;
                    match self.load(&sp, entry) {
                        Ok(loaded) => {
                            sp.commit()?;
                            stats.record_load(&loaded);
                        }
                        Err(e) => {
                            // Dropping the savepoint rolls this entry back
                            drop(sp);
                            warn!(entry = index, error = %e, "Entry failed to load, skipping");
                            stats.record_failure();
                        }
                    }
                }
            }
        }

        if self.dry_run {
            tx.rollback()?;
            info!("Dry run: transaction rolled back");
        } else {
            tx.commit()?;
            info!("Transaction committed");
        }
        Ok(stats)
    }

    fn load(&self, conn: &Connection, entry: &RawEntry) -> Result<LoadOutcome> {
        let perfume = self.normalizer.normalize(entry)?;
        let mut catalog = SqliteCatalog::new(conn);
        self.loader.load_entry(&mut catalog, &perfume)
    }

    /// Filter and normalize without a database
    pub fn preview(&self, entries: &[RawEntry], limit: usize) -> Result<FeedPreview> {
        let mut preview = FeedPreview::default();
        for entry in entries {
            let outcome = self.filter.evaluate(entry);
            preview.stats.record_filter(outcome);
            if !outcome.is_accepted() {
                continue;
            }
            match self.normalizer.normalize(entry) {
                Ok(perfume) => {
                    if preview.sample.len() < limit {
                        preview.sample.push(perfume);
                    }
                }
                Err(e) if self.on_entry_error == EntryErrorPolicy::SkipEntry => {
                    warn!(error = %e, "Entry failed to normalize, skipping");
                    preview.stats.record_failure();
                }
                Err(e) => return Err(e),
            }
        }
        Ok(preview)
    }
}

/// Result of filtering and normalizing a feed without loading it
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedPreview {
    pub stats: ImportStats,
    pub sample: Vec<NormalizedPerfume>,
}

/// Run a full import as configured by `settings`
pub fn run_import(settings: &Settings) -> Result<ImportReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("import_run", %run_id);
    let _enter = span.enter();

    let started_at = Utc::now();
    let timer = Instant::now();
    let importer = Importer::from_settings(settings)?;

    // The feed is parsed completely before the database is opened
    let entries = feed::read_feed(&settings.feed.path)?;
    let mut conn = db::open(&settings.database)?;
    let stats = importer.import(&mut conn, &entries)?;

    // The transaction is already committed here; metrics problems must not fail the run
    ImportMetrics::record_run_duration(timer.elapsed().as_secs_f64());
    if let Some(path) = &settings.metrics.textfile {
        if metrics::get_handle().is_none() {
            warn!("Metrics textfile configured but no recorder is installed");
        } else if let Err(e) = metrics::write_textfile(path) {
            warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
        }
    }

    let report = ImportReport {
        run_id,
        feed_path: settings.feed.path.clone(),
        database_path: settings.database.path.clone(),
        started_at,
        finished_at: Utc::now(),
        dry_run: settings.import.dry_run,
        committed: !settings.import.dry_run,
        on_entry_error: settings.import.on_entry_error,
        stats,
    };

    info!(
        entries = report.stats.entries_total,
        accepted = report.stats.accepted,
        failed = report.stats.failed,
        perfumes = report.stats.perfumes_inserted,
        committed = report.committed,
        "Import finished"
    );
    Ok(report)
}

/// Parse, filter and normalize the configured feed without touching the database
pub fn inspect_feed(settings: &Settings, limit: usize) -> Result<FeedPreview> {
    let importer = Importer::from_settings(settings)?;
    let entries = feed::read_feed(&settings.feed.path)?;
    importer.preview(&entries, limit)
}
