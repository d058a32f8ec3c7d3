use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::storage::CatalogStore;
use crate::types::{NewPerfume, NewStoreListing, RowId};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

const CATALOG_SCHEMA: &str = include_str!("../schema/catalog.sql");

/// Open the catalog database.
///
/// The file must already exist unless `create_schema` is set, in which case it is
/// created along with any missing tables.
pub fn open(config: &DatabaseConfig) -> Result<Connection> {
    info!("Opening catalog database at {}", config.path.display());

    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if config.create_schema {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let conn = Connection::open_with_flags(&config.path, flags)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

    if config.create_schema {
        ensure_schema(&conn)?;
    }
    Ok(conn)
}

/// Create the catalog tables that do not exist yet
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CATALOG_SCHEMA)?;
    debug!("Catalog schema ensured");
    Ok(())
}

/// Row counts per catalog table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub brands: i64,
    pub perfumes: i64,
    pub stores: i64,
    pub notes: i64,
    pub perfume_notes: i64,
}

pub fn count_rows(conn: &Connection) -> Result<CatalogCounts> {
    let count = |table: &str| -> Result<i64> {
        let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
    };

    Ok(CatalogCounts {
        brands: count("brands")?,
        perfumes: count("perfumes")?,
        stores: count("stores")?,
        notes: count("notes")?,
        perfume_notes: count("perfume_notes")?,
    })
}

/// [`CatalogStore`] over a borrowed connection.
///
/// Pass a transaction or savepoint (both deref to `Connection`) so the writes
/// stay inside the caller's unit of work.
pub struct SqliteCatalog<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCatalog<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn find_id_by_name(&self, sql: &str, name: &str) -> Result<Option<RowId>> {
        let id = self
            .conn
            .query_row(sql, params![name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }
}

impl CatalogStore for SqliteCatalog<'_> {
    fn find_brand(&self, name: &str) -> Result<Option<RowId>> {
        self.find_id_by_name("SELECT id FROM brands WHERE name = ?1 LIMIT 1", name)
    }

    fn insert_brand(&mut self, name: &str) -> Result<RowId> {
        self.conn
            .execute("INSERT INTO brands (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_perfume(&mut self, perfume: &NewPerfume<'_>) -> Result<RowId> {
        self.conn.execute(
            "INSERT INTO perfumes (name, brand_id, gender, type, description, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                perfume.name,
                perfume.brand_id,
                perfume.gender,
                perfume.perfume_type,
                perfume.description,
                perfume.image_url,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_store_listing(&mut self, listing: &NewStoreListing<'_>) -> Result<RowId> {
        self.conn.execute(
            "INSERT INTO stores (perfume_id, store_name, price, currency, url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                listing.perfume_id,
                listing.store_name,
                listing.price,
                listing.currency,
                listing.url,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_note(&self, name: &str) -> Result<Option<RowId>> {
        self.find_id_by_name("SELECT id FROM notes WHERE name = ?1 LIMIT 1", name)
    }

    fn insert_note(&mut self, name: &str, note_type: &str) -> Result<RowId> {
        self.conn.execute(
            "INSERT INTO notes (name, type) VALUES (?1, ?2)",
            params![name, note_type],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn link_note(&mut self, perfume_id: RowId, note_id: RowId) -> Result<()> {
        self.conn.execute(
            "INSERT INTO perfume_notes (perfume_id, note_id) VALUES (?1, ?2)",
            params![perfume_id, note_id],
        )?;
        Ok(())
    }
}
