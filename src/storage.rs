use crate::error::Result;
use crate::types::{NewPerfume, NewStoreListing, RowId};
use tracing::debug;

/// Storage operations the catalog loader needs.
///
/// Brand and note lookups are exact, case-sensitive name matches. Implementations
/// are used by a single writer; lookup followed by insert is not atomic.
pub trait CatalogStore {
    // Brand operations
    fn find_brand(&self, name: &str) -> Result<Option<RowId>>;
    fn insert_brand(&mut self, name: &str) -> Result<RowId>;

    // Perfume and store listing operations
    fn insert_perfume(&mut self, perfume: &NewPerfume<'_>) -> Result<RowId>;
    fn insert_store_listing(&mut self, listing: &NewStoreListing<'_>) -> Result<RowId>;

    // Note operations
    fn find_note(&self, name: &str) -> Result<Option<RowId>>;
    fn insert_note(&mut self, name: &str, note_type: &str) -> Result<RowId>;
    fn link_note(&mut self, perfume_id: RowId, note_id: RowId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandRow {
    pub id: RowId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerfumeRow {
    pub id: RowId,
    pub name: String,
    pub brand_id: RowId,
    pub gender: Option<String>,
    pub perfume_type: String,
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreListingRow {
    pub id: RowId,
    pub perfume_id: RowId,
    pub store_name: String,
    pub price: f64,
    pub currency: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteRow {
    pub id: RowId,
    pub name: String,
    pub note_type: String,
}

/// In-memory storage implementation for development/testing
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    pub brands: Vec<BrandRow>,
    pub perfumes: Vec<PerfumeRow>,
    pub store_listings: Vec<StoreListingRow>,
    pub notes: Vec<NoteRow>,
    pub perfume_notes: Vec<(RowId, RowId)>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(len: usize) -> RowId {
    len as RowId + 1
}

impl CatalogStore for InMemoryStorage {
    fn find_brand(&self, name: &str) -> Result<Option<RowId>> {
        Ok(self.brands.iter().find(|b| b.name == name).map(|b| b.id))
    }

    fn insert_brand(&mut self, name: &str) -> Result<RowId> {
        let id = next_id(self.brands.len());
        self.brands.push(BrandRow {
            id,
            name: name.to_string(),
        });
        debug!("Created brand: {} with id {}", name, id);
        Ok(id)
    }

    fn insert_perfume(&mut self, perfume: &NewPerfume<'_>) -> Result<RowId> {
        let id = next_id(self.perfumes.len());
        self.perfumes.push(PerfumeRow {
            id,
            name: perfume.name.to_string(),
            brand_id: perfume.brand_id,
            gender: perfume.gender.map(str::to_string),
            perfume_type: perfume.perfume_type.to_string(),
            description: perfume.description.to_string(),
            image_url: perfume.image_url.map(str::to_string),
        });
        Ok(id)
    }

    fn insert_store_listing(&mut self, listing: &NewStoreListing<'_>) -> Result<RowId> {
        let id = next_id(self.store_listings.len());
        self.store_listings.push(StoreListingRow {
            id,
            perfume_id: listing.perfume_id,
            store_name: listing.store_name.to_string(),
            price: listing.price,
            currency: listing.currency.to_string(),
            url: listing.url.map(str::to_string),
        });
        Ok(id)
    }

    fn find_note(&self, name: &str) -> Result<Option<RowId>> {
        Ok(self.notes.iter().find(|n| n.name == name).map(|n| n.id))
    }

    fn insert_note(&mut self, name: &str, note_type: &str) -> Result<RowId> {
        let id = next_id(self.notes.len());
        self.notes.push(NoteRow {
            id,
            name: name.to_string(),
            note_type: note_type.to_string(),
        });
        debug!("Created note: {} with id {}", name, id);
        Ok(id)
    }

    fn link_note(&mut self, perfume_id: RowId, note_id: RowId) -> Result<()> {
        self.perfume_notes.push((perfume_id, note_id));
        Ok(())
    }
}
