//! Catalog loader: writes one normalized perfume into the catalog store.
//!
//! Brands and notes are resolved by exact name and created on first sighting.
//! Perfumes, store listings and note links are always inserted.

use crate::config::Settings;
use crate::constants::NEW_NOTE_TYPE;
use crate::error::Result;
use crate::normalize::NoteExtractor;
use crate::storage::CatalogStore;
use crate::types::{NewPerfume, NewStoreListing, NormalizedPerfume, RowId};
use serde::Serialize;
use tracing::{debug, instrument};

/// Result of a name lookup that may have inserted a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Existing(RowId),
    Created(RowId),
}

impl Resolved {
    pub fn id(&self) -> RowId {
        match self {
            Resolved::Existing(id) | Resolved::Created(id) => *id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolved::Created(_))
    }
}

/// Rows written for the notes of one perfume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoteLinks {
    pub notes_created: usize,
    pub notes_reused: usize,
    pub links_written: usize,
}

/// What loading one entry wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub perfume_id: RowId,
    pub brand_id: RowId,
    pub brand_created: bool,
    pub store_listing_id: RowId,
    pub notes: NoteLinks,
}

pub struct CatalogLoader {
    store_name: String,
    currency: String,
    notes: NoteExtractor,
}

impl CatalogLoader {
    pub fn new(
        store_name: impl Into<String>,
        currency: impl Into<String>,
        notes: NoteExtractor,
    ) -> Self {
        Self {
            store_name: store_name.into(),
            currency: currency.into(),
            notes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            settings.import.store_name.clone(),
            settings.import.currency.clone(),
            NoteExtractor::new(&settings.markers)?,
        ))
    }

    /// Write brand, perfume, store listing and notes for one entry
    #[instrument(skip(self, store, perfume), fields(name = %perfume.name))]
    pub fn load_entry<S>(&self, store: &mut S, perfume: &NormalizedPerfume) -> Result<LoadOutcome>
    where
        S: CatalogStore + ?Sized,
    {
        let brand = self.resolve_brand(store, &perfume.brand_name)?;

        let perfume_id = store.insert_perfume(&NewPerfume {
            name: &perfume.name,
            brand_id: brand.id(),
            gender: perfume.gender.as_deref(),
            perfume_type: perfume.perfume_type.as_str(),
            description: &perfume.description,
            image_url: perfume.image_url.as_deref(),
        })?;

        let store_listing_id = store.insert_store_listing(&NewStoreListing {
            perfume_id,
            store_name: &self.store_name,
            price: perfume.price,
            currency: &self.currency,
            url: perfume.link.as_deref(),
        })?;

        let notes = self.process_notes(store, perfume_id, perfume.product_highlight.as_deref())?;

        debug!(
            perfume_id,
            brand_id = brand.id(),
            brand_created = brand.was_created(),
            links = notes.links_written,
            "Loaded perfume"
        );

        Ok(LoadOutcome {
            perfume_id,
            brand_id: brand.id(),
            brand_created: brand.was_created(),
            store_listing_id,
            notes,
        })
    }

    /// Find the brand by exact name or create it
    pub fn resolve_brand<S>(&self, store: &mut S, name: &str) -> Result<Resolved>
    where
        S: CatalogStore + ?Sized,
    {
        if let Some(id) = store.find_brand(name)? {
            return Ok(Resolved::Existing(id));
        }
        let id = store.insert_brand(name)?;
        debug!("Created new brand: {} ({})", name, id);
        Ok(Resolved::Created(id))
    }

    /// Find the note by exact name or create it with the placeholder type
    pub fn resolve_note<S>(&self, store: &mut S, name: &str) -> Result<Resolved>
    where
        S: CatalogStore + ?Sized,
    {
        if let Some(id) = store.find_note(name)? {
            return Ok(Resolved::Existing(id));
        }
        Ok(Resolved::Created(store.insert_note(name, NEW_NOTE_TYPE)?))
    }

    /// Extract the scent notes from the product highlight and link them to the perfume.
    ///
    /// A missing highlight, or one without a notes section, writes nothing.
    pub fn process_notes<S>(
        &self,
        store: &mut S,
        perfume_id: RowId,
        product_highlight: Option<&str>,
    ) -> Result<NoteLinks>
    where
        S: CatalogStore + ?Sized,
    {
        let mut links = NoteLinks::default();
        let Some(highlight) = product_highlight else {
            return Ok(links);
        };

        for note_name in self.notes.extract(highlight) {
            let note = self.resolve_note(store, &note_name)?;
            if note.was_created() {
                links.notes_created += 1;
            } else {
                links.notes_reused += 1;
            }

            store.link_note(perfume_id, note.id())?;
            links.links_written += 1;
        }

        Ok(links)
    }
}
