//! Feed reader for the Google Shopping XML export.
//!
//! The whole document is parsed up front, so a missing or malformed file fails the
//! run before the database is touched.

use crate::constants::ENTRY_TAG;
use crate::error::{ImportError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One `entry` element: child element name to its text content.
///
/// A key that is missing means the element was absent; a key mapped to `None`
/// means the element was present but empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    fields: BTreeMap<String, Option<String>>,
}

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and fixtures
    pub fn with_field(mut self, name: &str, text: Option<&str>) -> Self {
        self.insert(name, text);
        self
    }

    /// Record a child element. Only the first element with a given name is kept.
    pub fn insert(&mut self, name: &str, text: Option<&str>) {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| text.map(str::to_string));
    }

    /// `None` when the element is absent, `Some(None)` when present but empty
    pub fn field(&self, name: &str) -> Option<Option<&str>> {
        self.fields.get(name).map(|text| text.as_deref())
    }

    /// Text content, `None` for both a missing and an empty element
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).flatten()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read and parse the feed file at `path`
pub fn read_feed(path: &Path) -> Result<Vec<RawEntry>> {
    let xml = fs::read_to_string(path).map_err(|source| ImportError::FeedRead {
        path: path.display().to_string(),
        source,
    })?;

    let entries = parse_feed(&xml)?;
    info!(path = %path.display(), entries = entries.len(), "Feed parsed");
    Ok(entries)
}

/// Parse a feed document into its entries, in document order
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options)?;

    let entries: Vec<RawEntry> = doc
        .root_element()
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == ENTRY_TAG)
        .map(entry_from_node)
        .collect();

    debug!(
        root = doc.root_element().tag_name().name(),
        entries = entries.len(),
        "Collected feed entries"
    );
    Ok(entries)
}

fn entry_from_node(node: roxmltree::Node<'_, '_>) -> RawEntry {
    let mut entry = RawEntry::new();
    for child in node.children().filter(|child| child.is_element()) {
        // Local name only, so `g:price` and `price` read the same
        entry.insert(child.tag_name().name(), child.text());
    }
    entry
}
