use crate::config::MarkerConfig;
use crate::constants::tags;
use crate::feed::RawEntry;
use serde::Serialize;

/// Why an entry was kept or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    Accepted,
    /// Category missing or not a fragrance category
    NotFragrance,
    /// Product type marks the entry as soap
    Soap,
}

impl FilterOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOutcome::Accepted => "accepted",
            FilterOutcome::NotFragrance => "not_fragrance",
            FilterOutcome::Soap => "soap",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterOutcome::Accepted)
    }
}

/// Keeps perfume and cologne entries that are not soaps
#[derive(Debug, Clone)]
pub struct EntryFilter {
    category_marker: String,
    soap_marker: String,
}

impl EntryFilter {
    pub fn new(markers: &MarkerConfig) -> Self {
        Self {
            category_marker: markers.fragrance_category.clone(),
            soap_marker: markers.soap.clone(),
        }
    }

    /// Apply the category rule, then the soap rule
    pub fn evaluate(&self, entry: &RawEntry) -> FilterOutcome {
        match entry.text(tags::CATEGORY) {
            Some(category) if category.contains(self.category_marker.as_str()) => {}
            _ => return FilterOutcome::NotFragrance,
        }

        if entry
            .text(tags::PRODUCT_TYPE)
            .is_some_and(|product_type| product_type.contains(self.soap_marker.as_str()))
        {
            return FilterOutcome::Soap;
        }

        FilterOutcome::Accepted
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new(&MarkerConfig::default())
    }
}
