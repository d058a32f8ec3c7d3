//! Field normalization for feed entries.
//!
//! Everything here is pure: text in, cleaned values out. Defaults apply only when
//! an element is missing from the entry; an element that is present but empty
//! stays empty.

use crate::config::MarkerConfig;
use crate::constants::{self, tags};
use crate::error::{ImportError, Result};
use crate::feed::RawEntry;
use crate::types::{NormalizedPerfume, PerfumeType};
use regex::Regex;

/// Clean a free-text value for the catalog.
///
/// Backslashes are dropped, slashes become hyphens and apostrophes are doubled.
pub fn clean_name(text: Option<&str>) -> String {
    match text {
        None => constants::UNKNOWN_NAME.to_string(),
        Some(text) => text.replace('\\', "").replace('/', "-").replace('\'', "''"),
    }
}

/// Parse the leading number of a price such as `"12.50 EUR"`.
///
/// `text` is the content of a price element that is present; an empty element or
/// an unparseable first token is an error.
pub fn parse_price(text: Option<&str>) -> Result<f64> {
    let raw = text.unwrap_or_default();
    raw.split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or_else(|| ImportError::InvalidPrice {
            raw: raw.to_string(),
        })
}

/// Lower-case the gender; an empty value is stored as absent
pub fn normalize_gender(text: Option<&str>) -> Option<String> {
    text.filter(|gender| !gender.is_empty())
        .map(str::to_lowercase)
}

/// Element text, or `default` when the element is missing
fn field_or<'a>(entry: &'a RawEntry, tag: &str, default: &'a str) -> Option<&'a str> {
    entry.field(tag).unwrap_or(Some(default))
}

/// Product type substrings mapped to perfume types, first match wins
#[derive(Debug, Clone)]
pub struct PerfumeTypeRules {
    rules: Vec<(String, PerfumeType)>,
}

impl PerfumeTypeRules {
    pub fn new(markers: &MarkerConfig) -> Self {
        Self {
            rules: vec![
                (markers.eau_de_toilette.clone(), PerfumeType::EauDeToilette),
                (markers.eau_de_parfum.clone(), PerfumeType::EauDeParfum),
                (markers.eau_de_cologne.clone(), PerfumeType::EauDeCologne),
            ],
        }
    }

    pub fn derive(&self, product_type: Option<&str>) -> PerfumeType {
        let Some(product_type) = product_type else {
            return PerfumeType::Unknown;
        };
        self.rules
            .iter()
            .find(|(marker, _)| product_type.contains(marker.as_str()))
            .map(|(_, perfume_type)| *perfume_type)
            .unwrap_or(PerfumeType::Unknown)
    }
}

impl Default for PerfumeTypeRules {
    fn default() -> Self {
        Self::new(&MarkerConfig::default())
    }
}

/// Pulls scent note names out of a product highlight block
#[derive(Debug, Clone)]
pub struct NoteExtractor {
    notes_marker: String,
    section_end: Option<Regex>,
}

impl NoteExtractor {
    pub fn new(markers: &MarkerConfig) -> Result<Self> {
        let section_end = if markers.notes_section_end.is_empty() {
            None
        } else {
            let pattern = markers
                .notes_section_end
                .iter()
                .map(|marker| regex::escape(marker))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&pattern).map_err(|e| {
                ImportError::Config(format!("Invalid notes section markers: {e}"))
            })?;
            Some(regex)
        };

        Ok(Self {
            notes_marker: markers.notes.clone(),
            section_end,
        })
    }

    /// Note names in order of appearance, duplicates kept.
    ///
    /// The list starts after the last notes label and ends at whichever section
    /// label occurs first in the remaining text.
    pub fn extract(&self, highlight: &str) -> Vec<String> {
        let Some((_, after)) = highlight.rsplit_once(self.notes_marker.as_str()) else {
            return Vec::new();
        };

        let mut section = after.trim();
        if let Some(end) = self.section_end.as_ref().and_then(|re| re.find(section)) {
            section = &section[..end.start()];
        }

        section
            .split(',')
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Turns accepted raw entries into [`NormalizedPerfume`] values
#[derive(Debug, Clone)]
pub struct Normalizer {
    types: PerfumeTypeRules,
}

impl Normalizer {
    pub fn new(markers: &MarkerConfig) -> Self {
        Self {
            types: PerfumeTypeRules::new(markers),
        }
    }

    pub fn normalize(&self, entry: &RawEntry) -> Result<NormalizedPerfume> {
        let price = match entry.field(tags::PRICE) {
            None => constants::DEFAULT_PRICE,
            Some(text) => parse_price(text)?,
        };

        Ok(NormalizedPerfume {
            name: clean_name(field_or(entry, tags::TITLE, constants::DEFAULT_TITLE)),
            brand_name: clean_name(field_or(entry, tags::BRAND, constants::DEFAULT_BRAND)),
            gender: normalize_gender(field_or(entry, tags::GENDER, constants::DEFAULT_GENDER)),
            perfume_type: self.types.derive(entry.text(tags::PRODUCT_TYPE)),
            description: clean_name(field_or(
                entry,
                tags::DESCRIPTION,
                constants::DEFAULT_DESCRIPTION,
            )),
            image_url: field_or(entry, tags::IMAGE_LINK, constants::DEFAULT_IMAGE_URL)
                .map(str::to_string),
            price,
            size: field_or(entry, tags::SIZE, constants::DEFAULT_SIZE).map(str::to_string),
            link: field_or(entry, tags::LINK, constants::DEFAULT_LINK).map(str::to_string),
            product_highlight: entry.text(tags::PRODUCT_HIGHLIGHT).map(str::to_string),
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&MarkerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> NoteExtractor {
        NoteExtractor::new(&MarkerConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name(None), "Unknown Name");
        assert_eq!(clean_name(Some("A/B")), "A-B");
        assert_eq!(clean_name(Some("O'Brien\\x")), "O''Brienx");
        assert_eq!(clean_name(Some("")), "");
    }

    #[test]
    fn test_clean_name_output_is_safe() {
        let inputs = [
            "plain",
            "a\\b/c'd",
            "''",
            "\\\\//''",
            "Dolce & Gabbana / L'Imperatrice \\ 3",
        ];
        for input in inputs {
            let cleaned = clean_name(Some(input));
            assert!(!cleaned.contains('\\'), "{cleaned}");
            assert!(!cleaned.contains('/'), "{cleaned}");
            // Every apostrophe is part of a doubled pair
            assert!(!cleaned.replace("''", "").contains('\''), "{cleaned}");
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("12.50 EUR")).unwrap(), 12.5);
        assert_eq!(parse_price(Some("  8990   HUF")).unwrap(), 8990.0);
        assert_eq!(parse_price(Some("42")).unwrap(), 42.0);
        assert!(matches!(
            parse_price(Some("12,50 HUF")),
            Err(ImportError::InvalidPrice { raw }) if raw == "12,50 HUF"
        ));
        assert!(parse_price(Some("   ")).is_err());
        assert!(parse_price(None).is_err());
    }

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender(Some("Female")), Some("female".to_string()));
        assert_eq!(normalize_gender(Some("")), None);
        assert_eq!(normalize_gender(None), None);
    }

    #[test]
    fn test_perfume_type_derivation() {
        let rules = PerfumeTypeRules::default();
        assert_eq!(
            rules.derive(Some("Parfémy > Toaletní vody")),
            PerfumeType::EauDeToilette
        );
        assert_eq!(
            rules.derive(Some("Parfémy > Parfémované vody")),
            PerfumeType::EauDeParfum
        );
        assert_eq!(
            rules.derive(Some("Parfémy > Kolínské vody")),
            PerfumeType::EauDeCologne
        );
        assert_eq!(rules.derive(Some("Parfémy > Dárkové sady")), PerfumeType::Unknown);
        assert_eq!(rules.derive(None), PerfumeType::Unknown);
        assert_eq!(PerfumeType::Unknown.as_str(), "Unknown Type");
    }

    #[test]
    fn test_perfume_type_first_match_wins() {
        let rules = PerfumeTypeRules::default();
        assert_eq!(
            rules.derive(Some("Kolínské vody | Toaletní vody")),
            PerfumeType::EauDeToilette
        );
    }

    #[test]
    fn test_extract_notes_truncates_at_section_marker() {
        let notes = extractor().extract("Az illat fajtája: Rose, Jasmine Intenzitás: Strong");
        assert_eq!(notes, vec!["Rose", "Jasmine"]);
    }

    #[test]
    fn test_extract_notes_without_marker_is_empty() {
        assert!(extractor().extract("Intenzitás: Strong").is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_extract_notes_uses_earliest_section_marker() {
        // Bőrtípus is listed after Intenzitás but appears first in the text
        let notes = extractor()
            .extract("Az illat fajtája: fás, virágos Bőrtípus: minden Intenzitás: közepes");
        assert_eq!(notes, vec!["fás", "virágos"]);
    }

    #[test]
    fn test_extract_notes_keeps_duplicates_and_drops_empty_pieces() {
        let notes = extractor().extract("Az illat fajtája: rose, , rose ,musk,");
        assert_eq!(notes, vec!["rose", "rose", "musk"]);
    }

    #[test]
    fn test_extract_notes_reads_after_last_marker() {
        let notes = extractor().extract("Az illat fajtája: old Az illat fajtája: new, fresh");
        assert_eq!(notes, vec!["new", "fresh"]);
    }

    #[test]
    fn test_extract_notes_without_section_markers() {
        let markers = MarkerConfig {
            notes_section_end: Vec::new(),
            ..MarkerConfig::default()
        };
        let extractor = NoteExtractor::new(&markers).unwrap();
        assert_eq!(
            extractor.extract("Az illat fajtája: a, b Intenzitás: c"),
            vec!["a", "b Intenzitás: c"]
        );
    }

    #[test]
    fn test_normalize_applies_defaults_for_missing_fields() {
        let entry = RawEntry::new().with_field(tags::CATEGORY, Some("Perfume & Cologne"));
        let perfume = Normalizer::default().normalize(&entry).unwrap();

        assert_eq!(perfume.name, "Unknown Title");
        assert_eq!(perfume.brand_name, "Unknown Brand");
        assert_eq!(perfume.description, "No description available");
        assert_eq!(perfume.image_url.as_deref(), Some("No image URL"));
        assert_eq!(perfume.gender.as_deref(), Some("unisex"));
        assert_eq!(perfume.size.as_deref(), Some("Unknown Size"));
        assert_eq!(perfume.link.as_deref(), Some("No link available"));
        assert_eq!(perfume.price, 0.0);
        assert_eq!(perfume.perfume_type, PerfumeType::Unknown);
        assert_eq!(perfume.product_highlight, None);
    }

    #[test]
    fn test_normalize_empty_elements_are_not_defaulted() {
        let entry = RawEntry::new()
            .with_field(tags::TITLE, None)
            .with_field(tags::BRAND, None)
            .with_field(tags::IMAGE_LINK, None)
            .with_field(tags::GENDER, None)
            .with_field(tags::LINK, None);
        let perfume = Normalizer::default().normalize(&entry).unwrap();

        assert_eq!(perfume.name, "Unknown Name");
        assert_eq!(perfume.brand_name, "Unknown Name");
        assert_eq!(perfume.image_url, None);
        assert_eq!(perfume.gender, None);
        assert_eq!(perfume.link, None);
    }

    #[test]
    fn test_normalize_cleans_and_derives() {
        let entry = RawEntry::new()
            .with_field(tags::TITLE, Some("L'Eau d'Issey 1/2"))
            .with_field(tags::BRAND, Some("Issey Miyake\\"))
            .with_field(tags::PRODUCT_TYPE, Some("Parfémy > Toaletní vody"))
            .with_field(tags::GENDER, Some("Male"))
            .with_field(tags::PRICE, Some("15990 HUF"))
            .with_field(tags::PRODUCT_HIGHLIGHT, Some("Az illat fajtája: citrus"));
        let perfume = Normalizer::default().normalize(&entry).unwrap();

        assert_eq!(perfume.name, "L''Eau d''Issey 1-2");
        assert_eq!(perfume.brand_name, "Issey Miyake");
        assert_eq!(perfume.perfume_type, PerfumeType::EauDeToilette);
        assert_eq!(perfume.gender.as_deref(), Some("male"));
        assert_eq!(perfume.price, 15990.0);
        assert_eq!(
            perfume.product_highlight.as_deref(),
            Some("Az illat fajtája: citrus")
        );
    }

    #[test]
    fn test_normalize_rejects_present_but_broken_price() {
        let entry = RawEntry::new().with_field(tags::PRICE, Some("n/a HUF"));
        assert!(matches!(
            Normalizer::default().normalize(&entry),
            Err(ImportError::InvalidPrice { .. })
        ));

        let entry = RawEntry::new().with_field(tags::PRICE, None);
        assert!(Normalizer::default().normalize(&entry).is_err());
    }
}
