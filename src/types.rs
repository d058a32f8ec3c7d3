use serde::Serialize;

/// Surrogate key assigned by the catalog database
pub type RowId = i64;

/// Perfume concentration derived from the feed's product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerfumeType {
    EauDeToilette,
    EauDeParfum,
    EauDeCologne,
    Unknown,
}

impl PerfumeType {
    /// Label stored in `perfumes.type`
    pub fn as_str(&self) -> &'static str {
        match self {
            PerfumeType::EauDeToilette => "Eau de Toilette",
            PerfumeType::EauDeParfum => "Eau de Parfum",
            PerfumeType::EauDeCologne => "Eau de Cologne",
            PerfumeType::Unknown => "Unknown Type",
        }
    }
}

/// A feed entry after cleaning and defaulting, ready to be loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPerfume {
    pub name: String,
    pub brand_name: String,
    pub gender: Option<String>,
    pub perfume_type: PerfumeType,
    pub description: String,
    pub image_url: Option<String>,
    pub price: f64,
    /// Kept for completeness; the catalog has no column for it
    pub size: Option<String>,
    pub link: Option<String>,
    pub product_highlight: Option<String>,
}

/// Row written to `perfumes`
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerfume<'a> {
    pub name: &'a str,
    pub brand_id: RowId,
    pub gender: Option<&'a str>,
    pub perfume_type: &'a str,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
}

/// Row written to `stores`
#[derive(Debug, Clone, PartialEq)]
pub struct NewStoreListing<'a> {
    pub perfume_id: RowId,
    pub store_name: &'a str,
    pub price: f64,
    pub currency: &'a str,
    pub url: Option<&'a str>,
}
