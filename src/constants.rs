/// Feed vocabulary and catalog defaults.
/// The marker strings are the literal texts found in the Notino HU Google Shopping
/// export: category names are English, product types are Czech, and the product
/// highlight block is Hungarian.

/// Tag of the repeated product element under the feed root
pub const ENTRY_TAG: &str = "entry";

/// Child element names of an `entry`
pub mod tags {
    pub const CATEGORY: &str = "google_product_category_name";
    pub const PRODUCT_TYPE: &str = "product_type";
    pub const TITLE: &str = "title";
    pub const BRAND: &str = "brand";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE_LINK: &str = "image_link";
    pub const PRICE: &str = "price";
    pub const GENDER: &str = "gender";
    pub const SIZE: &str = "size";
    pub const LINK: &str = "link";
    pub const PRODUCT_HIGHLIGHT: &str = "product_highlight";
}

// Entry filter markers
pub const FRAGRANCE_CATEGORY_MARKER: &str = "Perfume & Cologne";
pub const SOAP_MARKER: &str = "Mýdla";

// Perfume type markers, checked in this order
pub const EAU_DE_TOILETTE_MARKER: &str = "Toaletní vody";
pub const EAU_DE_PARFUM_MARKER: &str = "Parfémované vody";
pub const EAU_DE_COLOGNE_MARKER: &str = "Kolínské vody";

/// Label that opens the scent note list inside the product highlight
pub const NOTES_MARKER: &str = "Az illat fajtája:";

/// Labels of the sections that may follow the scent note list
pub const NOTES_SECTION_END_MARKERS: [&str; 9] = [
    "Intenzitás:",
    "Market type:",
    "Fenntarthatóság:",
    "Csomagolás:",
    "Konzisztencia:",
    "újratölthető kivitel",
    "Hatóanyag:",
    "Hajkiegészítő típusa:",
    "Bőrtípus:",
];

// Store listing
pub const DEFAULT_STORE_NAME: &str = "Notino";
pub const DEFAULT_CURRENCY: &str = "HUF";

/// Type given to every note the importer creates
pub const NEW_NOTE_TYPE: &str = "unknown";

// Substitutes for missing feed fields
pub const UNKNOWN_NAME: &str = "Unknown Name";
pub const DEFAULT_TITLE: &str = "Unknown Title";
pub const DEFAULT_BRAND: &str = "Unknown Brand";
pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_IMAGE_URL: &str = "No image URL";
pub const DEFAULT_GENDER: &str = "unisex";
pub const DEFAULT_SIZE: &str = "Unknown Size";
pub const DEFAULT_LINK: &str = "No link available";
pub const DEFAULT_PRICE: f64 = 0.0;
