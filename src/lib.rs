pub mod catalog;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{ImportError, Result};
pub use pipeline::{run_import, ImportReport};
