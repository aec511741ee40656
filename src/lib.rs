//! Tag-analysis and storage-tuning tools for OpenStreetMap data processing.
//!
//! The library backs a handful of small command line tools:
//!
//! * `chunk-opt` — local-search optimization of the chunk size table used by
//!   chunked storage files, minimizing total slack (allocated minus used
//!   bytes) over a measured size histogram;
//! * `key-freq` and `filter-kv` — aggregation and filtering of key/value tag
//!   histograms, honoring a list of ignored keys;
//! * `symbolic-tags` — emission of C string-table source for the most
//!   frequent tags;
//! * `render-coverage` — rendering of an on-disk quad-tree tile hierarchy
//!   into an SVG overview image.

pub mod chunking;
mod error;
pub mod histogram;
pub mod quadtree;
pub mod symbolic;

pub use crate::error::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
