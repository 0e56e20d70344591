//! Startup artifact loading for epicsum: catalog JSON, embedding tables
//! and their metadata, validated and assembled into a [`MediaStore`].

pub mod artifacts;
pub mod manager;
pub mod npy;

pub use artifacts::{load_catalog, load_metadata, validate_artifacts, EmbeddingMetadata};
pub use manager::{CatalogStats, MediaStore, StoreConfig, StoreStatus};
pub use npy::read_table;
