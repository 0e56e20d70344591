//! # epicsum
//!
//! Media lookup service: resolves a free-text description such as
//! `tshirt-having-collar___2` to one image or video link from a catalog.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! epicsum --catalog unified_media_database.json --port 8082
//! epicsum --catalog unified_media_database.json \
//!     --embeddings embeddings.npy --metadata embeddings_index.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use epicsum::prelude::*;
//!
//! let catalog = Catalog::new(vec![
//!     MediaRecord::new(ContentType::Image, "red shoe", "red shoe", "http://img/r._AC_UL320_.jpg", None),
//!     MediaRecord::new(ContentType::Image, "blue shoe", "blue shoe", "http://img/b._AC_UL320_.jpg", None),
//! ]);
//! let store = MediaStore::lexical(catalog, RetrieverConfig::default());
//!
//! let request = LookupRequest { description: "shoe", index: Some(RequestedIndex::from(1)), size: Some(500) };
//! let outcome = store.lookup(ContentType::Image, &request).unwrap();
//! assert_eq!(outcome.record.link, "http://img/b._AC_UL480_.jpg");
//! ```
//!
//! ## Crate Structure
//!
//! - `epicsum-core` - catalog, lexical and semantic ranking, fallback chain, selection, link sizing
//! - `epicsum-storage` - catalog and embedding artifact loading and validation
//! - `epicsum-api` - actix-web REST endpoints

pub use epicsum_core::{
    Catalog, ContentType, Error, LookupOutcome, LookupRequest, MediaRecord, RequestedIndex, Result,
    Retriever, RetrieverConfig, Stage,
};

pub use epicsum_storage::{MediaStore, StoreConfig};

pub use epicsum_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, ContentType, Error, LookupOutcome, LookupRequest, MediaRecord, MediaStore,
        RequestedIndex, RestApi, Result, Retriever, RetrieverConfig, Stage, StoreConfig,
    };
}
