//! # epicsum Core
//!
//! Retrieval engine for the epicsum media lookup service.
//!
//! - [`Catalog`] - immutable, ordered media records
//! - [`PartitionIndex`] - catalog positions grouped by content type
//! - [`LexicalScorer`] - word-overlap + block-matching text similarity
//! - [`SemanticIndex`] - exact inner-product search over unit vectors
//! - [`Retriever`] - strategy + fallback chain (Scored → Unranked → NotFound)
//! - [`selection`] - wrap-around index selection and legacy `___<index>` parsing
//! - [`link`] - image size snapping and link rewriting
//!
//! ## Example
//!
//! ```rust
//! use epicsum_core::{Catalog, ContentType, LookupRequest, MediaRecord, Retriever};
//! use std::sync::Arc;
//!
//! let catalog = Catalog::new(vec![
//!     MediaRecord::new(ContentType::Image, "red shoe", "red shoe", "http://img/a._AC_UL320_.jpg", None),
//!     MediaRecord::new(ContentType::Image, "blue shoe", "blue shoe", "http://img/b._AC_UL320_.jpg", None),
//! ]);
//! let retriever = Retriever::lexical(Arc::new(catalog));
//!
//! let request = LookupRequest { description: "shoe___1", index: None, size: Some(1000) };
//! let outcome = retriever.lookup(ContentType::Image, &request).unwrap();
//! assert_eq!(outcome.record.title, "blue shoe");
//! assert_eq!(outcome.record.link, "http://img/b._AC_UL1000_.jpg");
//! ```

pub mod catalog;
pub mod embedder;
pub mod error;
pub mod lexical;
pub mod link;
pub mod lookup;
pub mod matcher;
pub mod partition;
pub mod retriever;
pub mod selection;
pub mod semantic;
pub mod vector;

/// Hardware-accelerated inner product (AVX2/FMA on x86_64, NEON on ARM64)
pub mod simd;

pub use catalog::{Catalog, ContentType, MediaMeta, MediaRecord};
pub use embedder::{embedder_for_model, HashingEmbedder, QueryEmbedder, HASHING_MODEL};
pub use error::{Error, Result};
pub use lexical::{LexicalQuery, LexicalScorer};
pub use lookup::{LookupOutcome, LookupRequest};
pub use partition::PartitionIndex;
pub use retriever::{
    Retrieval, Retriever, RetrieverConfig, ScoredPosition, SemanticSearcher, Stage, Strategy,
    StrategyKind,
};
pub use selection::RequestedIndex;
pub use semantic::SemanticIndex;
pub use vector::EmbeddingTable;

#[cfg(feature = "fastembed")]
pub use embedder::FastEmbedder;
