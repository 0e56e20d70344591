use crate::artifacts::{load_catalog, load_metadata, validate_artifacts};
use crate::npy::read_table;
use chrono::{DateTime, Utc};
use epicsum_core::{
    embedder_for_model, Catalog, ContentType, EmbeddingTable, Error, LexicalScorer, LookupOutcome,
    LookupRequest, PartitionIndex, QueryEmbedder, Result, Retriever, RetrieverConfig,
    SemanticIndex, SemanticSearcher, Strategy, StrategyKind,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the startup artifacts live and how retrieval is tuned
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub catalog_path: PathBuf,
    /// Embedding table; semantic retrieval is enabled when set
    pub embeddings_path: Option<PathBuf>,
    /// Required together with `embeddings_path`
    pub metadata_path: Option<PathBuf>,
    pub retriever: RetrieverConfig,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(catalog_path: P) -> Self {
        Self {
            catalog_path: catalog_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_embeddings<P: AsRef<Path>, Q: AsRef<Path>>(mut self, table: P, metadata: Q) -> Self {
        self.embeddings_path = Some(table.as_ref().to_path_buf());
        self.metadata_path = Some(metadata.as_ref().to_path_buf());
        self
    }
}

/// Counts per content type
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogStats {
    pub total_items: usize,
    pub images: usize,
    pub videos: usize,
}

/// What was loaded at startup
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub catalog_loaded: bool,
    pub embeddings_loaded: bool,
    pub embedder_loaded: bool,
    pub strategy: StrategyKind,
    pub model_name: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl StoreStatus {
    /// Every component the active strategy needs is present
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self.strategy {
            StrategyKind::Semantic => {
                self.catalog_loaded && self.embeddings_loaded && self.embedder_loaded
            }
            StrategyKind::Lexical => self.catalog_loaded,
        }
    }
}

/// Read-only engine state, built once at startup and shared by all requests
pub struct MediaStore {
    retriever: Retriever,
    stats: CatalogStats,
    status: StoreStatus,
}

impl MediaStore {
    /// Load and validate every configured artifact, in dependency order.
    /// Any failure here means the service must not start.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let catalog = load_catalog(&config.catalog_path)?;
        tracing::info!(
            "Loaded {} media items from {}",
            catalog.len(),
            config.catalog_path.display()
        );

        match (&config.embeddings_path, &config.metadata_path) {
            (None, None) => Ok(Self::lexical(catalog, config.retriever)),
            (Some(table_path), Some(metadata_path)) => {
                let metadata = load_metadata(metadata_path)?;
                let table = read_table(table_path, metadata.embedding_dim)?;

                let partitions = PartitionIndex::build(&catalog);
                validate_artifacts(&catalog, &partitions, &metadata, &table)?;

                tracing::info!(
                    "Loaded {} x {} embedding table ({})",
                    table.rows(),
                    table.dim(),
                    metadata.model_name
                );

                let embedder = embedder_for_model(&metadata.model_name, metadata.embedding_dim)?;
                Self::semantic_with_partitions(catalog, partitions, table, embedder, config.retriever)
            }
            _ => Err(Error::InvalidConfig(
                "embeddings and metadata paths must be given together".to_string(),
            )),
        }
    }

    /// Text-only store; no embeddings involved
    pub fn lexical(catalog: Catalog, config: RetrieverConfig) -> Self {
        let catalog = Arc::new(catalog);
        let partitions = Arc::new(PartitionIndex::build(&catalog));
        let retriever = Retriever::new(
            catalog,
            partitions,
            Strategy::Lexical(LexicalScorer::new()),
            config,
        );
        Self::assemble(retriever, None)
    }

    /// Vector store over a table with one row per catalog record
    pub fn semantic(
        catalog: Catalog,
        table: EmbeddingTable,
        embedder: Arc<dyn QueryEmbedder>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        if table.rows() != catalog.len() {
            return Err(Error::Inconsistent(format!(
                "embedding table has {} rows, catalog has {}",
                table.rows(),
                catalog.len()
            )));
        }
        let partitions = PartitionIndex::build(&catalog);
        Self::semantic_with_partitions(catalog, partitions, table, embedder, config)
    }

    fn semantic_with_partitions(
        catalog: Catalog,
        partitions: PartitionIndex,
        mut table: EmbeddingTable,
        embedder: Arc<dyn QueryEmbedder>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        let fixed = table.normalize_rows()?;
        if fixed > 0 {
            tracing::warn!("Renormalized {} embedding rows that were not unit length", fixed);
        }
        let model_name = embedder.model_name().to_string();
        let searcher = SemanticSearcher::new(Arc::new(SemanticIndex::new(table)), embedder)?;
        let retriever = Retriever::new(
            Arc::new(catalog),
            Arc::new(partitions),
            Strategy::Semantic(searcher),
            config,
        );
        Ok(Self::assemble(retriever, Some(model_name)))
    }

    fn assemble(retriever: Retriever, model_name: Option<String>) -> Self {
        let strategy = retriever.strategy().kind();
        let semantic = strategy == StrategyKind::Semantic;
        let catalog = retriever.catalog();
        let stats = CatalogStats {
            total_items: catalog.len(),
            images: retriever.partitions().len_of(ContentType::Image),
            videos: retriever.partitions().len_of(ContentType::Video),
        };
        tracing::info!(
            "Catalog ready: {} images, {} videos, {} retrieval",
            stats.images,
            stats.videos,
            strategy
        );

        let status = StoreStatus {
            catalog_loaded: !catalog.is_empty(),
            embeddings_loaded: semantic,
            embedder_loaded: semantic,
            strategy,
            model_name,
            loaded_at: Utc::now(),
        };

        Self {
            retriever,
            stats,
            status,
        }
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        self.retriever.catalog()
    }

    #[inline]
    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    #[inline]
    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    /// Resolve one lookup; blocking, may run model inference
    pub fn lookup(&self, content_type: ContentType, request: &LookupRequest<'_>) -> Result<LookupOutcome> {
        self.retriever.lookup(content_type, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::EmbeddingMetadata;
    use crate::npy::tests::npy_bytes;
    use epicsum_core::{HashingEmbedder, MediaRecord, HASHING_MODEL};
    use std::fs;
    use tempfile::TempDir;

    fn records() -> Vec<MediaRecord> {
        vec![
            MediaRecord::new(ContentType::Image, "red shoe", "red shoe", "http://i/a._AC_UL320_.jpg", None),
            MediaRecord::new(ContentType::Video, "yellow flower", "yellow flower blooming", "http://v/f.mp4", None),
            MediaRecord::new(ContentType::Image, "green hat", "green hat", "http://i/b._AC_UL320_.jpg", None),
        ]
    }

    fn write_artifacts(dir: &TempDir, records: &[MediaRecord], dim: usize) -> StoreConfig {
        let catalog_path = dir.path().join("unified_media_database.json");
        fs::write(&catalog_path, serde_json::to_vec(records).unwrap()).unwrap();

        let embedder = HashingEmbedder::new(dim).unwrap();
        let rows: Vec<Vec<f32>> = records
            .iter()
            .map(|r| embedder.embed_text(&format!("{} {}", r.title, r.description)))
            .collect();
        let table_path = dir.path().join("embeddings.npy");
        fs::write(&table_path, npy_bytes(&rows)).unwrap();

        let metadata = EmbeddingMetadata::describe(&Catalog::new(records.to_vec()), HASHING_MODEL, dim);
        let metadata_path = dir.path().join("embeddings_index.json");
        fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata).unwrap()).unwrap();

        StoreConfig::new(catalog_path).with_embeddings(table_path, metadata_path)
    }

    #[test]
    fn test_open_lexical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, serde_json::to_vec(&records()).unwrap()).unwrap();

        let store = MediaStore::open(&StoreConfig::new(&path)).unwrap();
        assert_eq!(store.status().strategy, StrategyKind::Lexical);
        assert!(store.status().is_ready());
        assert_eq!(store.stats().images, 2);
        assert_eq!(store.stats().videos, 1);
    }

    #[test]
    fn test_readiness_follows_strategy_kind() {
        let mut status = MediaStore::lexical(Catalog::new(records()), RetrieverConfig::default())
            .status()
            .clone();
        assert!(status.is_ready());

        status.strategy = StrategyKind::Semantic;
        assert!(!status.is_ready());
        status.embeddings_loaded = true;
        status.embedder_loaded = true;
        assert!(status.is_ready());

        status.catalog_loaded = false;
        assert!(!status.is_ready());
    }

    #[test]
    fn test_open_semantic() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 64);
        let store = MediaStore::open(&config).unwrap();
        assert_eq!(store.status().strategy, StrategyKind::Semantic);
        assert_eq!(store.status().model_name.as_deref(), Some(HASHING_MODEL));
        assert!(store.status().is_ready());

        let outcome = store
            .lookup(ContentType::Image, &LookupRequest { description: "green hat", ..Default::default() })
            .unwrap();
        assert_eq!(outcome.record.title, "green hat");
    }

    #[test]
    fn test_row_count_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 16);
        // catalog grows after the embeddings were produced
        let mut grown = records();
        grown.push(MediaRecord::new(ContentType::Image, "x", "x", "l", None));
        fs::write(&config.catalog_path, serde_json::to_vec(&grown).unwrap()).unwrap();

        let err = MediaStore::open(&config).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_model_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 16);
        let metadata_path = config.metadata_path.clone().unwrap();
        let mut metadata: EmbeddingMetadata =
            serde_json::from_slice(&fs::read(&metadata_path).unwrap()).unwrap();
        metadata.model_name = "bert-base".to_string();
        fs::write(&metadata_path, serde_json::to_vec(&metadata).unwrap()).unwrap();

        assert!(matches!(MediaStore::open(&config), Err(Error::UnknownModel(_))));
    }

    #[test]
    fn test_missing_and_malformed_catalog() {
        let dir = TempDir::new().unwrap();
        let missing = StoreConfig::new(dir.path().join("nope.json"));
        assert!(matches!(MediaStore::open(&missing), Err(Error::Io(_))));

        let path = dir.path().join("bad.json");
        fs::write(&path, b"{\"not\": \"an array\"}").unwrap();
        assert!(matches!(
            MediaStore::open(&StoreConfig::new(&path)),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_non_finite_rows_are_fatal() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 4);
        let table_path = config.embeddings_path.clone().unwrap();
        let rows = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![f32::NAN, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        ];
        fs::write(&table_path, npy_bytes(&rows)).unwrap();

        match MediaStore::open(&config) {
            Err(e @ Error::Inconsistent(_)) => assert!(e.is_configuration()),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("store opened over a NaN row"),
        }
    }

    #[test]
    fn test_zero_rows_are_fatal() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 4);
        let table_path = config.embeddings_path.clone().unwrap();
        let rows = vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0; 4], vec![0.0, 1.0, 0.0, 0.0]];
        fs::write(&table_path, npy_bytes(&rows)).unwrap();

        assert!(matches!(MediaStore::open(&config), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn test_non_unit_rows_renormalized() {
        let dir = TempDir::new().unwrap();
        let config = write_artifacts(&dir, &records(), 2);
        let table_path = config.embeddings_path.clone().unwrap();
        let rows = vec![vec![3.0, 4.0], vec![0.0, 2.0], vec![1.0, 0.0]];
        fs::write(&table_path, npy_bytes(&rows)).unwrap();

        let store = MediaStore::open(&config).unwrap();
        let Strategy::Semantic(searcher) = store.retriever().strategy() else {
            panic!("expected semantic strategy");
        };
        let row = searcher.index().table().row(1).unwrap();
        assert!((row[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_half_configured_embeddings_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = write_artifacts(&dir, &records(), 16);
        config.metadata_path = None;
        assert!(matches!(MediaStore::open(&config), Err(Error::InvalidConfig(_))));
    }
}
