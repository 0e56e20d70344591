use crate::catalog::{Catalog, ContentType};
use crate::embedder::QueryEmbedder;
use crate::lexical::{normalize, LexicalQuery, LexicalScorer};
use crate::partition::PartitionIndex;
use crate::semantic::SemanticIndex;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// Default cap on ranked and fallback result lists
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Semantic search fetches this many times the partition size before filtering
pub const DEFAULT_OVERFETCH: usize = 2;

/// Configuration for a retriever
#[derive(Debug, Clone, Copy)]
pub struct RetrieverConfig {
    pub limit: usize,
    pub overfetch: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RESULT_LIMIT,
            overfetch: DEFAULT_OVERFETCH,
        }
    }
}

/// Vector search plus the embedder that produces its query vectors
#[derive(Clone)]
pub struct SemanticSearcher {
    index: Arc<SemanticIndex>,
    embedder: Arc<dyn QueryEmbedder>,
}

impl SemanticSearcher {
    pub fn new(index: Arc<SemanticIndex>, embedder: Arc<dyn QueryEmbedder>) -> Result<Self> {
        if index.dim() != embedder.dim() {
            return Err(Error::InvalidDimension {
                expected: index.dim(),
                actual: embedder.dim(),
            });
        }
        Ok(Self { index, embedder })
    }

    #[inline]
    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    #[inline]
    pub fn embedder(&self) -> &dyn QueryEmbedder {
        self.embedder.as_ref()
    }
}

impl std::fmt::Debug for SemanticSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticSearcher")
            .field("rows", &self.index.len())
            .field("dim", &self.index.dim())
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

/// How candidates are scored
#[derive(Debug, Clone)]
pub enum Strategy {
    Lexical(LexicalScorer),
    Semantic(SemanticSearcher),
}

impl Strategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Lexical(_) => StrategyKind::Lexical,
            Strategy::Semantic(_) => StrategyKind::Semantic,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Strategy discriminant, for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Lexical,
    Semantic,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Lexical => "lexical",
            StrategyKind::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage of the fallback chain produced a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scored,
    Unranked,
}

/// A catalog position with the score it was ranked by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPosition {
    pub position: usize,
    /// `None` for unranked fallback entries
    pub score: Option<f64>,
}

/// Non-empty result list for one query
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub stage: Stage,
    pub results: Vec<ScoredPosition>,
}

impl Retrieval {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.results.iter().map(|r| r.position)
    }
}

/// Runs the configured strategy within one content-type partition and falls
/// back to the unranked partition when nothing scores.
#[derive(Debug, Clone)]
pub struct Retriever {
    catalog: Arc<Catalog>,
    partitions: Arc<PartitionIndex>,
    strategy: Strategy,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(
        catalog: Arc<Catalog>,
        partitions: Arc<PartitionIndex>,
        strategy: Strategy,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            catalog,
            partitions,
            strategy,
            config,
        }
    }

    /// Lexical retriever over a catalog, partitions derived here
    pub fn lexical(catalog: Arc<Catalog>) -> Self {
        let partitions = Arc::new(PartitionIndex::build(&catalog));
        Self::new(
            catalog,
            partitions,
            Strategy::Lexical(LexicalScorer::new()),
            RetrieverConfig::default(),
        )
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn partitions(&self) -> &PartitionIndex {
        &self.partitions
    }

    #[inline]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    #[inline]
    pub fn config(&self) -> RetrieverConfig {
        self.config
    }

    /// Scored → Unranked → NotFound.
    ///
    /// Returns `Error::NotFound` only when the partition is empty; any
    /// non-empty partition yields a non-empty list.
    pub fn retrieve(&self, query: &str, content_type: ContentType) -> Result<Retrieval> {
        let partition = self.partitions.get(content_type);
        if partition.is_empty() {
            return Err(Error::NotFound(content_type));
        }

        let mut scored = self.score(query, content_type, partition)?;
        if !scored.is_empty() {
            // Stable: equal scores keep catalog order
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(self.config.limit);
            return Ok(Retrieval {
                stage: Stage::Scored,
                results: scored
                    .into_iter()
                    .map(|(position, score)| ScoredPosition {
                        position,
                        score: Some(score),
                    })
                    .collect(),
            });
        }

        tracing::debug!(
            "No scored {} candidates for {:?}, returning unranked partition",
            content_type,
            query
        );
        Ok(Retrieval {
            stage: Stage::Unranked,
            results: partition
                .iter()
                .take(self.config.limit)
                .map(|&position| ScoredPosition {
                    position,
                    score: None,
                })
                .collect(),
        })
    }

    /// Nearest neighbours fetched before the content type filter:
    /// `overfetch × partition`, never more than the catalog holds
    fn candidate_window(&self, partition_len: usize) -> usize {
        self.config
            .overfetch
            .saturating_mul(partition_len)
            .min(self.catalog.len())
    }

    /// Candidates in catalog order (lexical) or similarity order (semantic)
    fn score(
        &self,
        query: &str,
        content_type: ContentType,
        partition: &[usize],
    ) -> Result<Vec<(usize, f64)>> {
        match &self.strategy {
            Strategy::Lexical(scorer) => {
                let query = LexicalQuery::new(query);
                Ok(partition
                    .par_iter()
                    .map(|&position| (position, scorer.score_record(&query, &self.catalog[position])))
                    .filter(|(_, score)| *score > 0.0)
                    .collect())
            }
            Strategy::Semantic(searcher) => {
                let k = self.candidate_window(partition.len());
                // path segments arrive hyphenated; embed them as words
                let vector = searcher.embedder.embed(&normalize(query))?;
                let hits = searcher.index.search(&vector, k)?;
                Ok(hits
                    .into_iter()
                    .filter(|(position, _)| {
                        self.catalog
                            .get(*position)
                            .is_some_and(|record| record.content_type == content_type)
                    })
                    .map(|(position, similarity)| (position, similarity as f64))
                    .collect())
            }
        }
    }
}
