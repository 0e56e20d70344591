use epicsum_core::{Catalog, ContentType, EmbeddingTable, Error, MediaRecord, PartitionIndex, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Description of an embedding table, written alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMetadata {
    pub total_items: usize,
    pub embedding_dim: usize,
    pub model_name: String,
    /// Content type -> catalog positions, as seen when the table was built
    pub content_type_index: BTreeMap<String, Vec<usize>>,
}

impl EmbeddingMetadata {
    /// Metadata describing `catalog` embedded with `model_name` at `embedding_dim`
    pub fn describe(catalog: &Catalog, model_name: &str, embedding_dim: usize) -> Self {
        let content_type_index = PartitionIndex::build(catalog)
            .to_sorted_map()
            .into_iter()
            .map(|(content_type, positions)| (content_type.to_string(), positions))
            .collect();
        Self {
            total_items: catalog.len(),
            embedding_dim,
            model_name: model_name.to_string(),
            content_type_index,
        }
    }

    fn typed_index(&self) -> Result<BTreeMap<ContentType, Vec<usize>>> {
        self.content_type_index
            .iter()
            .filter(|(_, positions)| !positions.is_empty())
            .map(|(name, positions)| {
                name.parse::<ContentType>()
                    .map(|content_type| (content_type, positions.clone()))
                    .map_err(Error::Inconsistent)
            })
            .collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|e| Error::MalformedArtifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load the catalog JSON array
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let records: Vec<MediaRecord> = read_json(path)?;
    Ok(Catalog::new(records))
}

pub fn load_metadata(path: &Path) -> Result<EmbeddingMetadata> {
    read_json(path)
}

/// Check metadata and table against the catalog they claim to describe
pub fn validate_artifacts(
    catalog: &Catalog,
    partitions: &PartitionIndex,
    metadata: &EmbeddingMetadata,
    table: &EmbeddingTable,
) -> Result<()> {
    if metadata.total_items != catalog.len() {
        return Err(Error::Inconsistent(format!(
            "metadata describes {} items, catalog has {}",
            metadata.total_items,
            catalog.len()
        )));
    }
    if table.rows() != catalog.len() {
        return Err(Error::Inconsistent(format!(
            "embedding table has {} rows, catalog has {}",
            table.rows(),
            catalog.len()
        )));
    }
    if table.dim() != metadata.embedding_dim {
        return Err(Error::InvalidDimension {
            expected: metadata.embedding_dim,
            actual: table.dim(),
        });
    }

    let recorded = metadata.typed_index()?;
    let derived = partitions.to_sorted_map();
    if recorded != derived {
        let summary = |map: &BTreeMap<ContentType, Vec<usize>>| {
            map.iter()
                .map(|(ct, positions)| format!("{}={}", ct, positions.len()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(Error::Inconsistent(format!(
            "content type index [{}] does not match catalog [{}]",
            summary(&recorded),
            summary(&derived)
        )));
    }

    Ok(())
}
