use crate::catalog::{Catalog, ContentType};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Content type -> ordered catalog positions of that type.
///
/// Derived once from the catalog. Positions within a partition are in
/// ascending catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionIndex {
    partitions: AHashMap<ContentType, Vec<usize>>,
}

const EMPTY: &[usize] = &[];

impl PartitionIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let mut partitions: AHashMap<ContentType, Vec<usize>> = AHashMap::new();
        for (position, record) in catalog.iter().enumerate() {
            partitions
                .entry(record.content_type)
                .or_default()
                .push(position);
        }
        Self { partitions }
    }

    /// Positions of the given type; empty when the catalog has none
    #[inline]
    pub fn get(&self, content_type: ContentType) -> &[usize] {
        self.partitions
            .get(&content_type)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY)
    }

    #[inline]
    pub fn len_of(&self, content_type: ContentType) -> usize {
        self.get(content_type).len()
    }

    /// Sorted view, used when comparing against persisted metadata
    pub fn to_sorted_map(&self) -> BTreeMap<ContentType, Vec<usize>> {
        self.partitions
            .iter()
            .filter(|(_, positions)| !positions.is_empty())
            .map(|(content_type, positions)| (*content_type, positions.clone()))
            .collect()
    }
}
