use crate::simd::dot_product_simd;
use crate::vector::EmbeddingTable;
use crate::{Error, Result};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Rows per rayon task when scanning the table
const SCAN_CHUNK_ROWS: usize = 4096;

/// Scored row, ordered so the heap top is the worst of the kept set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    position: usize,
    similarity: OrderedFloat<f32>,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // "Greater" means worse: lower similarity, then higher position
        other
            .similarity
            .cmp(&self.similarity)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exact inner-product index over unit-normalized rows.
///
/// On unit vectors the inner product is the cosine similarity. The index is
/// built once and never updated.
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    table: EmbeddingTable,
}

impl SemanticIndex {
    pub fn new(table: EmbeddingTable) -> Self {
        Self { table }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.table.dim()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.rows()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &EmbeddingTable {
        &self.table
    }

    /// The `k` rows with the largest inner product against `query`,
    /// most similar first, ties broken by ascending position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim() {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let dim = self.dim();
        let chunk_len = SCAN_CHUNK_ROWS * dim;

        // Each chunk keeps its own top-k, then the partial heaps are merged
        let merged = self
            .table
            .as_slice()
            .par_chunks(chunk_len)
            .enumerate()
            .map(|(chunk_idx, chunk)| {
                let base = chunk_idx * SCAN_CHUNK_ROWS;
                let mut heap = BinaryHeap::with_capacity(k + 1);
                for (offset, row) in chunk.chunks_exact(dim).enumerate() {
                    push_bounded(
                        &mut heap,
                        Candidate {
                            position: base + offset,
                            similarity: OrderedFloat(dot_product_simd(query, row)),
                        },
                        k,
                    );
                }
                heap
            })
            .reduce(
                || BinaryHeap::with_capacity(k + 1),
                |mut acc, other| {
                    for candidate in other {
                        push_bounded(&mut acc, candidate, k);
                    }
                    acc
                },
            );

        // Ascending by Ord = best first
        Ok(merged
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.position, c.similarity.into_inner()))
            .collect())
    }
}

#[inline]
fn push_bounded(heap: &mut BinaryHeap<Candidate>, candidate: Candidate, k: usize) {
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek() {
        if candidate < *worst {
            heap.pop();
            heap.push(candidate);
        }
    }
}
