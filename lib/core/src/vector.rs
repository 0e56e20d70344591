use crate::{Error, Result};

/// Tolerance on the L2 norm before a row counts as not unit length
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

/// Normalize a vector to unit length in place; zero vectors are left alone.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let norm = crate::simd::norm_simd(v);
    if norm > f32::EPSILON {
        let inv_norm = 1.0 / norm;
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Fixed-dimension embedding rows, one per catalog position.
///
/// Rows live in one contiguous row-major buffer so a full scan walks memory
/// linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    data: Vec<f32>,
    dim: usize,
}

impl EmbeddingTable {
    /// Wrap a row-major buffer. `data.len()` must be a multiple of `dim`.
    pub fn from_flat(data: Vec<f32>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        if data.len() % dim != 0 {
            return Err(Error::Inconsistent(format!(
                "{} values do not form rows of dimension {}",
                data.len(),
                dim
            )));
        }
        Ok(Self { data, dim })
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::Inconsistent(format!(
                    "row {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_flat(data, dim)
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.len() / self.dim
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Rescale every row whose norm is off by more than the tolerance.
    /// Returns how many rows were rescaled.
    ///
    /// Rows holding NaN or infinite values, or with zero norm, have no
    /// direction to rank by and fail the whole table.
    pub fn normalize_rows(&mut self) -> Result<usize> {
        let mut fixed = 0;
        for (position, row) in self.data.chunks_exact_mut(self.dim).enumerate() {
            if row.iter().any(|x| !x.is_finite()) {
                return Err(Error::Inconsistent(format!(
                    "embedding row {} contains non-finite values",
                    position
                )));
            }
            let norm = crate::simd::norm_simd(row);
            if !norm.is_finite() || norm <= f32::EPSILON {
                return Err(Error::Inconsistent(format!(
                    "embedding row {} has norm {} and cannot be normalized",
                    position, norm
                )));
            }
            if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
                normalize(row);
                fixed += 1;
            }
        }
        Ok(fixed)
    }
}
