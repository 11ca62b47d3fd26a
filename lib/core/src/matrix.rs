//! Dense row-major feature matrix
//!
//! Candidate rows are gathered once into a contiguous `f32` buffer so that
//! weighting and metric evaluation run as bulk, row-parallel passes instead
//! of per-cell lookups.

use rayon::prelude::*;

use crate::table::FeatureTable;
use crate::{simd, Error, Result};

// Below this many rows a parallel pass costs more than it saves
const PAR_MIN_ROWS: usize = 2048;

/// Row-major matrix of `rows x dim` features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    dim: usize,
    data: Vec<f32>,
}

/// Replace missing or non-finite values with 0
#[inline]
pub fn sanitize(value: Option<f64>) -> f32 {
    match value {
        // finite f64 values beyond the f32 range saturate instead of becoming inf
        Some(v) if v.is_finite() => (v as f32).clamp(f32::MIN, f32::MAX),
        _ => 0.0,
    }
}

impl FeatureMatrix {
    /// Gather `features` for the given table rows. Every feature must be a
    /// column of the table; missing and non-finite cells become 0.
    pub fn gather(table: &FeatureTable, features: &[String], rows: &[usize]) -> Result<Self> {
        let columns = features
            .iter()
            .map(|name| {
                table
                    .column(name)
                    .map(|c| c.values.as_slice())
                    .ok_or_else(|| Error::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let dim = columns.len();
        let mut data = vec![0.0f32; rows.len() * dim];
        if dim > 0 {
            for (out, &row) in data.chunks_exact_mut(dim).zip(rows) {
                for (cell, column) in out.iter_mut().zip(&columns) {
                    *cell = sanitize(column[row]);
                }
            }
        }

        Ok(Self { dim, data })
    }

    /// Single-row matrix from an explicit vector (non-finite values become 0)
    pub fn from_row(values: &[f32]) -> Self {
        Self {
            dim: values.len(),
            data: values.iter().map(|v| if v.is_finite() { *v } else { 0.0 }).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn rows(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn row(&self, idx: usize) -> &[f32] {
        &self.data[idx * self.dim..(idx + 1) * self.dim]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Multiply every row element-wise by `weights`
    pub fn scale_columns(&mut self, weights: &[f32]) -> Result<()> {
        if weights.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: weights.len(),
            });
        }
        if self.dim == 0 {
            return Ok(());
        }
        if self.rows() >= PAR_MIN_ROWS {
            self.data
                .par_chunks_exact_mut(self.dim)
                .for_each(|row| simd::scale_in_place(row, weights));
        } else {
            self.data
                .chunks_exact_mut(self.dim)
                .for_each(|row| simd::scale_in_place(row, weights));
        }
        Ok(())
    }

    /// Apply `f(query, row)` to every row, in row order
    pub fn map_rows<T, F>(&self, query: &[f32], f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&[f32], &[f32]) -> T + Sync,
    {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if self.dim == 0 {
            return Ok(Vec::new());
        }
        let scores = if self.rows() >= PAR_MIN_ROWS {
            self.data
                .par_chunks_exact(self.dim)
                .map(|row| f(query, row))
                .collect()
        } else {
            self.data.chunks_exact(self.dim).map(|row| f(query, row)).collect()
        };
        Ok(scores)
    }

    /// Cosine similarity of `query` against every row. A zero-norm side
    /// scores 0; results are clamped to [-1, 1]. Rows whose f32 sums
    /// overflow are rescored with f64 accumulation.
    pub fn cosine_scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        let query_norm = match simd::norm(query) {
            n if n.is_finite() => n as f64,
            _ => simd::norm_wide(query),
        };
        self.map_rows(query, |q, row| {
            let (dot, row_norm) = (simd::dot(q, row), simd::norm(row));
            let (dot, row_norm) = if dot.is_finite() && row_norm.is_finite() {
                (dot as f64, row_norm as f64)
            } else {
                (simd::dot_wide(q, row), simd::norm_wide(row))
            };
            if query_norm == 0.0 || row_norm == 0.0 {
                return 0.0;
            }
            (dot / (query_norm * row_norm)).clamp(-1.0, 1.0) as f32
        })
    }

    /// Euclidean distance of `query` to every row, in f64 so that distances
    /// between extreme rows stay finite
    pub fn euclidean_distances(&self, query: &[f32]) -> Result<Vec<f64>> {
        self.map_rows(query, |q, row| match simd::squared_l2(q, row) {
            d if d.is_finite() => (d as f64).sqrt(),
            _ => simd::squared_l2_wide(q, row).sqrt(),
        })
    }
}
