//! Dense matrix routines backing the learned operators.
//!
//! The operators of a universal option model are plain row-major `f32`
//! matrices. Updates are rank-one and queries are matrix-vector
//! products, so no tensor backend is involved; the routines here are
//! explicit loops, kept small and covered by tests since numerical
//! drift in these kernels is the most likely regression source.
use crate::error::UomError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A dense row-major matrix of `f32`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Mat {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Mat {
    /// An all-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// The `n`-by-`n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }

    /// The underlying row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Computes `self · x`.
    pub fn matvec(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.cols {
            return Err(UomError::Dimension {
                expected: self.cols,
                got: x.len(),
            }
            .into());
        }
        let mut y = vec![0.0f32; self.rows];
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            y[i] = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
        }
        Ok(y)
    }

    /// Computes `xᵀ · self`, i.e. left multiplication by a row vector.
    pub fn vecmat(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.rows {
            return Err(UomError::Dimension {
                expected: self.rows,
                got: x.len(),
            }
            .into());
        }
        let mut y = vec![0.0f32; self.cols];
        for i in 0..self.rows {
            let xi = x[i];
            if xi == 0.0 {
                continue;
            }
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..self.cols {
                y[j] += xi * row[j];
            }
        }
        Ok(y)
    }

    /// Adds `alpha · u · vᵀ` to the matrix in place.
    ///
    /// This is the rank-one step every incremental operator update
    /// reduces to: `u` is the residual between a target and the current
    /// prediction, `v` the input feature vector.
    pub fn add_scaled_outer(&mut self, u: &[f32], v: &[f32], alpha: f32) -> Result<()> {
        if u.len() != self.rows {
            return Err(UomError::Dimension {
                expected: self.rows,
                got: u.len(),
            }
            .into());
        }
        if v.len() != self.cols {
            return Err(UomError::Dimension {
                expected: self.cols,
                got: v.len(),
            }
            .into());
        }
        for i in 0..self.rows {
            let s = alpha * u[i];
            if s == 0.0 {
                continue;
            }
            let row = &mut self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..self.cols {
                row[j] += s * v[j];
            }
        }
        Ok(())
    }

    /// The largest entry magnitude, used by the divergence guard.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }
}
