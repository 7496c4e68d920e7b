//! Error distribution kernel definitions.
//!
//! An [`ErrorKernel`] is a weight matrix with an anchor, like a convolution
//! [`Kernel`](crate::Kernel), but without an offset and with causal support:
//! only cells strictly after the anchor in raster order receive error. The
//! anchor cell is the pixel being quantized and never receives anything.

use crate::error::{FilterError, Result};
use crate::kernel::check_dimensions;

/// An error diffusion kernel.
///
/// Each neighbor receives `error * weight / divisor`. The total error
/// propagated is `sum(causal weights) / divisor`: most kernels propagate
/// 100%, Atkinson intentionally propagates 75%.
///
/// # Example
///
/// ```
/// use rasterfx_core::ErrorKernel;
///
/// let fs = ErrorKernel::floyd_steinberg();
/// assert_eq!(fs.divisor(), 16.0);
/// assert_eq!(fs.entries(), vec![(1, 0, 7.0), (-1, 1, 3.0), (0, 1, 5.0), (1, 1, 1.0)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorKernel {
    weights: Vec<f32>,
    size_x: usize,
    size_y: usize,
    anchor_row: usize,
    anchor_col: usize,
    divisor: f32,
}

impl ErrorKernel {
    /// Create a kernel from row-major weights.
    ///
    /// The anchor is the center cell and the divisor defaults to the sum
    /// of the causal weights (1 if they sum to zero).
    pub fn new(weights: Vec<f32>, size_x: usize, size_y: usize) -> Result<Self> {
        check_dimensions(size_x, size_y)?;
        if weights.len() != size_x * size_y {
            return Err(FilterError::invalid(
                "weights",
                format!(
                    "expected {} weights for a {size_y}x{size_x} kernel, got {}",
                    size_x * size_y,
                    weights.len()
                ),
            ));
        }
        let mut kernel = Self {
            weights,
            size_x,
            size_y,
            anchor_row: size_y / 2,
            anchor_col: size_x / 2,
            divisor: 1.0,
        };
        let sum: f32 = kernel.entries().iter().map(|&(_, _, w)| w).sum();
        if sum != 0.0 {
            kernel.divisor = sum;
        }
        Ok(kernel)
    }

    /// Create a kernel from nested rows.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let size_y = rows.len();
        let size_x = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.as_ref().len() != size_x) {
            return Err(FilterError::invalid(
                "weights",
                format!("row {bad} has a different length than row 0"),
            ));
        }
        let weights = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::new(weights, size_x, size_y)
    }

    /// A kernel of new dimensions with neutral weights.
    ///
    /// The only non-zero cell is the new center, which is the anchor, so the
    /// result diffuses nothing until weights are set.
    pub fn resized(&self, size_x: usize, size_y: usize) -> Result<Self> {
        check_dimensions(size_x, size_y)?;
        let mut weights = vec![0.0; size_x * size_y];
        weights[(size_y / 2) * size_x + size_x / 2] = 1.0;
        Ok(Self {
            weights,
            size_x,
            size_y,
            anchor_row: size_y / 2,
            anchor_col: size_x / 2,
            divisor: 1.0,
        })
    }

    /// Replace all weights, keeping dimensions, anchor and divisor.
    pub fn with_weights(&self, weights: Vec<f32>) -> Result<Self> {
        if weights.len() != self.weights.len() {
            return Err(FilterError::invalid(
                "weights",
                format!(
                    "expected {} weights for a {}x{} kernel, got {}",
                    self.weights.len(),
                    self.size_y,
                    self.size_x,
                    weights.len()
                ),
            ));
        }
        Ok(Self {
            weights,
            ..self.clone()
        })
    }

    /// Move the anchor; fails when `(row, col)` is outside the matrix.
    pub fn with_anchor(&self, row: usize, col: usize) -> Result<Self> {
        if row >= self.size_y || col >= self.size_x {
            return Err(FilterError::invalid(
                "anchor",
                format!(
                    "({row}, {col}) outside {}x{} kernel",
                    self.size_y, self.size_x
                ),
            ));
        }
        Ok(Self {
            anchor_row: row,
            anchor_col: col,
            ..self.clone()
        })
    }

    /// Set the divisor. Zero is rejected when the kernel is applied.
    #[inline]
    pub fn with_divisor(mut self, divisor: f32) -> Self {
        self.divisor = divisor;
        self
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    /// Anchor as `(row, col)`.
    #[inline]
    pub fn anchor(&self) -> (usize, usize) {
        (self.anchor_row, self.anchor_col)
    }

    #[inline]
    pub fn divisor(&self) -> f32 {
        self.divisor
    }

    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size_x + col]
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Non-zero causal cells as `(dx, dy, weight)`, in raster order.
    ///
    /// - `dx`: horizontal offset from the current pixel (positive = right)
    /// - `dy`: vertical offset (0 = current row, positive = below)
    ///
    /// Cells before the anchor in raster order, and the anchor itself, are
    /// excluded whatever their weight.
    pub fn entries(&self) -> Vec<(i32, i32, f32)> {
        let mut entries = Vec::new();
        for row in self.anchor_row..self.size_y {
            let first_col = if row == self.anchor_row {
                self.anchor_col + 1
            } else {
                0
            };
            for col in first_col..self.size_x {
                let weight = self.weight(row, col);
                if weight != 0.0 {
                    entries.push((
                        col as i32 - self.anchor_col as i32,
                        (row - self.anchor_row) as i32,
                        weight,
                    ));
                }
            }
        }
        entries
    }

    /// Floyd-Steinberg: 4 neighbors, 100% propagation (16/16).
    ///
    /// ```text
    ///        X   7
    ///    3   5   1
    /// ```
    pub fn floyd_steinberg() -> Self {
        Self::preset(&[[0.0, 0.0, 0.0], [0.0, 0.0, 7.0], [3.0, 5.0, 1.0]], 16.0)
    }

    /// Burkes: 7 neighbors over 2 rows, 100% propagation (32/32).
    ///
    /// ```text
    ///            X   8   4
    ///    2   4   8   4   2
    /// ```
    pub fn burkes() -> Self {
        Self::preset(
            &[
                [0.0, 0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 8.0, 4.0],
                [2.0, 4.0, 8.0, 4.0, 2.0],
            ],
            32.0,
        )
    }

    /// Stucky: 12 neighbors over 3 rows, 100% propagation (42/42).
    ///
    /// ```text
    ///            X   8   4
    ///    2   4   8   4   2
    ///    1   2   4   2   1
    /// ```
    pub fn stucky() -> Self {
        Self::preset(
            &[
                [0.0; 5],
                [0.0; 5],
                [0.0, 0.0, 0.0, 8.0, 4.0],
                [2.0, 4.0, 8.0, 4.0, 2.0],
                [1.0, 2.0, 4.0, 2.0, 1.0],
            ],
            42.0,
        )
    }

    /// Sierra: 10 neighbors over 3 rows, 100% propagation (32/32).
    ///
    /// ```text
    ///            X   5   3
    ///    2   4   5   4   2
    ///        2   3   2
    /// ```
    pub fn sierra() -> Self {
        Self::preset(
            &[
                [0.0; 5],
                [0.0; 5],
                [0.0, 0.0, 0.0, 5.0, 3.0],
                [2.0, 4.0, 5.0, 4.0, 2.0],
                [0.0, 2.0, 3.0, 2.0, 0.0],
            ],
            32.0,
        )
    }

    /// Atkinson: 6 neighbors, 75% propagation (6/8).
    ///
    /// ```text
    ///        X   1   1
    ///    1   1   1
    ///        1
    /// ```
    pub fn atkinson() -> Self {
        Self::preset(
            &[
                [0.0; 5],
                [0.0; 5],
                [0.0, 0.0, 0.0, 1.0, 1.0],
                [0.0, 1.0, 1.0, 1.0, 0.0],
                [0.0, 0.0, 1.0, 0.0, 0.0],
            ],
            8.0,
        )
    }

    fn preset<const N: usize>(rows: &[[f32; N]], divisor: f32) -> Self {
        let size_y = rows.len();
        Self {
            weights: rows.iter().flatten().copied().collect(),
            size_x: N,
            size_y,
            anchor_row: size_y / 2,
            anchor_col: N / 2,
            divisor,
        }
    }
}
