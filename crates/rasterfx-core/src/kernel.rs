//! Convolution kernel model and presets.
//!
//! A [`Kernel`] is an immutable value: a `size_y x size_x` weight matrix, the
//! anchor cell aligned with the pixel being computed, a divisor applied
//! after summation, and an additive offset. Editing a kernel produces a new
//! value through one of the `with_*` / [`resized`](Kernel::resized)
//! constructors; callers that present kernels in a UI observe those values
//! themselves.

use crate::error::{FilterError, Result};

/// A 2D convolution kernel.
///
/// Weights are stored row-major: `weights[row * size_x + col]`.
///
/// ```text
///   col →  0    1    2
/// row 0  [ w00  w01  w02 ]
///     1  [ w10 (w11) w12 ]   (w11) = anchor for a centered 3x3 kernel
///     2  [ w20  w21  w22 ]
/// ```
///
/// # Example
///
/// ```
/// use rasterfx_core::Kernel;
///
/// let kernel = Kernel::new(vec![1.0; 9], 3, 3).unwrap().with_divisor(9.0);
/// assert_eq!(kernel.anchor(), (1, 1));
/// assert_eq!(kernel.weight(2, 2), 1.0);
///
/// // Growing the kernel resets it to a neutral identity
/// let bigger = kernel.resized(5, 5).unwrap();
/// assert_eq!(bigger.weight(2, 2), 1.0);
/// assert_eq!(bigger.weight(0, 0), 0.0);
/// assert_eq!(bigger.divisor(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
    size_x: usize,
    size_y: usize,
    anchor_row: usize,
    anchor_col: usize,
    divisor: f32,
    offset: f32,
}

impl Kernel {
    /// Create a kernel from row-major weights.
    ///
    /// The anchor is placed at the center cell `(size_y / 2, size_x / 2)`,
    /// the divisor is 1 and the offset 0.
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
        Ok(Self {
            weights,
            size_x,
            size_y,
            anchor_row: size_y / 2,
            anchor_col: size_x / 2,
            divisor: 1.0,
            offset: 0.0,
        })
    }

    /// Create a kernel from nested rows, e.g. `&[[0.0, -1.0, 0.0], ...]`.
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

    /// Neutral kernel: all zeros except a 1 at the center cell.
    pub fn identity(size_x: usize, size_y: usize) -> Result<Self> {
        check_dimensions(size_x, size_y)?;
        let mut weights = vec![0.0; size_x * size_y];
        weights[(size_y / 2) * size_x + size_x / 2] = 1.0;
        Self::new(weights, size_x, size_y)
    }

    /// A kernel of new dimensions.
    ///
    /// The weights are regenerated as an identity kernel, the anchor moves
    /// to the new center and the divisor resets to 1. The offset is kept.
    pub fn resized(&self, size_x: usize, size_y: usize) -> Result<Self> {
        Ok(Self::identity(size_x, size_y)?.with_offset(self.offset))
    }

    /// Replace all weights, keeping dimensions, anchor, divisor and offset.
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

    /// Replace a single weight.
    pub fn with_weight(&self, row: usize, col: usize, weight: f32) -> Result<Self> {
        if row >= self.size_y || col >= self.size_x {
            return Err(FilterError::invalid(
                "cell",
                format!(
                    "({row}, {col}) outside {}x{} kernel",
                    self.size_y, self.size_x
                ),
            ));
        }
        let mut kernel = self.clone();
        kernel.weights[row * self.size_x + col] = weight;
        Ok(kernel)
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

    /// Set the divisor. Zero is accepted here and rejected when the kernel is applied.
    #[inline]
    pub fn with_divisor(mut self, divisor: f32) -> Self {
        self.divisor = divisor;
        self
    }

    #[inline]
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Sum of all weights, or 1 when the weights cancel out.
    pub fn computed_divisor(&self) -> f32 {
        let sum: f32 = self.weights.iter().sum();
        if sum == 0.0 {
            1.0
        } else {
            sum
        }
    }

    /// Divide every weight by the weight sum and set the divisor to 1.
    ///
    /// Kernels whose weights sum to zero are returned unchanged apart from
    /// the divisor.
    pub fn normalized(&self) -> Self {
        let sum = f64::from(self.computed_divisor());
        Self {
            weights: self
                .weights
                .iter()
                .map(|&w| (f64::from(w) / sum) as f32)
                .collect(),
            divisor: 1.0,
            ..self.clone()
        }
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
    pub fn offset(&self) -> f32 {
        self.offset
    }

    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size_x + col]
    }

    /// Row-major weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// 3x3 box blur, divisor 9.
    pub fn blur() -> Self {
        Self::fixed3([[1.0; 3]; 3]).with_divisor(9.0)
    }

    /// `size x size` Gaussian with standard deviation `sigma`, normalized to sum 1.
    pub fn gaussian(size: usize, sigma: f32) -> Result<Self> {
        check_dimensions(size, size)?;
        if !(sigma > 0.0) {
            return Err(FilterError::invalid(
                "sigma",
                format!("must be positive, got {sigma}"),
            ));
        }
        // Even sizes keep the rows and columns above/left of the center,
        // so the anchor stays at size / 2.
        let half = (size / 2) as i32;
        let two_sigma_sq = 2.0 * f64::from(sigma) * f64::from(sigma);
        let mut raw = Vec::with_capacity(size * size);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                let (dx, dy) = (x - half, y - half);
                raw.push((-f64::from(dx * dx + dy * dy) / two_sigma_sq).exp());
            }
        }
        let sum: f64 = raw.iter().sum();
        let weights = raw.into_iter().map(|w| (w / sum) as f32).collect();
        Ok(Self::new(weights, size, size)?.with_divisor(1.0))
    }

    /// 4-neighbour Gaussian approximation `{0,1,0},{1,4,1},{0,1,0}`, normalized.
    pub fn gaussian_cross() -> Self {
        Self::fixed3([[0.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 0.0]]).normalized()
    }

    pub fn sharpen() -> Self {
        Self::fixed3([[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]])
    }

    pub fn edge_detection() -> Self {
        Self::fixed3([[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]])
    }

    pub fn emboss() -> Self {
        Self::fixed3([[-1.0, -1.0, 0.0], [-1.0, 1.0, 1.0], [0.0, 1.0, 1.0]])
    }

    fn fixed3(rows: [[f32; 3]; 3]) -> Self {
        Self {
            weights: rows.iter().flatten().copied().collect(),
            size_x: 3,
            size_y: 3,
            anchor_row: 1,
            anchor_col: 1,
            divisor: 1.0,
            offset: 0.0,
        }
    }
}

pub(crate) fn check_dimensions(size_x: usize, size_y: usize) -> Result<()> {
    if size_x == 0 || size_y == 0 {
        return Err(FilterError::invalid(
            "size",
            format!("kernel dimensions must be positive, got {size_y}x{size_x}"),
        ));
    }
    Ok(())
}
