//! The unfolded hippocampal grid

use crate::error::{Error, Result};
use crate::field::ScalarField;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use std::borrow::Cow;

/// Rows of the canonical unfolded grid (proximal-distal axis)
pub const UNFOLDED_ROWS: usize = 126;
/// Columns of the canonical unfolded grid (anterior-posterior axis)
pub const UNFOLDED_COLS: usize = 254;

/// A scalar field reparameterised onto the unfolded hippocampal sheet.
///
/// The grid is always `UNFOLDED_ROWS x UNFOLDED_COLS`, stored row-major, and
/// is treated as toroidal: both axes wrap around.
///
/// # Example
///
/// ```ignore
/// use hippomaps_core::{ScalarField, UnfoldedGridMapper};
///
/// let grid = UnfoldedGridMapper::to_grid(&field)?;
/// let back = UnfoldedGridMapper::to_field(&grid);
/// assert_eq!(back, field);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UnfoldedGrid {
    data: Array2<f64>,
}

impl UnfoldedGrid {
    /// Create a grid filled with zeros
    pub fn zeros() -> Self {
        Self {
            data: Array2::zeros((UNFOLDED_ROWS, UNFOLDED_COLS)),
        }
    }

    /// Create a grid filled with a specific value
    pub fn filled(value: f64) -> Self {
        Self {
            data: Array2::from_elem((UNFOLDED_ROWS, UNFOLDED_COLS), value),
        }
    }

    /// Create a grid from row-major values
    pub fn from_vec(values: Vec<f64>) -> Result<Self> {
        let expected = UNFOLDED_ROWS * UNFOLDED_COLS;
        if values.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        let data = Array2::from_shape_vec((UNFOLDED_ROWS, UNFOLDED_COLS), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self { data })
    }

    /// Create a grid from an ndarray, which must have the canonical shape
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        if data.dim() != (UNFOLDED_ROWS, UNFOLDED_COLS) {
            return Err(Error::ShapeMismatch {
                expected: UNFOLDED_ROWS * UNFOLDED_COLS,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: UNFOLDED_ROWS,
                cols: UNFOLDED_COLS,
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: UNFOLDED_ROWS,
                cols: UNFOLDED_COLS,
            }),
        }
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Row-major values, borrowed when the storage is already contiguous
    pub fn values(&self) -> Cow<'_, [f64]> {
        match self.data.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.data.iter().copied().collect()),
        }
    }
}

/// Converts between vertex-ordered fields and the unfolded grid.
///
/// The `unfoldiso` tessellation enumerates its vertices row by row, so the
/// mapping is a plain row-major reshape.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnfoldedGridMapper;

impl UnfoldedGridMapper {
    /// Reshape a length-32004 field into the 126x254 grid
    pub fn to_grid(field: &ScalarField) -> Result<UnfoldedGrid> {
        UnfoldedGrid::from_vec(field.values().to_vec())
    }

    /// Flatten a grid back into a field, row-major
    pub fn to_field(grid: &UnfoldedGrid) -> ScalarField {
        ScalarField::new(grid.data.iter().copied().collect())
    }
}
