//! Geometric (spin) null model on the unfolded grid
//!
//! Each permutation rotates the unfolded map by a random whole-degree angle
//! and then translates it by a random whole-cell offset, both with cubic
//! spline interpolation and wraparound on the toroidal sheet. This moves
//! spatial features to random locations while keeping the map's own spatial
//! autocorrelation.
//!
//! Reference:
//! Karat, B. G., DeKraker, J., Hussain, U., Köhler, S., & Khan, A. R. (2023).
//! Mapping the macrostructure and microstructure of the in vivo human
//! hippocampus using diffusion MRI. Human Brain Mapping.

use crate::maybe_rayon::*;
use hippomaps_core::{
    Algorithm, Density, Error, Result, ScalarField, UnfoldedGrid, UnfoldedGridMapper,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::spline::{rotate_wrap, shift_wrap};
use super::{stream_rng, Permuted, PermutationEngine};
use crate::resample::InterpolationMethod;

/// One random rigid transform of the unfolded grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTransform {
    /// Rotation in whole degrees, 1..=359
    pub angle: i32,
    /// Row offset, within +/- rows/2
    pub row_shift: i32,
    /// Column offset, within +/- cols/2
    pub col_shift: i32,
}

impl SpinTransform {
    /// Draw a transform for a grid of the given shape
    pub fn sample(rng: &mut ChaCha8Rng, shape: (usize, usize)) -> Self {
        let half_rows = (shape.0 / 2) as i32;
        let half_cols = (shape.1 / 2) as i32;
        Self {
            angle: rng.gen_range(1..360),
            row_shift: rng.gen_range(-half_rows..=half_rows),
            col_shift: rng.gen_range(-half_cols..=half_cols),
        }
    }

    /// Rotate, then translate
    pub fn apply(&self, grid: &UnfoldedGrid) -> Result<UnfoldedGrid> {
        let rotated = rotate_wrap(grid.data(), self.angle as f64);
        let moved = shift_wrap(&rotated, (self.row_shift as f64, self.col_shift as f64));
        UnfoldedGrid::from_array(moved)
    }
}

/// Parameters for spin permutation
#[derive(Debug, Clone)]
pub struct SpinParams {
    /// Number of permutations
    pub nperm: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SpinParams {
    fn default() -> Self {
        Self {
            nperm: 1000,
            seed: None,
        }
    }
}

/// Geometric permutation engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinPermutation;

impl SpinPermutation {
    /// The transforms used for each permutation index
    pub fn transforms(nperm: usize, seed: u64, shape: (usize, usize)) -> Vec<SpinTransform> {
        (0..nperm)
            .map(|i| SpinTransform::sample(&mut stream_rng(seed, i), shape))
            .collect()
    }

    /// Produce `nperm` randomly rotated and translated copies of `grid`
    pub fn permute(
        &self,
        grid: &UnfoldedGrid,
        nperm: usize,
        seed: Option<u64>,
    ) -> Result<Vec<UnfoldedGrid>> {
        if nperm == 0 {
            return Err(Error::InvalidParameter {
                name: "nperm",
                value: "0".into(),
                reason: "at least one permutation is required".into(),
            });
        }
        let seed = seed.unwrap_or_else(rand::random);
        tracing::debug!(nperm, seed, "spin permutation");

        let transforms = Self::transforms(nperm, seed, grid.shape());
        transforms
            .into_par_iter()
            .map(|t| t.apply(grid))
            .collect()
    }
}

impl Algorithm for SpinPermutation {
    type Input = UnfoldedGrid;
    type Output = Vec<UnfoldedGrid>;
    type Params = SpinParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Spin permutation"
    }

    fn description(&self) -> &'static str {
        "Random rotations and wraparound translations of the unfolded hippocampal grid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        self.permute(&input, params.nperm, params.seed)
    }
}

impl PermutationEngine for SpinPermutation {
    fn name(&self) -> &'static str {
        "geometric"
    }

    fn native_density(&self) -> Option<Density> {
        Some(Density::Unfoldiso)
    }

    fn resample_method(&self) -> InterpolationMethod {
        // keep discrete structure intact before rotation
        InterpolationMethod::Nearest
    }

    fn generate(&self, field: &ScalarField, nperm: usize, seed: Option<u64>) -> Result<Permuted> {
        let grid = UnfoldedGridMapper::to_grid(field)?;
        self.permute(&grid, nperm, seed).map(Permuted::Grids)
    }
}
