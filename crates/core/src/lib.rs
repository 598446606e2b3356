//! # HippoMaps Core
//!
//! Core types, traits and I/O for statistical testing of hippocampal surface maps.
//!
//! This crate provides:
//! - `ScalarField`: one value per surface vertex at a given tessellation
//! - `UnfoldedGrid`: the fixed 126x254 toroidal unfolded representation
//! - `SurfaceMesh`: vertices and triangular faces of a reference surface
//! - `VertexCountRegistry`: vertex counts per (label, density)
//! - `ResourceConfig`: explicit location of the packaged reference data
//! - Loader and renderer collaborator traits

pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;
pub mod mesh;
pub mod plot;
pub mod registry;
pub mod tessellation;

pub use config::{ResourceConfig, SurfaceSpace};
pub use error::{Error, Result};
pub use field::{FieldStatistics, ScalarField};
pub use grid::{UnfoldedGrid, UnfoldedGridMapper, UNFOLDED_COLS, UNFOLDED_ROWS};
pub use mesh::SurfaceMesh;
pub use plot::{PointStyle, Renderer, ScatterPlot, ScatterPoint};
pub use registry::VertexCountRegistry;
pub use tessellation::{Density, Label};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::field::ScalarField;
    pub use crate::grid::{UnfoldedGrid, UnfoldedGridMapper};
    pub use crate::io::{MapLoader, MapSource, MeshLoader};
    pub use crate::mesh::SurfaceMesh;
    pub use crate::registry::VertexCountRegistry;
    pub use crate::tessellation::{Density, Label};
    pub use crate::Algorithm;
}

/// Core trait for the randomisation procedures in HippoMaps.
///
/// Algorithms are pure functions of their input and parameters; any
/// randomness is driven by a seed carried in the parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
