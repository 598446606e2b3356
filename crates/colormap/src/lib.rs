//! # HippoMaps Colormap
//!
//! Rasterisation of the contextualisation scatter plot.
//!
//! Reference features are drawn as discs coloured from a qualitative palette
//! and numbered with their display number; the maps under study are drawn in
//! black and numbered by position. [`ScatterRaster`] implements the core
//! [`Renderer`](hippomaps_core::Renderer) trait and can write the image as an
//! RGBA TIFF.
//!
//! ## Usage
//!
//! ```ignore
//! use hippomaps_colormap::{ScatterRaster, ScatterStyle};
//!
//! let mut renderer = ScatterRaster::new(ScatterStyle::default()).to_file("context.tif");
//! contextualizer.contextualize(&maps, &params, Some(&mut renderer))?;
//! ```

mod render;
mod scheme;

pub use render::{rasterize, write_rgba_tiff, ScatterRaster, ScatterStyle};
pub use scheme::{Palette, Rgb};
