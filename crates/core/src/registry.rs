//! Vertex counts per surface tessellation

use crate::error::{Error, Result};
use crate::tessellation::{Density, Label};
use std::collections::HashMap;

/// Lookup of the number of vertices in each (label, density) tessellation.
///
/// The default table holds the published hippocampal and dentate surfaces.
/// Entries may be added or overridden with [`VertexCountRegistry::insert`].
#[derive(Debug, Clone)]
pub struct VertexCountRegistry {
    counts: HashMap<(Label, Density), usize>,
}

impl Default for VertexCountRegistry {
    fn default() -> Self {
        let mut counts = HashMap::new();
        counts.insert((Label::Hipp, Density::Unfoldiso), 32004);
        counts.insert((Label::Hipp, Density::HalfMm), 7262);
        counts.insert((Label::Hipp, Density::OneMm), 2004);
        counts.insert((Label::Hipp, Density::TwoMm), 419);
        counts.insert((Label::Dentate, Density::Unfoldiso), 7450);
        counts.insert((Label::Dentate, Density::HalfMm), 1788);
        counts.insert((Label::Dentate, Density::OneMm), 449);
        counts.insert((Label::Dentate, Density::TwoMm), 105);
        Self { counts }
    }
}

impl VertexCountRegistry {
    /// A registry with no entries
    pub fn empty() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Add or replace the vertex count of a tessellation
    pub fn insert(&mut self, label: Label, density: Density, count: usize) -> Option<usize> {
        self.counts.insert((label, density), count)
    }

    /// Number of vertices of the (label, density) tessellation
    pub fn vertex_count(&self, label: Label, density: Density) -> Result<usize> {
        self.counts
            .get(&(label, density))
            .copied()
            .ok_or_else(|| Error::UnknownTessellation {
                label: label.to_string(),
                density: density.to_string(),
            })
    }

    /// Find the density whose vertex count matches `count` for this label
    pub fn density_for(&self, label: Label, count: usize) -> Option<Density> {
        Density::ALL
            .iter()
            .copied()
            .find(|&d| self.counts.get(&(label, d)) == Some(&count))
    }

    /// Fail with `ShapeMismatch` unless `len` matches the tessellation
    pub fn check(&self, label: Label, density: Density, len: usize) -> Result<()> {
        let expected = self.vertex_count(label, density)?;
        if expected != len {
            return Err(Error::ShapeMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}
