//! Surface labels and sampling densities

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which hippocampal surface a map lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Hippocampus proper
    #[default]
    Hipp,
    /// Dentate gyrus
    Dentate,
}

impl Label {
    pub const ALL: &[Label] = &[Label::Hipp, Label::Dentate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Hipp => "hipp",
            Label::Dentate => "dentate",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hipp" => Ok(Label::Hipp),
            "dentate" => Ok(Label::Dentate),
            other => Err(Error::InvalidParameter {
                name: "label",
                value: other.to_string(),
                reason: "expected 'hipp' or 'dentate'".into(),
            }),
        }
    }
}

/// Surface tessellation density.
///
/// `Unfoldiso` is the isotropic unfolded grid used by the geometric null model;
/// the others are the folded surface meshes at approximate vertex spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Density {
    #[serde(rename = "unfoldiso")]
    Unfoldiso,
    #[default]
    #[serde(rename = "0p5mm")]
    HalfMm,
    #[serde(rename = "1mm")]
    OneMm,
    #[serde(rename = "2mm")]
    TwoMm,
}

impl Density {
    pub const ALL: &[Density] = &[
        Density::Unfoldiso,
        Density::HalfMm,
        Density::OneMm,
        Density::TwoMm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Unfoldiso => "unfoldiso",
            Density::HalfMm => "0p5mm",
            Density::OneMm => "1mm",
            Density::TwoMm => "2mm",
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Density {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unfoldiso" => Ok(Density::Unfoldiso),
            "0p5mm" => Ok(Density::HalfMm),
            "1mm" => Ok(Density::OneMm),
            "2mm" => Ok(Density::TwoMm),
            other => Err(Error::InvalidParameter {
                name: "density",
                value: other.to_string(),
                reason: "expected one of unfoldiso, 0p5mm, 1mm, 2mm".into(),
            }),
        }
    }
}
