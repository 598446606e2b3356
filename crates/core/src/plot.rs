//! Scatter-plot description handed to an optional renderer

use crate::error::Result;

/// How a scatter point is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStyle {
    /// Qualitative palette entry (reference features)
    Palette(u8),
    /// Emphasised point (maps under study)
    Highlight,
}

/// A labelled point in the 2D context space.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub style: PointStyle,
}

/// A 2D scatter plot of maps positioned by their summary correlations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScatterPlot {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
}

impl ScatterPlot {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, x: f64, y: f64, label: impl Into<String>, style: PointStyle) {
        self.points.push(ScatterPoint {
            x,
            y,
            label: label.into(),
            style,
        });
    }

    /// (min_x, min_y, max_x, max_y) over finite points
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .fold(None, |acc, p| match acc {
                None => Some((p.x, p.y, p.x, p.y)),
                Some((x0, y0, x1, y1)) => {
                    Some((x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)))
                }
            })
    }
}

/// Sink for scatter plots.
///
/// Rendering is a side effect only; numeric results never depend on it.
pub trait Renderer {
    fn render(&mut self, plot: &ScatterPlot) -> Result<()>;
}
