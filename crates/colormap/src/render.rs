//! Scatter-plot rasterisation to RGBA.

use crate::scheme::{Palette, Rgb};
use hippomaps_core::{Error, PointStyle, Renderer, Result, ScatterPlot};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype::RGBA8, TiffEncoder};

/// Image layout and colours for [`rasterize`].
#[derive(Debug, Clone)]
pub struct ScatterStyle {
    pub width: u32,
    pub height: u32,
    /// Disc radius in pixels
    pub radius: u32,
    /// Space between the image border and the plot area
    pub margin: u32,
    pub palette: Palette,
    pub background: Rgb,
    pub axis: Rgb,
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            radius: 14,
            margin: 60,
            palette: Palette::Set3,
            background: Rgb::WHITE,
            axis: Rgb::new(80, 80, 80),
        }
    }
}

/// 3x5 bitmap digits, one row per byte, most significant of 3 bits on the left
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

struct Canvas {
    width: i64,
    height: i64,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        let pixels = background
            .rgba()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width: width as i64,
            height: height as i64,
            pixels,
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.pixels[offset..offset + 4].copy_from_slice(&color.rgba());
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Digits of `text` centred on (cx, cy); other characters are skipped
    fn label(&mut self, text: &str, cx: i64, cy: i64, scale: i64, color: Rgb) {
        let glyphs: Vec<&[u8; 5]> = text
            .chars()
            .filter_map(|c| c.to_digit(10).map(|d| &DIGITS[d as usize]))
            .collect();
        if glyphs.is_empty() {
            return;
        }
        let advance = 4 * scale;
        let total = glyphs.len() as i64 * advance - scale;
        let left = cx - total / 2;
        let top = cy - 5 * scale / 2;
        for (k, glyph) in glyphs.iter().enumerate() {
            let x0 = left + k as i64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.put(x0 + col * scale + sx, top + row as i64 * scale + sy, color);
                        }
                    }
                }
            }
        }
    }
}

/// Render `plot` into a row-major RGBA buffer of `width * height * 4` bytes.
///
/// Palette points are coloured by their index normalised over the indices
/// present in the plot. Points with non-finite coordinates are skipped.
pub fn rasterize(plot: &ScatterPlot, style: &ScatterStyle) -> Vec<u8> {
    let mut canvas = Canvas::new(style.width, style.height, style.background);
    let (w, h, m) = (style.width as i64, style.height as i64, style.margin as i64);

    // left and bottom spines
    for y in m..=h - m {
        canvas.put(m, y, style.axis);
    }
    for x in m..=w - m {
        canvas.put(x, h - m, style.axis);
    }

    let Some((x0, y0, x1, y1)) = plot.bounds() else {
        return canvas.pixels;
    };
    let (x0, x1) = padded(x0, x1);
    let (y0, y1) = padded(y0, y1);
    let plot_w = (w - 2 * m).max(1) as f64;
    let plot_h = (h - 2 * m).max(1) as f64;

    let indices = plot.points.iter().filter_map(|p| match p.style {
        PointStyle::Palette(i) => Some(i),
        PointStyle::Highlight => None,
    });
    let (lo, hi) = indices.fold((u8::MAX, u8::MIN), |(lo, hi), i| (lo.min(i), hi.max(i)));

    let radius = style.radius as i64;
    let scale = (radius / 5).max(1);
    for p in &plot.points {
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        let px = m + ((p.x - x0) / (x1 - x0) * plot_w).round() as i64;
        let py = h - m - ((p.y - y0) / (y1 - y0) * plot_h).round() as i64;
        let (fill, ink) = match p.style {
            PointStyle::Palette(i) => {
                let t = if hi > lo {
                    (i - lo) as f64 / (hi - lo) as f64
                } else {
                    0.0
                };
                (style.palette.sample(t), Rgb::BLACK)
            }
            PointStyle::Highlight => (Rgb::BLACK, Rgb::WHITE),
        };
        canvas.disc(px, py, radius, fill);
        canvas.label(&p.label, px, py, scale, ink);
    }
    canvas.pixels
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span <= 0.0 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo - 0.05 * span, hi + 0.05 * span)
    }
}

/// Write an RGBA8 buffer as a TIFF image
pub fn write_rgba_tiff<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Format(format!("TIFF encoder error: {}", e)))?;
    encoder
        .write_image::<RGBA8>(width, height, pixels)
        .map_err(|e| Error::Format(format!("Cannot write image data: {}", e)))?;
    Ok(())
}

/// [`Renderer`] that rasterises plots and optionally saves them.
#[derive(Debug, Clone, Default)]
pub struct ScatterRaster {
    style: ScatterStyle,
    output: Option<PathBuf>,
    last: Option<Vec<u8>>,
}

impl ScatterRaster {
    pub fn new(style: ScatterStyle) -> Self {
        Self {
            style,
            output: None,
            last: None,
        }
    }

    /// Also write every rendered plot to `path`
    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn style(&self) -> &ScatterStyle {
        &self.style
    }

    /// RGBA buffer of the most recent plot
    pub fn pixels(&self) -> Option<&[u8]> {
        self.last.as_deref()
    }
}

impl Renderer for ScatterRaster {
    fn render(&mut self, plot: &ScatterPlot) -> Result<()> {
        let pixels = rasterize(plot, &self.style);
        if let Some(path) = &self.output {
            write_rgba_tiff(path, self.style.width, self.style.height, &pixels)?;
            tracing::info!("scatter plot written to {}", path.display());
        }
        self.last = Some(pixels);
        Ok(())
    }
}
