//! Native map readers and writers
//!
//! Maps are read either from plain text (values separated by whitespace or
//! commas, `nan` for missing vertices) or from single-band TIFF images, which
//! are flattened row-major. Unfolded grids are written as 64-bit float TIFFs.

use crate::error::{Error, Result};
use crate::field::ScalarField;
use crate::grid::UnfoldedGrid;
use crate::io::MapLoader;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;

/// Loads maps from disk, choosing the format by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMapLoader;

impl MapLoader for FileMapLoader {
    fn load(&self, path: &Path) -> Result<ScalarField> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("tif") | Some("tiff") => {
                let file = File::open(path)?;
                decode_tiff(file)
            }
            _ => read_field_text(path),
        }
    }
}

/// Read a field from a text file
pub fn read_field_text<P: AsRef<Path>>(path: P) -> Result<ScalarField> {
    let mut text = String::new();
    File::open(path.as_ref())?.read_to_string(&mut text)?;
    parse_values(&text)
}

fn parse_values(text: &str) -> Result<ScalarField> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .enumerate()
        .map(|(i, tok)| {
            tok.parse::<f64>()
                .map_err(|_| Error::Format(format!("value {} is not a number: '{}'", i, tok)))
        })
        .collect::<Result<Vec<f64>>>()
        .map(ScalarField::new)
}

/// Write a field as one value per line
pub fn write_field_text<P: AsRef<Path>>(field: &ScalarField, path: P) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for v in field.values() {
        writeln!(out, "{}", v)?;
    }
    out.flush()?;
    Ok(())
}

/// Read an unfolded grid from a 126x254 TIFF image
pub fn read_grid_tiff<P: AsRef<Path>>(path: P) -> Result<UnfoldedGrid> {
    let field = decode_tiff(File::open(path.as_ref())?)?;
    UnfoldedGrid::from_vec(field.into_vec())
}

/// Write an unfolded grid as a single-band 64-bit float TIFF
pub fn write_grid_tiff<P: AsRef<Path>>(grid: &UnfoldedGrid, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Format(format!("TIFF encoder error: {}", e)))?;
    let (rows, cols) = grid.shape();
    encoder
        .write_image::<Gray64Float>(cols as u32, rows as u32, &grid.values())
        .map_err(|e| Error::Format(format!("Cannot write image data: {}", e)))?;
    Ok(())
}

/// Internal: decode a single-band TIFF from any `Read + Seek` source
fn decode_tiff<R: Read + Seek>(reader: R) -> Result<ScalarField> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Format(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Format(format!("Cannot read dimensions: {}", e)))?;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Format(format!("Cannot read image data: {}", e)))?;

    let values: Vec<f64> = match result {
        DecodingResult::F32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => cast_all(&buf),
        DecodingResult::U16(buf) => cast_all(&buf),
        DecodingResult::U32(buf) => cast_all(&buf),
        DecodingResult::I8(buf) => cast_all(&buf),
        DecodingResult::I16(buf) => cast_all(&buf),
        DecodingResult::I32(buf) => cast_all(&buf),
        _ => return Err(Error::Format("Unsupported TIFF pixel format".into())),
    };

    let expected = width as usize * height as usize;
    if values.len() != expected {
        return Err(Error::Format(format!(
            "TIFF has {} samples for a {}x{} image; only single-band images are supported",
            values.len(),
            width,
            height
        )));
    }

    Ok(ScalarField::new(values))
}

fn cast_all<T: num_traits::NumCast + Copy>(buf: &[T]) -> Vec<f64> {
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f64::NAN))
        .collect()
}
