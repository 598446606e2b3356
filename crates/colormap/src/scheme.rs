//! Qualitative palettes for categorical scatter points.
//!
//! Colours follow the matplotlib tables of the same names.

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Relative luminance in [0, 1] (Rec. 709 weights)
    pub fn luminance(&self) -> f64 {
        (0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Available qualitative palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// 12 pastel colours
    #[default]
    Set3,
    /// 10 saturated colours
    Tab10,
}

const SET3: &[Rgb] = &[
    Rgb::new(141, 211, 199),
    Rgb::new(255, 255, 179),
    Rgb::new(190, 186, 218),
    Rgb::new(251, 128, 114),
    Rgb::new(128, 177, 211),
    Rgb::new(253, 180, 98),
    Rgb::new(179, 222, 105),
    Rgb::new(252, 205, 229),
    Rgb::new(217, 217, 217),
    Rgb::new(188, 128, 189),
    Rgb::new(204, 235, 197),
    Rgb::new(255, 237, 111),
];

const TAB10: &[Rgb] = &[
    Rgb::new(31, 119, 180),
    Rgb::new(255, 127, 14),
    Rgb::new(44, 160, 44),
    Rgb::new(214, 39, 40),
    Rgb::new(148, 103, 189),
    Rgb::new(140, 86, 75),
    Rgb::new(227, 119, 194),
    Rgb::new(127, 127, 127),
    Rgb::new(188, 189, 34),
    Rgb::new(23, 190, 207),
];

impl Palette {
    pub const ALL: &[Palette] = &[Self::Set3, Self::Tab10];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Set3 => "Set3",
            Self::Tab10 => "tab10",
        }
    }

    pub fn colors(&self) -> &'static [Rgb] {
        match self {
            Self::Set3 => SET3,
            Self::Tab10 => TAB10,
        }
    }

    /// Colour `index`, cycling past the end of the table
    pub fn get(&self, index: usize) -> Rgb {
        let colors = self.colors();
        colors[index % colors.len()]
    }

    /// Colour at normalised position `t` in [0, 1], split into equal bins.
    pub fn sample(&self, t: f64) -> Rgb {
        let colors = self.colors();
        let n = colors.len();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let idx = ((t * n as f64).floor() as usize).min(n - 1);
        colors[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set3_endpoints() {
        assert_eq!(Palette::Set3.sample(0.0), Rgb::new(141, 211, 199));
        assert_eq!(Palette::Set3.sample(1.0), Rgb::new(255, 237, 111));
    }

    #[test]
    fn sample_bins() {
        // 12 bins: t = 0.25 falls into bin 3
        assert_eq!(Palette::Set3.sample(0.25), SET3[3]);
        assert_eq!(Palette::Tab10.sample(0.55), TAB10[5]);
    }

    #[test]
    fn sample_clamps_and_handles_nan() {
        assert_eq!(Palette::Tab10.sample(-3.0), TAB10[0]);
        assert_eq!(Palette::Tab10.sample(7.0), TAB10[9]);
        assert_eq!(Palette::Tab10.sample(f64::NAN), TAB10[0]);
    }

    #[test]
    fn get_cycles() {
        assert_eq!(Palette::Tab10.get(12), TAB10[2]);
        assert_eq!(Palette::Set3.get(0), SET3[0]);
    }

    #[test]
    fn luminance_extremes() {
        assert_eq!(Rgb::BLACK.luminance(), 0.0);
        assert!((Rgb::WHITE.luminance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_palettes_listed() {
        assert_eq!(Palette::ALL.len(), 2);
        assert_eq!(Palette::Set3.colors().len(), 12);
    }
}
