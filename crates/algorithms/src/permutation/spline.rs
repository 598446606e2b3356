//! Cubic B-spline resampling of periodic images
//!
//! Images are treated as toroidal: indices wrap on both axes with period n.
//! This is not scipy's `mode='wrap'`, whose first and last samples coincide
//! (period n - 1).
//!
//! A cubic spline is fitted by recursive prefiltering (Unser, 1999) with
//! periodic boundary conditions, then evaluated with a separable 4x4 kernel.
//!
//! Reference:
//! Unser, M. (1999). Splines: A perfect fit for signal and image processing.
//! IEEE Signal Processing Magazine, 16(6), 22-38.

use ndarray::{Array2, Axis};

/// Pole of the cubic B-spline prefilter, sqrt(3) - 2
const POLE: f64 = -0.267_949_192_431_122_7;
/// Gain (1 - z)(1 - 1/z) of the cubic prefilter
const GAIN: f64 = 6.0;

/// Spline coefficients of a periodic image.
#[derive(Debug, Clone)]
pub struct PeriodicSpline {
    coeffs: Array2<f64>,
}

impl PeriodicSpline {
    /// Fit cubic spline coefficients to `image`.
    ///
    /// The image must be free of NaN; see [`rotate_wrap`] for how missing
    /// cells are handled.
    pub fn fit(image: &Array2<f64>) -> Self {
        let mut coeffs = image.clone();
        for axis in [Axis(0), Axis(1)] {
            for mut lane in coeffs.lanes_mut(axis) {
                let mut line: Vec<f64> = lane.iter().copied().collect();
                prefilter_periodic(&mut line);
                for (dst, src) in lane.iter_mut().zip(line) {
                    *dst = src;
                }
            }
        }
        Self { coeffs }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.coeffs.dim()
    }

    /// Evaluate the spline at fractional (row, col), wrapping on both axes
    pub fn sample(&self, row: f64, col: f64) -> f64 {
        let (rows, cols) = self.coeffs.dim();
        let (r0, wr) = kernel(row);
        let (c0, wc) = kernel(col);

        let mut acc = 0.0;
        for (i, &w_i) in wr.iter().enumerate() {
            let r = wrap(r0 + i as isize, rows);
            let mut line = 0.0;
            for (j, &w_j) in wc.iter().enumerate() {
                let c = wrap(c0 + j as isize, cols);
                line += w_j * self.coeffs[(r, c)];
            }
            acc += w_i * line;
        }
        acc
    }
}

#[inline]
fn wrap(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

/// First tap index and the four cubic B-spline weights for position `x`
#[inline]
fn kernel(x: f64) -> (isize, [f64; 4]) {
    let base = x.floor();
    let t = x - base;
    let s = 1.0 - t;
    let weights = [
        s * s * s / 6.0,
        2.0 / 3.0 - t * t + t * t * t / 2.0,
        2.0 / 3.0 - s * s + s * s * s / 2.0,
        t * t * t / 6.0,
    ];
    (base as isize - 1, weights)
}

/// In-place cubic B-spline prefilter of one periodic line
fn prefilter_periodic(line: &mut [f64]) {
    let n = line.len();
    if n < 2 {
        return;
    }
    let z = POLE;
    let zn = z.powi(n as i32);

    for v in line.iter_mut() {
        *v *= GAIN;
    }

    // causal initialisation: c+[0] = sum_k z^k s[-k mod n] / (1 - z^n)
    let mut sum = line[0];
    let mut zk = z;
    for k in 1..n {
        sum += zk * line[n - k];
        zk *= z;
    }
    line[0] = sum / (1.0 - zn);
    for k in 1..n {
        line[k] += z * line[k - 1];
    }

    // anticausal initialisation: c-[n-1] = -z / (1 - z^n) * sum_k z^k c+[(n-1+k) mod n]
    let mut sum = line[n - 1];
    let mut zk = z;
    for k in 1..n {
        sum += zk * line[k - 1];
        zk *= z;
    }
    line[n - 1] = -z / (1.0 - zn) * sum;
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

/// Replace NaN cells by the mean of the valid cells; returns the missing mask
fn fill_missing(image: &Array2<f64>) -> (Array2<f64>, Option<Array2<bool>>) {
    let mask = image.mapv(f64::is_nan);
    if !mask.iter().any(|&m| m) {
        return (image.clone(), None);
    }
    let (sum, count) = image
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    let fill = if count > 0 { sum / count as f64 } else { 0.0 };
    (image.mapv(|v| if v.is_nan() { fill } else { v }), Some(mask))
}

/// Resample `image` through an output→input coordinate map.
///
/// Missing cells are mean-filled for the spline fit; the missing mask is
/// carried through the same map with nearest-neighbour lookup.
fn warp<F>(image: &Array2<f64>, map: F) -> Array2<f64>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let (rows, cols) = image.dim();
    let (filled, mask) = fill_missing(image);
    let spline = PeriodicSpline::fit(&filled);

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (src_r, src_c) = map(r as f64, c as f64);
        if let Some(mask) = &mask {
            let nr = wrap(src_r.round() as isize, rows);
            let nc = wrap(src_c.round() as isize, cols);
            if mask[(nr, nc)] {
                return f64::NAN;
            }
        }
        spline.sample(src_r, src_c)
    })
}

/// Rotate a periodic image by `angle_deg` about its centre.
///
/// Output cell `o` takes the input at `R (o - c) + c` with
/// `R = [[cos, sin], [-sin, cos]]` over (row, col) and `c` the centre of the
/// grid, so positive angles rotate counter-clockwise when rows grow downward.
/// The output keeps the input shape.
pub fn rotate_wrap(image: &Array2<f64>, angle_deg: f64) -> Array2<f64> {
    let (rows, cols) = image.dim();
    let cr = (rows as f64 - 1.0) / 2.0;
    let cc = (cols as f64 - 1.0) / 2.0;
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    warp(image, |r, c| {
        let dr = r - cr;
        let dc = c - cc;
        (cos * dr + sin * dc + cr, -sin * dr + cos * dc + cc)
    })
}

/// Translate a periodic image: `output[o] = input[o - shift]`.
///
/// Integral shifts fall on spline knots, where the cubic spline reproduces
/// the samples, so they reduce to an exact circular shift.
pub fn shift_wrap(image: &Array2<f64>, shift: (f64, f64)) -> Array2<f64> {
    let (dr, dc) = shift;
    if dr.fract() == 0.0 && dc.fract() == 0.0 {
        return roll(image, dr as isize, dc as isize);
    }
    warp(image, |r, c| (r - dr, c - dc))
}

fn roll(image: &Array2<f64>, dr: isize, dc: isize) -> Array2<f64> {
    let (rows, cols) = image.dim();
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        image[(wrap(r as isize - dr, rows), wrap(c as isize - dc, cols))]
    })
}
