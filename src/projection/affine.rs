//! Affine mapping from grid indices to spatial coordinates

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a coordinate in any coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Creates a new 2D coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Six-coefficient affine transform in row-major order
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `a` and `e` are the pixel sizes (`e` negative for north-up rasters), `b`
/// and `d` the shear terms, `(c, f)` the outer corner of pixel (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    /// Creates a transform from its six coefficients
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// A north-up transform without shear
    pub const fn from_origin(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Returns the coefficients as `[a, b, c, d, e, f]`
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Whether the shear terms are zero
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Maps a (col, row) position to spatial coordinates
    pub fn apply(&self, col: f64, row: f64) -> Coordinate {
        Coordinate::new(
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Determinant of the linear part
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Returns the inverse transform, or `None` when it is singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }

        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;

        Some(Self::new(
            ia,
            ib,
            -(ia * self.c + ib * self.f),
            id,
            ie,
            -(id * self.c + ie * self.f),
        ))
    }

    /// Maps spatial coordinates back to fractional (col, row)
    pub fn to_pixel(&self, coord: Coordinate) -> Option<(f64, f64)> {
        let inv = self.inverse()?;
        let p = inv.apply(coord.x, coord.y);
        Some((p.x, p.y))
    }

    /// Column coordinates: `x[i] = i * a + c`
    pub fn x_coords(&self, width: usize) -> Array1<f64> {
        Array1::from_iter((0..width).map(|i| i as f64 * self.a + self.c))
    }

    /// Row coordinates: `y[j] = j * e + f`
    pub fn y_coords(&self, height: usize) -> Array1<f64> {
        Array1::from_iter((0..height).map(|j| j as f64 * self.e + self.f))
    }

    /// Computes the bounding box of a `width x height` grid
    ///
    /// Returns (min_x, min_y, max_x, max_y)
    pub fn bounds(&self, width: u64, height: u64) -> (f64, f64, f64, f64) {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "| {}, {}, {} |\n| {}, {}, {} |",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}
