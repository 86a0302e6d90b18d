//! Memory footprint of a grid before and after narrowing

use std::fmt;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::grid::{self, CastInto, Element};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Parameters for the footprint probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub rows: usize,
    pub cols: usize,
    /// Inclusive lower bound of the cell values
    pub low: i64,
    /// Exclusive upper bound of the cell values
    pub high: i64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rows: 100000,
            cols: 10000,
            low: 0,
            high: 101,
        }
    }
}

/// Converts a byte count to mebibytes
pub fn mebibytes(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Narrows (or widens) every element with `as` semantics
///
/// Out-of-range integers keep their low bits. Converting to the same type
/// returns an identical grid.
pub fn narrow<T, U>(grid: &Array2<T>) -> Array2<U>
where
    T: Element + CastInto<U>,
    U: Element,
{
    grid::cast(grid)
}

/// Byte footprints of one grid in its original and narrowed element types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootprintReport {
    pub before: usize,
    pub after: usize,
}

impl FootprintReport {
    /// Footprints of `grid` and its narrowed copy
    pub fn measure<T: Element, U: Element>(grid: &Array2<T>, narrowed: &Array2<U>) -> Self {
        Self {
            before: grid::nbytes(grid),
            after: grid::nbytes(narrowed),
        }
    }

    /// Footprints a `rows x cols` grid would have, without allocating it
    pub fn for_shape<T: Element, U: Element>(rows: usize, cols: usize) -> Result<Self> {
        let overflow = || Error::InvalidDimensions(format!("{} x {} grid overflows usize", rows, cols));
        let count = rows.checked_mul(cols).ok_or_else(overflow)?;

        Ok(Self {
            before: count.checked_mul(T::DATA_TYPE.size()).ok_or_else(overflow)?,
            after: count.checked_mul(U::DATA_TYPE.size()).ok_or_else(overflow)?,
        })
    }

    pub fn before_mib(&self) -> f64 {
        mebibytes(self.before)
    }

    pub fn after_mib(&self) -> f64 {
        mebibytes(self.after)
    }

    /// How many times smaller the narrowed grid is
    pub fn ratio(&self) -> f64 {
        self.before as f64 / self.after as f64
    }
}

impl fmt::Display for FootprintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}, {:.2}", self.before_mib(), self.after_mib())
    }
}

/// Allocates the random `i64` grid, narrows it to `i8` and measures both
pub fn run<R: Rng + ?Sized>(config: &ProbeConfig, rng: &mut R) -> Result<FootprintReport> {
    let wide = grid::random_grid(config.rows, config.cols, config.low..config.high, rng)?;
    let narrowed: Array2<i8> = narrow(&wide);

    let report = FootprintReport::measure(&wide, &narrowed);
    info!(
        rows = config.rows,
        cols = config.cols,
        before = report.before,
        after = report.after,
        "measured footprint"
    );
    Ok(report)
}
