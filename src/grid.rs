//! Numeric grids
//!
//! A grid is an `ndarray::Array2<T>` indexed `[row, col]` whose element type
//! implements [`Element`]. Grids change only through whole-array operations:
//! a narrowing or widening [`cast`] and elementwise scaling.

use std::fmt;
use std::ops::Range;

use ndarray::Array2;
use rand::distr::uniform::SampleUniform;
use rand::distr::{Distribution, Uniform};
use rand::Rng;

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::DataType;

/// A fixed-width numeric type that can live in a grid and in a TIFF tile
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The TIFF sample type for this element
    const DATA_TYPE: DataType;

    /// Appends the little-endian encoding of `self`
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes one element; `bytes` must be exactly `DATA_TYPE.size()` long
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Multiplies by `factor`; integers wrap on overflow
    fn scale(self, factor: Self) -> Self;

    /// Addition used to undo horizontal differencing; integers wrap
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Subtraction used for horizontal differencing; integers wrap
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! element {
    (int: $($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DATA_TYPE: DataType = DataType::$dt;

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    match order {
                        ByteOrder::LittleEndian => <$t>::from_le_bytes(buf),
                        ByteOrder::BigEndian => <$t>::from_be_bytes(buf),
                    }
                }

                #[inline]
                fn scale(self, factor: Self) -> Self {
                    self.wrapping_mul(factor)
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }
            }
        )*
    };
    (float: $($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DATA_TYPE: DataType = DataType::$dt;

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    match order {
                        ByteOrder::LittleEndian => <$t>::from_le_bytes(buf),
                        ByteOrder::BigEndian => <$t>::from_be_bytes(buf),
                    }
                }

                #[inline]
                fn scale(self, factor: Self) -> Self {
                    self * factor
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    self - rhs
                }
            }
        )*
    };
}

element!(int: u8 => U8, u16 => U16, u32 => U32, u64 => U64, i8 => I8, i16 => I16, i32 => I32, i64 => I64);
element!(float: f32 => F32, f64 => F64);

/// Numeric conversion between element types with `as` semantics
///
/// Narrowing integer conversions keep the low bits of the source value, so
/// values outside the target range wrap. Callers that care should keep their
/// data inside the target range.
pub trait CastInto<U> {
    /// Converts `self` to `U`
    fn cast(self) -> U;
}

macro_rules! cast_into {
    ($($from:ty),* $(,)?) => {
        $( cast_into!(@to $from => u8, u16, u32, u64, i8, i16, i32, i64, f32, f64); )*
    };
    (@to $from:ty => $($to:ty),*) => {
        $(
            impl CastInto<$to> for $from {
                #[inline]
                fn cast(self) -> $to {
                    self as $to
                }
            }
        )*
    };
}

cast_into!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Converts every element of a grid to another element type
pub fn cast<T, U>(grid: &Array2<T>) -> Array2<U>
where
    T: Element + CastInto<U>,
    U: Element,
{
    grid.mapv(|v| CastInto::<U>::cast(v))
}

/// Number of bytes the grid's elements occupy
pub fn nbytes<T: Element>(grid: &Array2<T>) -> usize {
    grid.len() * T::DATA_TYPE.size()
}

/// Allocates a `rows x cols` grid filled from `U[range.start, range.end)`
///
/// Each cell is drawn independently from `rng`, row by row.
pub fn random_grid<T, R>(rows: usize, cols: usize, range: Range<T>, rng: &mut R) -> Result<Array2<T>>
where
    T: Element + SampleUniform + PartialOrd,
    R: Rng + ?Sized,
{
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions(format!(
            "grid must have at least one row and column, got {} x {}",
            rows, cols
        )));
    }
    rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(T::DATA_TYPE.size()))
        .ok_or_else(|| Error::InvalidDimensions(format!("{} x {} grid overflows usize", rows, cols)))?;

    if range.start >= range.end {
        return Err(Error::InvalidRange(format!(
            "[{}, {}) contains no values",
            range.start, range.end
        )));
    }
    let dist = Uniform::new(range.start, range.end)
        .map_err(|e| Error::InvalidRange(e.to_string()))?;

    Ok(Array2::from_shape_simple_fn((rows, cols), || dist.sample(&mut *rng)))
}
