//! Deferred raster expressions
//!
//! A [`LazyRaster`] describes a computation over a chunked source without
//! reading any pixels. Evaluation happens only through the explicit
//! `compute*` and [`LazyRaster::value_at`] calls.

pub mod source;

pub use source::{ChunkGrid, ChunkRegion, ChunkShape, ChunkedRaster, DEFAULT_CACHE_TILES};

use std::fmt;
use std::ops::Mul;
use std::path::Path;
use std::sync::Arc;

use ndarray::{s, Array2};
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::grid::Element;

/// A node of the expression graph
#[derive(Debug, Clone)]
pub enum Expr<T: Element> {
    /// Cells read from a chunked file
    Source(Arc<ChunkedRaster<T>>),
    /// Elementwise multiplication by a constant
    Scale {
        input: Box<Expr<T>>,
        factor: T,
    },
}

impl<T: Element> Expr<T> {
    /// The source at the leaf of this expression
    pub fn source(&self) -> &Arc<ChunkedRaster<T>> {
        match self {
            Expr::Source(src) => src,
            Expr::Scale { input, .. } => input.source(),
        }
    }

    /// Number of operations above the source
    pub fn depth(&self) -> usize {
        match self {
            Expr::Source(_) => 0,
            Expr::Scale { input, .. } => input.depth() + 1,
        }
    }

    fn eval_region(&self, region: &ChunkRegion) -> Result<Array2<T>> {
        match self {
            Expr::Source(src) => src.read_region(region),
            Expr::Scale { input, factor } => {
                let factor = *factor;
                Ok(input.eval_region(region)?.mapv_into(|v| v.scale(factor)))
            }
        }
    }

    fn eval_value(&self, row: usize, col: usize) -> Result<T> {
        match self {
            Expr::Source(src) => src.read_value(row, col),
            Expr::Scale { input, factor } => Ok(input.eval_value(row, col)?.scale(*factor)),
        }
    }
}

impl<T: Element> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Source(src) => write!(f, "open({:?})", src.path().display().to_string()),
            Expr::Scale { input, factor } => write!(f, "({} * {})", input, factor),
        }
    }
}

/// A raster whose values are computed on demand, chunk by chunk
#[derive(Debug, Clone)]
pub struct LazyRaster<T: Element> {
    expr: Expr<T>,
}

impl<T: Element> LazyRaster<T> {
    /// Opens `path` with the given chunk shape; no pixel data is read
    pub fn open<P: AsRef<Path>>(path: P, chunk: ChunkShape) -> Result<Self> {
        Ok(Self::from_source(Arc::new(ChunkedRaster::open(path, chunk)?)))
    }

    pub fn from_source(source: Arc<ChunkedRaster<T>>) -> Self {
        Self { expr: Expr::Source(source) }
    }

    /// Wraps the current expression in an elementwise scale
    pub fn scale(self, factor: T) -> Self {
        Self {
            expr: Expr::Scale {
                input: Box::new(self.expr),
                factor,
            },
        }
    }

    pub fn expr(&self) -> &Expr<T> {
        &self.expr
    }

    pub fn source(&self) -> &Arc<ChunkedRaster<T>> {
        self.expr.source()
    }

    /// Result shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.source().dimensions()
    }

    pub fn chunk_grid(&self) -> &ChunkGrid {
        self.source().chunk_grid()
    }

    /// Evaluates one chunk of the chunk grid
    pub fn compute_chunk(&self, chunk_row: usize, chunk_col: usize) -> Result<Array2<T>> {
        let region = self.chunk_grid().region(chunk_row, chunk_col)?;
        debug!(chunk_row, chunk_col, expr = %self.expr, "computing chunk");
        self.expr.eval_region(&region)
    }

    /// Evaluates a single cell
    pub fn value_at(&self, row: usize, col: usize) -> Result<T> {
        self.expr.eval_value(row, col)
    }

    /// Evaluates every chunk in parallel and assembles the full result
    pub fn compute(&self) -> Result<Array2<T>> {
        let regions = self.chunk_grid().regions();
        debug!(chunks = regions.len(), expr = %self.expr, "computing raster");

        let chunks = regions
            .par_iter()
            .map(|region| self.expr.eval_region(region).map(|data| (*region, data)))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Array2::<T>::default(self.shape());
        for (region, data) in chunks {
            out.slice_mut(s![region.row..region.row + region.rows, region.col..region.col + region.cols])
                .assign(&data);
        }
        Ok(out)
    }
}

impl<T: Element> Mul<T> for LazyRaster<T> {
    type Output = LazyRaster<T>;

    fn mul(self, factor: T) -> Self::Output {
        self.scale(factor)
    }
}

impl<T: Element> fmt::Display for LazyRaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        let chunk = self.chunk_grid().chunk_shape();
        write!(
            f,
            "LazyRaster<{}> {} x {} in {} x {} chunks: {}",
            T::DATA_TYPE, rows, cols, chunk.height, chunk.width, self.expr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::{GeoInfo, GeoTiffWriter, WriteOptions};
    use crate::projection::{Affine, Crs};
    use tempfile::NamedTempFile;

    fn sample_file(grid: &Array2<i64>) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let options = WriteOptions { tile_width: 16, tile_height: 16, ..Default::default() };
        GeoTiffWriter::new(options)
            .unwrap()
            .write_to_path(
                file.path(),
                grid.view(),
                &GeoInfo::new(Affine::from_origin(0.0, 0.0, 1.0, 1.0), Crs::epsg(4326)),
                None,
            )
            .unwrap();
        file
    }

    #[test]
    fn test_scale_builds_graph_without_reading() {
        let grid = Array2::from_shape_fn((20, 30), |(r, c)| (r * 30 + c) as i64);
        let file = sample_file(&grid);

        let lazy = LazyRaster::<i64>::open(file.path(), ChunkShape::new(10, 10)).unwrap() * 2;
        assert_eq!(lazy.expr().depth(), 1);
        assert_eq!(lazy.shape(), (20, 30));
        assert_eq!(lazy.chunk_grid().chunk_count(), 6);
        assert_eq!(lazy.source().cache_stats().tile_count, 0);
        assert!(lazy.to_string().ends_with("* 2)"));
    }

    #[test]
    fn test_compute_doubles_values() {
        let grid = Array2::from_shape_fn((20, 30), |(r, c)| (r as i64 - 10) * (c as i64 + 1));
        let file = sample_file(&grid);

        let lazy = LazyRaster::<i64>::open(file.path(), ChunkShape::new(7, 9)).unwrap() * 2;
        assert_eq!(lazy.compute().unwrap(), grid.mapv(|v| v * 2));
        assert_eq!(lazy.value_at(3, 4).unwrap(), 2 * grid[[3, 4]]);

        let chunk = lazy.compute_chunk(1, 2).unwrap();
        assert_eq!(chunk, grid.slice(s![9..18, 14..21]).mapv(|v| v * 2));
    }

    #[test]
    fn test_chained_scale_wraps() {
        let grid = Array2::from_elem((2, 2), i64::MAX);
        let file = sample_file(&grid);

        let lazy = LazyRaster::<i64>::open(file.path(), ChunkShape::new(1, 1)).unwrap() * 2 * 3;
        assert_eq!(lazy.expr().depth(), 2);
        assert_eq!(lazy.value_at(1, 1).unwrap(), i64::MAX.wrapping_mul(2).wrapping_mul(3));
    }

    #[test]
    fn test_chunk_out_of_range() {
        let grid = Array2::<i64>::zeros((4, 4));
        let file = sample_file(&grid);

        let lazy = LazyRaster::<i64>::open(file.path(), ChunkShape::new(2, 2)).unwrap();
        assert!(lazy.compute_chunk(2, 0).is_err());
        assert!(lazy.value_at(4, 0).is_err());
    }
}
