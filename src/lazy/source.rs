//! Chunked, memory-mapped raster sources

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheStats, TileCache};
use crate::error::{Error, Result};
use crate::formats::tiff::{tags, GeoInfo, TileReader, TiffReader};
use crate::grid::Element;

/// Decoded blocks kept per open raster
pub const DEFAULT_CACHE_TILES: usize = 256;

/// Logical chunk extent; `width` runs along x (columns), `height` along y (rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkShape {
    pub width: usize,
    pub height: usize,
}

impl ChunkShape {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// A single chunk covering any image
    pub const fn whole() -> Self {
        Self::new(usize::MAX, usize::MAX)
    }
}

/// One chunk's window into the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRegion {
    pub chunk_row: usize,
    pub chunk_col: usize,
    /// First image row
    pub row: usize,
    /// First image column
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Regular partition of a `rows x cols` image into chunks
///
/// Chunks larger than the image are clamped to it; edge chunks are smaller
/// when the image size is not a multiple of the chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGrid {
    rows: usize,
    cols: usize,
    chunk: ChunkShape,
}

impl ChunkGrid {
    pub fn new(rows: usize, cols: usize, chunk: ChunkShape) -> Result<Self> {
        if chunk.width == 0 || chunk.height == 0 {
            return Err(Error::InvalidChunkShape(format!(
                "chunk extent must be positive, got x={} y={}",
                chunk.width, chunk.height
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions(format!(
                "cannot chunk an empty {} x {} image",
                rows, cols
            )));
        }

        Ok(Self {
            rows,
            cols,
            chunk: ChunkShape::new(chunk.width.min(cols), chunk.height.min(rows)),
        })
    }

    /// Image shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Effective (clamped) chunk shape
    pub fn chunk_shape(&self) -> ChunkShape {
        self.chunk
    }

    pub fn chunks_down(&self) -> usize {
        self.rows.div_ceil(self.chunk.height)
    }

    pub fn chunks_across(&self) -> usize {
        self.cols.div_ceil(self.chunk.width)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks_down() * self.chunks_across()
    }

    pub fn region(&self, chunk_row: usize, chunk_col: usize) -> Result<ChunkRegion> {
        if chunk_row >= self.chunks_down() || chunk_col >= self.chunks_across() {
            return Err(Error::OutOfBounds(format!(
                "Chunk ({}, {}) outside {} x {} chunk grid",
                chunk_row,
                chunk_col,
                self.chunks_down(),
                self.chunks_across()
            )));
        }

        let row = chunk_row * self.chunk.height;
        let col = chunk_col * self.chunk.width;
        Ok(ChunkRegion {
            chunk_row,
            chunk_col,
            row,
            col,
            rows: self.chunk.height.min(self.rows - row),
            cols: self.chunk.width.min(self.cols - col),
        })
    }

    /// The chunk (row, col) holding an image cell
    pub fn locate(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        (row < self.rows && col < self.cols)
            .then(|| (row / self.chunk.height, col / self.chunk.width))
    }

    /// All chunk regions in row-major order
    pub fn regions(&self) -> Vec<ChunkRegion> {
        let across = self.chunks_across();
        (0..self.chunk_count())
            .filter_map(|i| self.region(i / across, i % across).ok())
            .collect()
    }
}

/// A single-band GeoTIFF opened for windowed reads
///
/// Nothing is decoded at open time; blocks are decoded on first access and
/// kept in a shared cache, so the source can be read from many threads.
#[derive(Debug)]
pub struct ChunkedRaster<T: Element> {
    path: PathBuf,
    tiles: TileReader,
    cache: TileCache<T>,
    geo: Option<GeoInfo>,
    description: Option<String>,
    grid: ChunkGrid,
}

impl<T: Element> ChunkedRaster<T> {
    /// Opens a raster with the default block cache
    pub fn open<P: AsRef<Path>>(path: P, chunk: ChunkShape) -> Result<Self> {
        Self::open_with_options(path, chunk, DEFAULT_CACHE_TILES)
    }

    /// Opens a raster keeping up to `cache_tiles` decoded blocks
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        chunk: ChunkShape,
        cache_tiles: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let reader = TiffReader::open(path)?;
        let tiff = reader.read()?;
        let ifd = tiff.main_ifd()
            .ok_or_else(|| Error::InvalidFormat("File contains no images".to_string()))?;

        let tiles = reader.tile_reader(ifd)?;
        if tiles.data_type() != T::DATA_TYPE {
            return Err(Error::TypeMismatch {
                expected: T::DATA_TYPE.to_string(),
                found: tiles.data_type().to_string(),
            });
        }

        let geo = GeoInfo::from_ifd(ifd, &reader)?;
        let description = ifd.get_entry(tags::IMAGE_DESCRIPTION)
            .map(|entry| reader.read_tag_ascii(entry))
            .transpose()?;

        let image = tiles.layout().image;
        let rows = usize::try_from(image.height)
            .map_err(|_| Error::InvalidDimensions(format!("{} rows", image.height)))?;
        let cols = usize::try_from(image.width)
            .map_err(|_| Error::InvalidDimensions(format!("{} columns", image.width)))?;
        let grid = ChunkGrid::new(rows, cols, chunk)?;

        info!(
            path = %path.display(),
            rows,
            cols,
            data_type = %T::DATA_TYPE,
            block_width = tiles.layout().block.width,
            block_height = tiles.layout().block.height,
            chunks = grid.chunk_count(),
            "opened raster"
        );

        Ok(Self {
            path: path.to_path_buf(),
            tiles,
            cache: TileCache::new(cache_tiles),
            geo,
            description,
            grid,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Image shape as (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn chunk_grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn geo_info(&self) -> Option<&GeoInfo> {
        self.geo.as_ref()
    }

    /// The ImageDescription tag, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Decoded block, from cache when possible
    fn block(&self, index: usize) -> Result<Arc<Vec<T>>> {
        if let Some(block) = self.cache.get(index) {
            return Ok(block);
        }
        let values = self.tiles.read_block::<T>(index)?;
        Ok(self.cache.put(index, values))
    }

    /// Reads the value of one cell
    pub fn read_value(&self, row: usize, col: usize) -> Result<T> {
        let layout = self.tiles.layout();
        let (x, y) = (col as u64, row as u64);
        layout.validate_pixel_bounds(x, y)?;

        let block = self.block(layout.block_index(x, y))?;
        block.get(layout.index_in_block(x, y)).copied().ok_or_else(|| {
            Error::InvalidFormat(format!("Block holding ({}, {}) is truncated", row, col))
        })
    }

    /// Reads a rectangular window starting at (`row`, `col`)
    pub fn read_window(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Array2<T>> {
        let (height, width) = self.dimensions();
        if row.checked_add(rows).map_or(true, |end| end > height)
            || col.checked_add(cols).map_or(true, |end| end > width)
        {
            return Err(Error::OutOfBounds(format!(
                "Window {} x {} at ({}, {}) outside {} x {} image",
                rows, cols, row, col, height, width
            )));
        }

        let layout = *self.tiles.layout();
        let (bw, bh) = (layout.block.width as usize, layout.block.height as usize);
        let mut out = Array2::<T>::default((rows, cols));

        for index in layout.blocks_in_window(col as u64, row as u64, cols as u64, rows as u64) {
            let block = self.block(index)?;
            let (bx, by) = layout.block_origin(index);
            let (bx, by) = (bx as usize, by as usize);

            let r0 = row.max(by);
            let r1 = (row + rows).min(by + bh);
            let c0 = col.max(bx);
            let c1 = (col + cols).min(bx + bw);

            let needed = (r1 - by - 1) * bw + (c1 - bx);
            if block.len() < needed {
                return Err(Error::InvalidFormat(format!(
                    "Block {} holds {} samples, {} needed",
                    index,
                    block.len(),
                    needed
                )));
            }

            for r in r0..r1 {
                let src = &block[(r - by) * bw + (c0 - bx)..(r - by) * bw + (c1 - bx)];
                let mut dst = out.row_mut(r - row);
                for (d, s) in dst.iter_mut().skip(c0 - col).zip(src) {
                    *d = *s;
                }
            }
        }

        debug!(row, col, rows, cols, "read window");
        Ok(out)
    }

    /// Reads one chunk of the chunk grid
    pub fn read_chunk(&self, chunk_row: usize, chunk_col: usize) -> Result<Array2<T>> {
        let region = self.grid.region(chunk_row, chunk_col)?;
        self.read_region(&region)
    }

    pub fn read_region(&self, region: &ChunkRegion) -> Result<Array2<T>> {
        self.read_window(region.row, region.col, region.rows, region.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::{GeoTiffWriter, WriteOptions};
    use crate::projection::{Affine, Crs};
    use tempfile::NamedTempFile;

    fn sample_file(rows: usize, cols: usize) -> (NamedTempFile, Array2<i32>) {
        let grid = Array2::from_shape_fn((rows, cols), |(r, c)| (r * 100 + c) as i32);
        let file = NamedTempFile::new().unwrap();
        let options = WriteOptions { tile_width: 16, tile_height: 16, ..Default::default() };
        GeoTiffWriter::new(options)
            .unwrap()
            .write_to_path(
                file.path(),
                grid.view(),
                &GeoInfo::new(Affine::identity(), Crs::epsg(3857)),
                Some("sample"),
            )
            .unwrap();
        (file, grid)
    }

    #[test]
    fn test_chunk_grid_edges() {
        let grid = ChunkGrid::new(50, 35, ChunkShape::new(10, 20)).unwrap();
        assert_eq!(grid.chunks_down(), 3);
        assert_eq!(grid.chunks_across(), 4);
        assert_eq!(grid.chunk_count(), 12);

        let last = grid.region(2, 3).unwrap();
        assert_eq!((last.row, last.col, last.rows, last.cols), (40, 30, 10, 5));
        assert!(grid.region(3, 0).is_err());

        assert_eq!(grid.locate(45, 31), Some((2, 3)));
        assert_eq!(grid.locate(50, 0), None);

        let regions = grid.regions();
        assert_eq!(regions.len(), 12);
        assert_eq!(regions.iter().map(|r| r.rows * r.cols).sum::<usize>(), 50 * 35);
    }

    #[test]
    fn test_chunk_grid_clamps_and_rejects_zero() {
        let grid = ChunkGrid::new(4, 4, ChunkShape::new(1000, 1000)).unwrap();
        assert_eq!(grid.chunk_shape(), ChunkShape::new(4, 4));
        assert_eq!(grid.chunk_count(), 1);

        assert!(matches!(
            ChunkGrid::new(4, 4, ChunkShape::new(0, 10)),
            Err(Error::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn test_read_window_across_tiles() {
        let (file, grid) = sample_file(40, 37);
        let raster = ChunkedRaster::<i32>::open(file.path(), ChunkShape::new(10, 10)).unwrap();

        assert_eq!(raster.dimensions(), (40, 37));
        assert_eq!(raster.description(), Some("sample"));
        assert_eq!(raster.geo_info().unwrap().crs, Some(Crs::epsg(3857)));

        let window = raster.read_window(10, 12, 20, 25).unwrap();
        assert_eq!(window, grid.slice(ndarray::s![10..30, 12..37]).to_owned());
        assert_eq!(raster.read_window(0, 0, 40, 37).unwrap(), grid);
    }

    #[test]
    fn test_read_chunk_and_value() {
        let (file, grid) = sample_file(25, 25);
        let raster = ChunkedRaster::<i32>::open(file.path(), ChunkShape::new(10, 10)).unwrap();

        let chunk = raster.read_chunk(2, 1).unwrap();
        assert_eq!(chunk.dim(), (5, 10));
        assert_eq!(chunk, grid.slice(ndarray::s![20..25, 10..20]).to_owned());

        assert_eq!(raster.read_value(24, 24).unwrap(), 2424);
        assert!(matches!(raster.read_value(25, 0), Err(Error::OutOfBounds(_))));
        assert!(matches!(raster.read_window(20, 0, 10, 1), Err(Error::OutOfBounds(_))));
        assert!(raster.cache_stats().tile_count > 0);
    }

    #[test]
    fn test_type_mismatch() {
        let (file, _) = sample_file(4, 4);
        let result = ChunkedRaster::<i64>::open(file.path(), ChunkShape::new(2, 2));
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let (file, _) = sample_file(4, 4);
        let result = ChunkedRaster::<i32>::open(file.path(), ChunkShape::new(0, 2));
        assert!(matches!(result, Err(Error::InvalidChunkShape(_))));
    }
}
