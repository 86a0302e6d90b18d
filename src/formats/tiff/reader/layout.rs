//! Block (tile or strip) addressing

use crate::error::{Error, Result};
use crate::formats::tiff::{tags, IFD};
use crate::types::Dimensions;

/// How an image is cut into independently stored blocks
///
/// Tiled images use TileWidth x TileLength blocks; strip images are treated
/// as blocks that span the full width and RowsPerStrip rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Image size
    pub image: Dimensions,
    /// Block size
    pub block: Dimensions,
    /// Whether blocks are tiles rather than strips
    pub tiled: bool,
}

impl BlockLayout {
    /// Derives the layout from an IFD's size and tiling tags
    pub fn from_ifd(ifd: &IFD) -> Result<Self> {
        let image = ifd.dimensions()
            .ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;

        if image.width == 0 || image.height == 0 {
            return Err(Error::InvalidFormat(format!(
                "Image has zero extent ({} x {})",
                image.width, image.height
            )));
        }

        let (block, tiled) = if ifd.is_tiled() {
            let tile = ifd.tile_dimensions()
                .ok_or(Error::MissingTag(tags::TILE_LENGTH))?;
            (tile, true)
        } else {
            let rows = ifd.rows_per_strip().unwrap_or(image.height).min(image.height);
            (Dimensions::new(image.width, rows), false)
        };

        if block.width == 0 || block.height == 0 {
            return Err(Error::InvalidFormat("Zero block size".to_string()));
        }

        Ok(Self { image, block, tiled })
    }

    /// Number of block columns
    pub fn blocks_across(&self) -> u64 {
        self.image.width.div_ceil(self.block.width)
    }

    /// Number of block rows
    pub fn blocks_down(&self) -> u64 {
        self.image.height.div_ceil(self.block.height)
    }

    /// Total number of blocks
    pub fn block_count(&self) -> u64 {
        self.blocks_across() * self.blocks_down()
    }

    /// Number of pixels in a full block
    pub fn block_pixels(&self) -> usize {
        (self.block.width * self.block.height) as usize
    }

    /// Validates that pixel coordinates are within bounds
    pub fn validate_pixel_bounds(&self, x: u64, y: u64) -> Result<()> {
        if x >= self.image.width || y >= self.image.height {
            return Err(Error::OutOfBounds(format!(
                "Pixel ({}, {}) outside image bounds ({}, {})",
                x, y, self.image.width, self.image.height
            )));
        }
        Ok(())
    }

    /// Calculates which block contains a pixel
    pub fn block_index(&self, x: u64, y: u64) -> usize {
        let block_x = x / self.block.width;
        let block_y = y / self.block.height;
        (block_y * self.blocks_across() + block_x) as usize
    }

    /// Calculates pixel index within a block
    pub fn index_in_block(&self, x: u64, y: u64) -> usize {
        let pixel_x = (x % self.block.width) as usize;
        let pixel_y = (y % self.block.height) as usize;
        pixel_y * self.block.width as usize + pixel_x
    }

    /// Pixel position of a block's top-left corner as (x, y)
    pub fn block_origin(&self, index: usize) -> (u64, u64) {
        let index = index as u64;
        let across = self.blocks_across();
        ((index % across) * self.block.width, (index / across) * self.block.height)
    }

    /// Indices of all blocks overlapping the window `[x0, x0+w) x [y0, y0+h)`
    pub fn blocks_in_window(&self, x0: u64, y0: u64, w: u64, h: u64) -> Vec<usize> {
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let first_col = x0 / self.block.width;
        let last_col = (x0 + w - 1) / self.block.width;
        let first_row = y0 / self.block.height;
        let last_row = (y0 + h - 1) / self.block.height;
        let across = self.blocks_across();

        (first_row..=last_row)
            .flat_map(|r| (first_col..=last_col).map(move |c| (r * across + c) as usize))
            .collect()
    }
}
