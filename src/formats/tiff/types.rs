//! TIFF data structures

use super::ifd::IFD;
use super::tags;
use crate::compression::Compression;
use std::fmt;

/// The directory structure of a TIFF or BigTIFF file
#[derive(Debug)]
pub struct Tiff {
    /// Whether this is BigTIFF format
    pub is_big_tiff: bool,
    /// Image File Directories
    pub ifds: Vec<IFD>,
}

impl Tiff {
    pub fn new(is_big_tiff: bool) -> Self {
        Self {
            is_big_tiff,
            ifds: Vec::new(),
        }
    }

    pub fn add_ifd(&mut self, ifd: IFD) {
        self.ifds.push(ifd);
    }

    /// Returns the main (first) IFD, the one rasterlab reads and writes
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }

    pub fn all_ifds(&self) -> &[IFD] {
        &self.ifds
    }
}

impl fmt::Display for Tiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File Information:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        if let Some(ifd) = self.main_ifd() {
            writeln!(f, "\nMain Image (IFD 0):")?;
            if let Some(dims) = ifd.dimensions() {
                writeln!(f, "  Dimensions: {} x {}", dims.width, dims.height)?;
            }
            writeln!(f, "  Samples per pixel: {}", ifd.samples_per_pixel())?;
            match ifd.data_type() {
                Some(dt) => writeln!(f, "  Data type: {}", dt.name())?,
                None => {
                    if let Some(bits) = ifd.bits_per_sample() {
                        writeln!(f, "  Bits per sample: {}", bits)?;
                    }
                }
            }
            if let Some(code) = ifd.compression() {
                match Compression::from_tag(code) {
                    Ok(c) => writeln!(f, "  Compression: {}", c.name())?,
                    Err(_) => writeln!(f, "  Compression: {} (unsupported)", code)?,
                }
            }
            if ifd.predictor() != 1 {
                writeln!(f, "  Predictor: {}", ifd.predictor())?;
            }
            writeln!(f, "  Tiled: {}", if ifd.is_tiled() { "Yes" } else { "No" })?;
            if let Some(tile_dims) = ifd.tile_dimensions() {
                writeln!(f, "  Tile size: {} x {}", tile_dims.width, tile_dims.height)?;
            }
            writeln!(f, "  GeoTIFF: {}", if ifd.is_geotiff() { "Yes" } else { "No" })?;

            if ifd.is_geotiff() {
                writeln!(f, "\nGeoTIFF Tags Found:")?;
                for tag in ifd.geotiff_tags() {
                    writeln!(f, "  Tag {}: {} ({} values)",
                        tag.tag,
                        tags::tag_name(tag.tag),
                        tag.count
                    )?;
                }
            }
        }

        Ok(())
    }
}
