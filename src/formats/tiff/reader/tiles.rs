//! Block loading and decoding

use std::sync::Arc;
use memmap2::Mmap;
use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::formats::tiff::{IFD, tags};
use crate::grid::Element;
use crate::io::ByteOrder;
use crate::types::DataType;
use super::layout::BlockLayout;
use super::TiffReader;

/// Reverses horizontal differencing (TIFF predictor 2) row by row
fn undo_horizontal_predictor<T: Element>(values: &mut [T], row_len: usize) {
    for row in values.chunks_mut(row_len) {
        for i in 1..row.len() {
            row[i] = row[i].wrapping_add(row[i - 1]);
        }
    }
}

/// Reads and decodes the blocks of one single-band image
///
/// All state is immutable after construction and the file is memory mapped,
/// so one reader can serve many threads.
#[derive(Debug)]
pub struct TileReader {
    data: Arc<Mmap>,
    byte_order: ByteOrder,
    layout: BlockLayout,
    compression: Compression,
    predictor: u64,
    data_type: DataType,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl TileReader {
    /// Prepares block access for `ifd`, rejecting layouts that cannot be read
    pub fn new(reader: &TiffReader, ifd: &IFD) -> Result<Self> {
        let layout = BlockLayout::from_ifd(ifd)?;

        let samples = ifd.samples_per_pixel();
        if samples != 1 {
            return Err(Error::Unsupported(format!("{} samples per pixel", samples)));
        }
        if ifd.planar_configuration() != 1 {
            return Err(Error::Unsupported("Planar configuration 2".to_string()));
        }

        let data_type = ifd.data_type().ok_or_else(|| {
            Error::Unsupported(format!(
                "Sample format {} with {:?} bits per sample",
                ifd.sample_format(),
                ifd.bits_per_sample()
            ))
        })?;

        let compression = Compression::from_tag(ifd.compression().unwrap_or(1))?;

        let predictor = ifd.predictor();
        match predictor {
            1 => {}
            2 if !data_type.is_float() => {}
            other => {
                return Err(Error::Unsupported(format!(
                    "Predictor {} for {} samples",
                    other, data_type
                )))
            }
        }

        let (offsets_tag, counts_tag) = if layout.tiled {
            (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        let offsets = reader.read_tag_u64s(
            ifd.get_entry(offsets_tag).ok_or(Error::MissingTag(offsets_tag))?,
        )?;
        let byte_counts = reader.read_tag_u64s(
            ifd.get_entry(counts_tag).ok_or(Error::MissingTag(counts_tag))?,
        )?;

        let expected = layout.block_count();
        if offsets.len() as u64 != expected || byte_counts.len() as u64 != expected {
            return Err(Error::InvalidFormat(format!(
                "Expected {} blocks, found {} offsets and {} byte counts",
                expected,
                offsets.len(),
                byte_counts.len()
            )));
        }

        Ok(Self {
            data: Arc::clone(reader.data()),
            byte_order: reader.byte_order(),
            layout,
            compression,
            predictor,
            data_type,
            offsets,
            byte_counts,
        })
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Reads and decompresses one block
    ///
    /// Sparse blocks (byte count 0) come back zero filled.
    pub fn read_block_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let (offset, byte_count) = match (self.offsets.get(index), self.byte_counts.get(index)) {
            (Some(&o), Some(&c)) => (o, c),
            _ => {
                return Err(Error::OutOfBounds(format!(
                    "Block {} of {}",
                    index,
                    self.offsets.len()
                )))
            }
        };

        if byte_count == 0 {
            return Ok(vec![0u8; self.layout.block_pixels() * self.data_type.size()]);
        }

        let start = offset as usize;
        let end = start
            .checked_add(byte_count as usize)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::OutOfBounds(format!(
                "Block {} data range {}+{} exceeds file size {}",
                index, offset, byte_count, self.data.len()
            )))?;

        self.compression.decompress(&self.data[start..end])
    }

    /// Reads one block as decoded elements in row-major block order
    pub fn read_block<T: Element>(&self, index: usize) -> Result<Vec<T>> {
        if T::DATA_TYPE != self.data_type {
            return Err(Error::TypeMismatch {
                expected: T::DATA_TYPE.to_string(),
                found: self.data_type.to_string(),
            });
        }

        let bytes = self.read_block_bytes(index)?;
        let size = self.data_type.size();
        if bytes.len() % size != 0 {
            return Err(Error::InvalidFormat(format!(
                "Block {} holds {} bytes, not a multiple of {}",
                index,
                bytes.len(),
                size
            )));
        }

        let mut values: Vec<T> = bytes
            .chunks_exact(size)
            .map(|c| T::decode(c, self.byte_order))
            .collect();

        if self.predictor == 2 {
            undo_horizontal_predictor(&mut values, self.layout.block.width as usize);
        }

        Ok(values)
    }
}
