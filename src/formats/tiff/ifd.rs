//! Image File Directory (IFD) structures

use std::collections::HashMap;
use crate::io::ByteOrder;
use crate::types::{Dimensions, DataType};
use super::tags::{self, field_types};

/// Represents an Image File Directory entry
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Decoded scalar value, or offset to the value data
    pub value_offset: u64,
    /// The value field exactly as stored, zero padded to 8 bytes
    pub raw: [u8; 8],
}

impl IFDEntry {
    /// Creates a new IFD entry with a little-endian value field
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_offset,
            raw: value_offset.to_le_bytes(),
        }
    }

    /// Builds an entry from the value field bytes read from a file
    ///
    /// Single SHORT, LONG and LONG8 values are decoded in place so that
    /// [`IFD::get_tag_value`] works regardless of byte order; everything else
    /// decodes the field as an offset.
    pub fn from_raw(
        tag: u16,
        field_type: u16,
        count: u64,
        raw: [u8; 8],
        byte_order: ByteOrder,
        is_big_tiff: bool,
    ) -> Self {
        let value_offset = match (field_type, count) {
            (field_types::SHORT, 1) => byte_order.decode_u16([raw[0], raw[1]]) as u64,
            (field_types::LONG, 1) => {
                byte_order.decode_u32([raw[0], raw[1], raw[2], raw[3]]) as u64
            }
            _ if is_big_tiff => byte_order.decode_u64(raw),
            _ => byte_order.decode_u32([raw[0], raw[1], raw[2], raw[3]]) as u64,
        };

        Self {
            tag,
            field_type,
            count,
            value_offset,
            raw,
        }
    }

    /// Returns the size in bytes of this field type
    pub fn field_type_size(&self) -> usize {
        field_types::size(self.field_type)
    }

    /// Total size of the entry's values in bytes
    pub fn byte_len(&self) -> u64 {
        self.field_type_size() as u64 * self.count
    }

    /// Returns whether the value is stored inline (in value_offset field)
    pub fn is_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        self.byte_len() <= inline_size
    }
}

/// Represents an Image File Directory
#[derive(Debug, Clone)]
pub struct IFD {
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in file
    pub offset: u64,
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// Tag map for quick lookup
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            number,
            offset,
            entries: Vec::new(),
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    pub fn add_entry(&mut self, entry: IFDEntry) {
        let index = self.entries.len();
        self.tag_map.insert(entry.tag, index);
        self.entries.push(entry);
    }

    /// Gets an entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).and_then(|&idx| self.entries.get(idx))
    }

    /// Gets the value of a tag as u64 (for inline values)
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_entry(tag).map(|e| e.value_offset)
    }

    /// Returns image dimensions if available
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns compression type
    pub fn compression(&self) -> Option<u64> {
        self.get_tag_value(tags::COMPRESSION)
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample
    pub fn bits_per_sample(&self) -> Option<u64> {
        self.get_tag_value(tags::BITS_PER_SAMPLE)
    }

    /// Returns sample format (1=unsigned, 2=signed, 3=float)
    pub fn sample_format(&self) -> u64 {
        self.get_tag_value(tags::SAMPLE_FORMAT).unwrap_or(1)
    }

    /// Returns planar configuration (1=chunky, 2=planar)
    pub fn planar_configuration(&self) -> u64 {
        self.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(1)
    }

    /// Returns predictor (1=none, 2=horizontal differencing)
    pub fn predictor(&self) -> u64 {
        self.get_tag_value(tags::PREDICTOR).unwrap_or(1)
    }

    /// Determines the pixel data type based on TIFF tags
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_tiff(self.sample_format(), self.bits_per_sample()?)
    }

    /// Returns whether this IFD represents a tiled image
    pub fn is_tiled(&self) -> bool {
        self.get_entry(tags::TILE_WIDTH).is_some()
    }

    /// Returns tile dimensions if tiled
    pub fn tile_dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::TILE_WIDTH)?;
        let height = self.get_tag_value(tags::TILE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns rows per strip for strip-organized images
    pub fn rows_per_strip(&self) -> Option<u64> {
        self.get_tag_value(tags::ROWS_PER_STRIP)
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns all GeoTIFF related tags
    pub fn geotiff_tags(&self) -> Vec<&IFDEntry> {
        self.entries.iter()
            .filter(|e| {
                matches!(e.tag,
                    tags::MODEL_PIXEL_SCALE |
                    tags::MODEL_TIEPOINT |
                    tags::MODEL_TRANSFORMATION |
                    tags::GEO_KEY_DIRECTORY |
                    tags::GEO_DOUBLE_PARAMS |
                    tags::GEO_ASCII_PARAMS
                )
            })
            .collect()
    }

    /// Checks if this IFD has GeoTIFF tags
    pub fn is_geotiff(&self) -> bool {
        !self.geotiff_tags().is_empty()
    }
}
