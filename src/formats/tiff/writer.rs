//! Tiled GeoTIFF / BigTIFF encoding
//!
//! Files are written little-endian in a single pass: header with a
//! placeholder directory offset, tile payloads, then the IFD and its
//! out-of-line values, and finally the header offset is patched.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use ndarray::ArrayView2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::grid::Element;
use crate::io::{ByteOrder, SeekableWriter};
use super::geotiff::GeoInfo;
use super::tags::{self, field_types};
use super::{BIGTIFF_MAGIC, TIFF_MAGIC};

/// Headroom for the IFD and tag values beyond the per-tile offset arrays
const BIGTIFF_MARGIN: u64 = 1 << 20;

/// Whether a classic file holding `payload` bytes in `tile_count` tiles
/// could place its directory past the 32-bit offset limit
///
/// Each tile costs 16 bytes of offset and byte-count entries on top of
/// its data.
fn exceeds_classic_limit(payload: u64, tile_count: u64) -> bool {
    payload
        .saturating_add(tile_count.saturating_mul(16))
        .saturating_add(BIGTIFF_MARGIN)
        > u32::MAX as u64
}

/// A tag value as written to an IFD
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Long8(Vec<u64>),
    Double(Vec<f64>),
    /// Written NUL terminated
    Ascii(String),
}

impl TagValue {
    pub fn field_type(&self) -> u16 {
        match self {
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Long8(_) => field_types::LONG8,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ascii(_) => field_types::ASCII,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            TagValue::Short(v) => v.len() as u64,
            TagValue::Long(v) => v.len() as u64,
            TagValue::Long8(v) => v.len() as u64,
            TagValue::Double(v) => v.len() as u64,
            TagValue::Ascii(s) => s.len() as u64 + 1,
        }
    }

    /// Little-endian value bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            TagValue::Short(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            TagValue::Long(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            TagValue::Long8(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            TagValue::Double(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            TagValue::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
        }
        out
    }
}

/// When to write the 64-bit BigTIFF variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigTiffMode {
    /// Always classic TIFF; fails if offsets exceed 4 GiB
    Never,
    /// Always BigTIFF
    Always,
    /// BigTIFF when the uncompressed payload would not fit classic offsets
    #[default]
    IfNeeded,
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Tile width in pixels, a multiple of 16
    pub tile_width: u32,
    /// Tile height in pixels, a multiple of 16
    pub tile_height: u32,
    pub compression: Compression,
    /// Apply horizontal differencing (integer samples only)
    pub predictor: bool,
    pub big_tiff: BigTiffMode,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            tile_width: 256,
            tile_height: 256,
            compression: Compression::None,
            predictor: false,
            big_tiff: BigTiffMode::IfNeeded,
        }
    }
}

impl WriteOptions {
    /// Checks the options against the TIFF tiling rules
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.tile_width), ("height", self.tile_height)] {
            if value == 0 || value % 16 != 0 {
                return Err(Error::InvalidDimensions(format!(
                    "tile {} must be a positive multiple of 16, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Writes single-band grids as tiled GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffWriter {
    options: WriteOptions,
}

impl GeoTiffWriter {
    pub fn new(options: WriteOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Writes `grid` to `path`, replacing any existing file
    pub fn write_to_path<T, P>(
        &self,
        path: P,
        grid: ArrayView2<'_, T>,
        geo: &GeoInfo,
        description: Option<&str>,
    ) -> Result<()>
    where
        T: Element,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        // Encode the tags before touching the file so a bad CRS leaves nothing behind.
        let geo_tags = geo.to_tags()?;

        let mut out = BufWriter::new(File::create(path)?);
        let big_tiff = self.encode(&mut out, grid, geo_tags, description)?;

        info!(
            path = %path.display(),
            rows = grid.nrows(),
            cols = grid.ncols(),
            big_tiff,
            compression = self.options.compression.name(),
            "wrote GeoTIFF"
        );
        Ok(())
    }

    /// Writes `grid` to any seekable sink
    pub fn write<T, W>(
        &self,
        out: &mut W,
        grid: ArrayView2<'_, T>,
        geo: &GeoInfo,
        description: Option<&str>,
    ) -> Result<()>
    where
        T: Element,
        W: SeekableWriter,
    {
        let geo_tags = geo.to_tags()?;
        self.encode(out, grid, geo_tags, description)?;
        Ok(())
    }

    /// Returns whether BigTIFF was written
    fn encode<T, W>(
        &self,
        out: &mut W,
        grid: ArrayView2<'_, T>,
        geo_tags: Vec<(u16, TagValue)>,
        description: Option<&str>,
    ) -> Result<bool>
    where
        T: Element,
        W: SeekableWriter,
    {
        let (rows, cols) = grid.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions(format!(
                "cannot write an empty {} x {} grid",
                rows, cols
            )));
        }
        let width = u32::try_from(cols)
            .map_err(|_| Error::InvalidDimensions(format!("{} columns exceed TIFF limits", cols)))?;
        let height = u32::try_from(rows)
            .map_err(|_| Error::InvalidDimensions(format!("{} rows exceed TIFF limits", rows)))?;

        let opts = &self.options;
        if opts.predictor && T::DATA_TYPE.is_float() {
            return Err(Error::Unsupported(format!(
                "Horizontal predictor for {} samples",
                T::DATA_TYPE
            )));
        }

        let tw = opts.tile_width as usize;
        let th = opts.tile_height as usize;
        let tiles_across = cols.div_ceil(tw);
        let tiles_down = rows.div_ceil(th);
        let tile_count = tiles_across * tiles_down;

        let payload = tile_count as u64 * (tw * th * T::DATA_TYPE.size()) as u64;
        let big_tiff = match opts.big_tiff {
            BigTiffMode::Never => false,
            BigTiffMode::Always => true,
            BigTiffMode::IfNeeded => exceeds_classic_limit(payload, tile_count as u64),
        };

        debug!(rows, cols, tile_count, big_tiff, "encoding tiles");

        let order = ByteOrder::LittleEndian;
        out.write_all(&order.tiff_magic())?;
        if big_tiff {
            out.write_all(&BIGTIFF_MAGIC.to_le_bytes())?;
            out.write_all(&8u16.to_le_bytes())?;
            out.write_all(&0u16.to_le_bytes())?;
            out.write_all(&0u64.to_le_bytes())?;
        } else {
            out.write_all(&TIFF_MAGIC.to_le_bytes())?;
            out.write_all(&0u32.to_le_bytes())?;
        }

        let mut offsets = Vec::with_capacity(tile_count);
        let mut byte_counts = Vec::with_capacity(tile_count);
        let mut position = out.stream_position()?;

        for tile_row in 0..tiles_down {
            let encoded = (0..tiles_across)
                .into_par_iter()
                .map(|tile_col| self.encode_tile(&grid, tile_row, tile_col))
                .collect::<Result<Vec<Vec<u8>>>>()?;

            for bytes in encoded {
                offsets.push(position);
                byte_counts.push(bytes.len() as u64);
                out.write_all(&bytes)?;
                position += bytes.len() as u64;
            }
        }

        let mut entries = vec![
            (tags::IMAGE_WIDTH, TagValue::Long(vec![width])),
            (tags::IMAGE_LENGTH, TagValue::Long(vec![height])),
            (tags::BITS_PER_SAMPLE, TagValue::Short(vec![T::DATA_TYPE.bits()])),
            (tags::COMPRESSION, TagValue::Short(vec![opts.compression.tag()])),
            // BlackIsZero
            (tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![1])),
            (tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![1])),
            (tags::PLANAR_CONFIGURATION, TagValue::Short(vec![1])),
            (tags::SOFTWARE, TagValue::Ascii(format!(
                "{} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))),
            (tags::TILE_WIDTH, TagValue::Long(vec![opts.tile_width])),
            (tags::TILE_LENGTH, TagValue::Long(vec![opts.tile_height])),
            (tags::SAMPLE_FORMAT, TagValue::Short(vec![T::DATA_TYPE.sample_format()])),
        ];

        if let Some(text) = description {
            entries.push((tags::IMAGE_DESCRIPTION, TagValue::Ascii(text.to_string())));
        }
        if opts.predictor {
            entries.push((tags::PREDICTOR, TagValue::Short(vec![2])));
        }

        if big_tiff {
            entries.push((tags::TILE_OFFSETS, TagValue::Long8(offsets)));
            entries.push((tags::TILE_BYTE_COUNTS, TagValue::Long8(byte_counts)));
        } else {
            entries.push((tags::TILE_OFFSETS, TagValue::Long(classic_offsets(&offsets)?)));
            entries.push((tags::TILE_BYTE_COUNTS, TagValue::Long(classic_offsets(&byte_counts)?)));
        }

        entries.extend(geo_tags);
        entries.sort_by_key(|(tag, _)| *tag);

        if position % 2 == 1 {
            out.write_all(&[0])?;
            position += 1;
        }
        let ifd_offset = position;
        write_ifd(out, &entries, ifd_offset, big_tiff)?;

        if big_tiff {
            out.seek(SeekFrom::Start(8))?;
            out.write_all(&ifd_offset.to_le_bytes())?;
        } else {
            let offset = classic_offsets(&[ifd_offset])?[0];
            out.seek(SeekFrom::Start(4))?;
            out.write_all(&offset.to_le_bytes())?;
        }
        out.seek(SeekFrom::End(0))?;
        out.flush()?;

        Ok(big_tiff)
    }

    /// Encodes one tile, padding cells past the grid edge with `T::default()`
    fn encode_tile<T: Element>(
        &self,
        grid: &ArrayView2<'_, T>,
        tile_row: usize,
        tile_col: usize,
    ) -> Result<Vec<u8>> {
        let tw = self.options.tile_width as usize;
        let th = self.options.tile_height as usize;
        let (rows, cols) = grid.dim();
        let row0 = tile_row * th;
        let col0 = tile_col * tw;

        let mut values = vec![T::default(); tw * th];
        for r in 0..th.min(rows - row0) {
            let src = grid.row(row0 + r);
            let n = tw.min(cols - col0);
            let dst = &mut values[r * tw..r * tw + n];
            for (d, s) in dst.iter_mut().zip(src.iter().skip(col0)) {
                *d = *s;
            }
        }

        if self.options.predictor {
            for row in values.chunks_mut(tw) {
                for i in (1..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - 1]);
                }
            }
        }

        let mut bytes = Vec::with_capacity(values.len() * T::DATA_TYPE.size());
        for v in values {
            v.write_le(&mut bytes);
        }

        self.options.compression.compress(bytes)
    }
}

/// Narrows offsets for a classic TIFF, failing past 4 GiB
fn classic_offsets(values: &[u64]) -> Result<Vec<u32>> {
    values
        .iter()
        .map(|&v| {
            u32::try_from(v).map_err(|_| Error::Unsupported(
                "file exceeds 4 GiB; write it as BigTIFF".to_string()
            ))
        })
        .collect()
}

/// Writes the directory at the current position followed by its out-of-line values
pub(crate) fn write_ifd<W: SeekableWriter>(
    out: &mut W,
    entries: &[(u16, TagValue)],
    ifd_offset: u64,
    big_tiff: bool,
) -> Result<()> {
    let inline_size = if big_tiff { 8 } else { 4 };
    let entry_size = if big_tiff { 20 } else { 12 };
    let header_size = if big_tiff { 8 } else { 2 };
    let next_size = if big_tiff { 8 } else { 4 };

    let mut data_offset = ifd_offset + (header_size + entries.len() * entry_size + next_size) as u64;
    let mut directory = Vec::with_capacity(entries.len() * entry_size + header_size + next_size);
    let mut extra = Vec::new();

    if big_tiff {
        directory.extend_from_slice(&(entries.len() as u64).to_le_bytes());
    } else {
        directory.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    }

    for (tag, value) in entries {
        let bytes = value.encode();
        directory.extend_from_slice(&tag.to_le_bytes());
        directory.extend_from_slice(&value.field_type().to_le_bytes());
        if big_tiff {
            directory.extend_from_slice(&value.count().to_le_bytes());
        } else {
            let count = u32::try_from(value.count())
                .map_err(|_| Error::Unsupported(format!("tag {} has too many values", tag)))?;
            directory.extend_from_slice(&count.to_le_bytes());
        }

        let mut field = vec![0u8; inline_size];
        if bytes.len() <= inline_size {
            field[..bytes.len()].copy_from_slice(&bytes);
        } else {
            if big_tiff {
                field.copy_from_slice(&data_offset.to_le_bytes());
            } else {
                field.copy_from_slice(&classic_offsets(&[data_offset])?[0].to_le_bytes());
            }
            data_offset += bytes.len() as u64;
            extra.extend_from_slice(&bytes);
            if bytes.len() % 2 == 1 {
                extra.push(0);
                data_offset += 1;
            }
        }
        directory.extend_from_slice(&field);
    }

    directory.extend_from_slice(&vec![0u8; next_size]);

    out.write_all(&directory)?;
    out.write_all(&extra)?;
    Ok(())
}
