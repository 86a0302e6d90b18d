//! TIFF reader modules

pub mod tags;
pub mod tiles;
pub mod layout;

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use memmap2::Mmap;
use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::formats::tiff::{Tiff, IFD, IFDEntry, TIFF_MAGIC, BIGTIFF_MAGIC};

use self::tags::TagReader;
use self::tiles::TileReader;

/// Upper bound on IFDs followed before the chain is considered corrupt
const MAX_IFDS: usize = 1000;

/// Memory-mapped TIFF / BigTIFF reader
pub struct TiffReader {
    data: Arc<Mmap>,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    first_ifd_offset: u64,
}

impl TiffReader {
    /// Opens a TIFF file for reading and parses its header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < 8 {
            return Err(Error::InvalidFormat(format!(
                "File is {} bytes, too short for a TIFF header",
                len
            )));
        }

        // The file is opened read-only and rasterlab never rewrites a file in place.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_mmap(Arc::new(mmap))
    }

    fn from_mmap(data: Arc<Mmap>) -> Result<Self> {
        let (byte_order, is_big_tiff, first_ifd_offset) = {
            let mut cursor = Cursor::new(&data[..]);

            let mut magic = [0u8; 2];
            cursor.read_exact(&mut magic)?;
            let byte_order = ByteOrder::from_tiff_magic(magic)
                .ok_or(Error::InvalidByteOrder(u16::from_be_bytes(magic)))?;

            let version = byte_order.read_u16(&mut cursor)?;
            let is_big_tiff = match version {
                TIFF_MAGIC => false,
                BIGTIFF_MAGIC => true,
                _ => return Err(Error::InvalidMagic(version)),
            };

            let first_ifd_offset = if is_big_tiff {
                let offset_size = byte_order.read_u16(&mut cursor)?;
                if offset_size != 8 {
                    return Err(Error::InvalidFormat(
                        format!("Invalid BigTIFF offset size: {}", offset_size)
                    ));
                }
                let _reserved = byte_order.read_u16(&mut cursor)?;
                byte_order.read_u64(&mut cursor)?
            } else {
                byte_order.read_u32(&mut cursor)? as u64
            };

            (byte_order, is_big_tiff, first_ifd_offset)
        };

        Ok(Self {
            data,
            byte_order,
            is_big_tiff,
            first_ifd_offset,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// The mapped file contents
    pub fn data(&self) -> &Arc<Mmap> {
        &self.data
    }

    /// Reads the IFD chain and returns the file structure
    pub fn read(&self) -> Result<Tiff> {
        let mut tiff = Tiff::new(self.is_big_tiff);
        let mut next_ifd_offset = self.first_ifd_offset;
        let mut seen = HashSet::new();

        while next_ifd_offset != 0 {
            if tiff.ifd_count() >= MAX_IFDS {
                return Err(Error::InvalidFormat("Too many IFDs".to_string()));
            }
            if !seen.insert(next_ifd_offset) {
                return Err(Error::InvalidFormat(format!(
                    "IFD chain loops back to offset {}",
                    next_ifd_offset
                )));
            }

            let (ifd, next) = self.read_ifd(tiff.ifd_count(), next_ifd_offset)?;
            tiff.add_ifd(ifd);
            next_ifd_offset = next;
        }

        Ok(tiff)
    }

    /// Reads a single IFD and the offset of the one after it
    fn read_ifd(&self, number: usize, offset: u64) -> Result<(IFD, u64)> {
        if offset >= self.data.len() as u64 {
            return Err(Error::InvalidOffset(offset));
        }

        let handler = self.byte_order;
        let mut reader = Cursor::new(&self.data[..]);
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(&mut reader)?
        } else {
            handler.read_u16(&mut reader)? as u64
        };

        let mut ifd = IFD::new(number, offset);

        for _ in 0..entry_count {
            let tag = handler.read_u16(&mut reader)?;
            let field_type = handler.read_u16(&mut reader)?;

            let count = if self.is_big_tiff {
                handler.read_u64(&mut reader)?
            } else {
                handler.read_u32(&mut reader)? as u64
            };

            let mut raw = [0u8; 8];
            let field_len = if self.is_big_tiff { 8 } else { 4 };
            reader.read_exact(&mut raw[..field_len])?;

            ifd.add_entry(IFDEntry::from_raw(
                tag,
                field_type,
                count,
                raw,
                self.byte_order,
                self.is_big_tiff,
            ));
        }

        let next = if self.is_big_tiff {
            handler.read_u64(&mut reader)?
        } else {
            handler.read_u32(&mut reader)? as u64
        };

        Ok((ifd, next))
    }

    fn tag_reader(&self) -> TagReader<'_> {
        TagReader::new(&self.data[..], self.byte_order, self.is_big_tiff)
    }

    /// Reads tag values as f64 array
    pub fn read_tag_doubles(&self, entry: &IFDEntry) -> Result<Vec<f64>> {
        self.tag_reader().read_doubles(entry)
    }

    /// Reads tag values as u16 array
    pub fn read_tag_u16s(&self, entry: &IFDEntry) -> Result<Vec<u16>> {
        self.tag_reader().read_u16s(entry)
    }

    /// Reads unsigned integer tag values widened to u64
    pub fn read_tag_u64s(&self, entry: &IFDEntry) -> Result<Vec<u64>> {
        self.tag_reader().read_u64s(entry)
    }

    /// Reads ASCII string from tag
    pub fn read_tag_ascii(&self, entry: &IFDEntry) -> Result<String> {
        self.tag_reader().read_ascii(entry)
    }

    /// Prepares block-level access to an image
    pub fn tile_reader(&self, ifd: &IFD) -> Result<TileReader> {
        TileReader::new(self, ifd)
    }
}
