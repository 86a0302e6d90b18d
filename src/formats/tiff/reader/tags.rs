//! Tag value reading operations

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::formats::tiff::IFDEntry;
use crate::formats::tiff::tags::field_types;

/// Decodes tag values from the mapped file bytes
pub struct TagReader<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    is_big_tiff: bool,
}

impl<'a> TagReader<'a> {
    pub fn new(data: &'a [u8], byte_order: ByteOrder, is_big_tiff: bool) -> Self {
        Self {
            data,
            byte_order,
            is_big_tiff,
        }
    }

    /// Reads tag values as f64 array (DOUBLE or FLOAT)
    pub fn read_doubles(&self, entry: &IFDEntry) -> Result<Vec<f64>> {
        let bytes = self.value_bytes(entry)?;
        match entry.field_type {
            field_types::DOUBLE => Ok(bytes
                .chunks_exact(8)
                .map(|c| self.byte_order.decode_f64(to_array(c)))
                .collect()),
            field_types::FLOAT => Ok(bytes
                .chunks_exact(4)
                .map(|c| f32::from_bits(self.byte_order.decode_u32(to_array(c))) as f64)
                .collect()),
            _ => Err(Error::InvalidFormat(format!(
                "Tag {} expected DOUBLE or FLOAT, found field type {}",
                entry.tag, entry.field_type
            ))),
        }
    }

    /// Reads tag values as u16 array (SHORT)
    pub fn read_u16s(&self, entry: &IFDEntry) -> Result<Vec<u16>> {
        if entry.field_type != field_types::SHORT {
            return Err(Error::InvalidFormat(format!(
                "Tag {} expected SHORT, found field type {}",
                entry.tag, entry.field_type
            )));
        }
        let bytes = self.value_bytes(entry)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|c| self.byte_order.decode_u16(to_array(c)))
            .collect())
    }

    /// Reads unsigned integer tag values widened to u64 (SHORT, LONG, LONG8, IFD8)
    pub fn read_u64s(&self, entry: &IFDEntry) -> Result<Vec<u64>> {
        let bytes = self.value_bytes(entry)?;
        match entry.field_type {
            field_types::SHORT => Ok(bytes
                .chunks_exact(2)
                .map(|c| self.byte_order.decode_u16(to_array(c)) as u64)
                .collect()),
            field_types::LONG => Ok(bytes
                .chunks_exact(4)
                .map(|c| self.byte_order.decode_u32(to_array(c)) as u64)
                .collect()),
            field_types::LONG8 | field_types::IFD8 => Ok(bytes
                .chunks_exact(8)
                .map(|c| self.byte_order.decode_u64(to_array(c)))
                .collect()),
            _ => Err(Error::InvalidFormat(format!(
                "Tag {} expected an unsigned integer type, found field type {}",
                entry.tag, entry.field_type
            ))),
        }
    }

    /// Reads ASCII string from tag
    pub fn read_ascii(&self, entry: &IFDEntry) -> Result<String> {
        let bytes = self.value_bytes(entry)?;
        let s = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\0')
            .to_string();
        Ok(s)
    }

    /// Returns the raw bytes of an entry's values, inline or out of line
    fn value_bytes(&self, entry: &IFDEntry) -> Result<Vec<u8>> {
        let len = usize::try_from(entry.byte_len())
            .map_err(|_| Error::InvalidFormat(format!("Tag {} is too large", entry.tag)))?;

        if entry.is_inline(self.is_big_tiff) {
            return Ok(entry.raw[..len].to_vec());
        }

        let start = usize::try_from(entry.value_offset)
            .map_err(|_| Error::InvalidOffset(entry.value_offset))?;
        let end = start.checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::InvalidOffset(entry.value_offset))?;

        Ok(self.data[start..end].to_vec())
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16s_inline() {
        let entry = IFDEntry::new(256, field_types::SHORT, 2, 0x00020001);
        let tag_reader = TagReader::new(&[], ByteOrder::LittleEndian, false);

        let values = tag_reader.read_u16s(&entry).unwrap();
        assert_eq!(values, vec![0x0001, 0x0002]);
    }

    #[test]
    fn test_read_u64s_widens_long() {
        let entry = IFDEntry::new(256, field_types::LONG, 1, 0x12345678);
        let tag_reader = TagReader::new(&[], ByteOrder::LittleEndian, false);

        assert_eq!(tag_reader.read_u64s(&entry).unwrap(), vec![0x12345678]);
    }

    #[test]
    fn test_read_u64s_out_of_line_big_endian() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&7u32.to_be_bytes());
        data.extend_from_slice(&9u32.to_be_bytes());

        let entry = IFDEntry::new(324, field_types::LONG, 2, 4);
        let tag_reader = TagReader::new(&data, ByteOrder::BigEndian, false);

        assert_eq!(tag_reader.read_u64s(&entry).unwrap(), vec![7, 9]);
    }

    #[test]
    fn test_read_ascii_inline() {
        let text = "Hi";
        let mut value_offset = 0u64;
        value_offset |= text.as_bytes()[0] as u64;
        value_offset |= (text.as_bytes()[1] as u64) << 8;

        let entry = IFDEntry::new(256, field_types::ASCII, 2, value_offset);
        let tag_reader = TagReader::new(&[], ByteOrder::LittleEndian, false);

        assert_eq!(tag_reader.read_ascii(&entry).unwrap(), "Hi");
    }

    #[test]
    fn test_read_doubles_non_inline() {
        let mut data = vec![];
        data.extend_from_slice(&0f64.to_le_bytes());
        data.extend_from_slice(&1f64.to_le_bytes());
        data.extend_from_slice(&2.5f64.to_le_bytes());

        let entry = IFDEntry::new(256, field_types::DOUBLE, 3, 0);
        let tag_reader = TagReader::new(&data, ByteOrder::LittleEndian, false);

        assert_eq!(tag_reader.read_doubles(&entry).unwrap(), vec![0.0, 1.0, 2.5]);
    }

    #[test]
    fn test_offset_past_end_is_rejected() {
        let entry = IFDEntry::new(256, field_types::DOUBLE, 3, 100);
        let tag_reader = TagReader::new(&[0u8; 16], ByteOrder::LittleEndian, false);

        assert!(matches!(tag_reader.read_doubles(&entry), Err(Error::InvalidOffset(100))));
    }

    #[test]
    fn test_wrong_field_type() {
        let entry = IFDEntry::new(256, field_types::ASCII, 2, 0);
        let tag_reader = TagReader::new(&[], ByteOrder::LittleEndian, false);

        assert!(tag_reader.read_u16s(&entry).is_err());
        assert!(tag_reader.read_doubles(&entry).is_err());
    }
}
