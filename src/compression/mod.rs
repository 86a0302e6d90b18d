//! Compression and decompression of tile payloads

pub mod deflate;

use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression
    #[default]
    None,
    /// Deflate/ZIP compression
    Deflate,
}

impl Compression {
    /// Creates compression from TIFF compression tag value
    pub fn from_tag(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Compression::None),
            // 32946 is the pre-standard Adobe Deflate code still found in old files
            8 | 32946 => Ok(Compression::Deflate),
            _ => Err(Error::Unsupported(format!("Compression type {}", value))),
        }
    }

    /// Returns the TIFF compression tag value written for this type
    pub fn tag(&self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::Deflate => 8,
        }
    }

    /// Returns the name of this compression type
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Deflate => "Deflate/ZIP",
        }
    }

    /// Compresses data
    pub fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data),
            Compression::Deflate => deflate::compress(&data),
        }
    }

    /// Decompresses data
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Deflate => deflate::decompress(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_from_tag() {
        assert_eq!(Compression::from_tag(1).unwrap(), Compression::None);
        assert_eq!(Compression::from_tag(8).unwrap(), Compression::Deflate);
        assert_eq!(Compression::from_tag(32946).unwrap(), Compression::Deflate);
        assert!(matches!(Compression::from_tag(5), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_tag_matches_from_tag() {
        for c in [Compression::None, Compression::Deflate] {
            assert_eq!(Compression::from_tag(c.tag() as u64).unwrap(), c);
        }
    }

    #[test]
    fn test_no_compression() {
        let data = vec![1u8, 2, 3, 4];
        let packed = Compression::None.compress(data.clone()).unwrap();
        assert_eq!(packed, data);
        assert_eq!(Compression::None.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Compression::Deflate).unwrap();
        assert_eq!(json, "\"deflate\"");
    }
}
