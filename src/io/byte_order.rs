//! Byte order (endianness) handling
//!
//! TIFF files may be written in either byte order. Values are read either from
//! a [`Read`] stream (headers and directories) or decoded from byte slices
//! (inline tag fields and tile payloads taken from the memory map).

use std::io::{self, Read};

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

macro_rules! byte_order_codec {
    ($($read:ident, $decode:ident => $t:ty),* $(,)?) => {
        impl ByteOrder {
            $(
                #[doc = concat!("Reads a `", stringify!($t), "` from the stream")]
                pub fn $read<R: Read + ?Sized>(&self, reader: &mut R) -> io::Result<$t> {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    reader.read_exact(&mut buf)?;
                    Ok(self.$decode(buf))
                }

                #[doc = concat!("Decodes a `", stringify!($t), "` from raw bytes")]
                pub fn $decode(&self, bytes: [u8; std::mem::size_of::<$t>()]) -> $t {
                    match self {
                        ByteOrder::LittleEndian => <$t>::from_le_bytes(bytes),
                        ByteOrder::BigEndian => <$t>::from_be_bytes(bytes),
                    }
                }
            )*
        }
    };
}

byte_order_codec! {
    read_u16, decode_u16 => u16,
    read_u32, decode_u32 => u32,
    read_u64, decode_u64 => u64,
    read_f64, decode_f64 => f64,
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// The two marker bytes that open a TIFF in this byte order
    pub fn tiff_magic(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }
}
