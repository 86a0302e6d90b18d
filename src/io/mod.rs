//! I/O utilities for rasterlab
//!
//! Byte order handling shared by the TIFF reader and writer, and the sink
//! trait the writer targets.

pub mod byte_order;

pub use byte_order::ByteOrder;

use std::io::{Seek, Write};

/// Trait for sinks that support both writing and seeking
///
/// The TIFF writer streams tile data first and patches the header with the
/// directory offset at the end, so plain [`Write`] is not enough. It is
/// implemented for any type that implements both traits.
pub trait SeekableWriter: Write + Seek {}

impl<T: Write + Seek> SeekableWriter for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    #[test]
    fn test_cursor_implements_seekable_writer() {
        fn patch<W: SeekableWriter>(w: &mut W) {
            w.write_all(&[0, 0, 9, 9]).unwrap();
            w.seek(SeekFrom::Start(0)).unwrap();
            w.write_all(&[1, 1]).unwrap();
        }

        let mut cursor = Cursor::new(Vec::new());
        patch(&mut cursor);
        assert_eq!(cursor.into_inner(), vec![1, 1, 9, 9]);
    }
}
