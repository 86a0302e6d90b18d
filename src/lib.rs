//! rasterlab - synthetic GeoTIFF generation, footprint probing and lazy chunked scaling
//!
//! rasterlab bundles three small raster tools on top of a hand-rolled
//! TIFF/GeoTIFF codec: a generator that writes random georeferenced grids,
//! a probe that measures a grid's memory before and after narrowing, and a
//! chunked reader with a deferred expression graph.
//!
//! # Examples
//!
//! ## Generating a raster
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rasterlab::generator::{self, GeneratorConfig};
//!
//! let config = GeneratorConfig { width: 256, height: 128, ..Default::default() };
//! let raster = generator::run(&config, &mut StdRng::seed_from_u64(42))?;
//! println!("{} x {} written to {}", raster.shape().0, raster.shape().1, config.output.display());
//! # Ok::<(), rasterlab::Error>(())
//! ```
//!
//! ## Scaling lazily
//!
//! ```no_run
//! use rasterlab::{ChunkShape, LazyRaster};
//!
//! let doubled = LazyRaster::<i64>::open("completely_random_data.tif", ChunkShape::new(1000, 1000))? * 2;
//! println!("{}", doubled);
//! let first = doubled.compute_chunk(0, 0)?;
//! println!("first chunk: {:?}", first.dim());
//! # Ok::<(), rasterlab::Error>(())
//! ```
//!
//! ## Inspecting a file
//!
//! ```no_run
//! use rasterlab::{GeoInfo, TiffReader};
//!
//! let reader = TiffReader::open("completely_random_data.tif")?;
//! let tiff = reader.read()?;
//!
//! if let Some(ifd) = tiff.main_ifd() {
//!     let dims = ifd.dimensions().unwrap();
//!     println!("Size: {} x {}", dims.width, dims.height);
//!     if let Some(geo) = GeoInfo::from_ifd(ifd, &reader)? {
//!         println!("{}", geo);
//!     }
//! }
//! # Ok::<(), rasterlab::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod grid;
pub mod formats;
pub mod compression;
pub mod cache;
pub mod projection;
pub mod raster;
pub mod lazy;
pub mod generator;
pub mod probe;
pub mod scaler;
pub mod config;
pub mod logging;

pub use error::{Error, Result};
pub use types::{DataType, Dimensions};
pub use grid::{CastInto, Element};
pub use formats::tiff::{
    Tiff, TiffReader, TileReader, IFD, IFDEntry, GeoInfo,
    GeoTiffWriter, WriteOptions, BigTiffMode,
    tags, TIFF_MAGIC, BIGTIFF_MAGIC
};
pub use compression::Compression;
pub use io::ByteOrder;
pub use projection::{Affine, Coordinate, Crs};
pub use raster::GeoRaster;
pub use lazy::{ChunkGrid, ChunkShape, ChunkedRaster, Expr, LazyRaster};
pub use probe::FootprintReport;
