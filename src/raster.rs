//! Georeferenced rasters held in memory

use std::path::Path;

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::formats::tiff::{tags, GeoInfo, GeoTiffWriter, WriteOptions};
use crate::grid::Element;
use crate::lazy::{ChunkShape, ChunkedRaster};
use crate::projection::{Affine, Crs};
use crate::io::SeekableWriter;

/// A grid plus the coordinates, transform and CRS that place it on the ground
///
/// `x` has one entry per column and `y` one per row; construction fails when
/// the grid shape disagrees with them.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster<T: Element> {
    name: String,
    data: Array2<T>,
    x: Array1<f64>,
    y: Array1<f64>,
    transform: Affine,
    crs: Crs,
}

impl<T: Element> GeoRaster<T> {
    pub fn new(
        name: impl Into<String>,
        data: Array2<T>,
        x: Array1<f64>,
        y: Array1<f64>,
        transform: Affine,
        crs: Crs,
    ) -> Result<Self> {
        let expected = (y.len(), x.len());
        if data.dim() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: data.dim(),
            });
        }

        Ok(Self {
            name: name.into(),
            data,
            x,
            y,
            transform,
            crs,
        })
    }

    /// Builds the raster with coordinates derived from `transform`
    pub fn from_transform(name: impl Into<String>, data: Array2<T>, transform: Affine, crs: Crs) -> Self {
        let (rows, cols) = data.dim();
        Self {
            name: name.into(),
            x: transform.x_coords(cols),
            y: transform.y_coords(rows),
            data,
            transform,
            crs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn into_data(self) -> Array2<T> {
        self.data
    }

    pub fn x_coords(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y_coords(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn transform(&self) -> &Affine {
        &self.transform
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn geo_info(&self) -> GeoInfo {
        GeoInfo::new(self.transform, self.crs.clone())
    }

    /// Serializes to a GeoTIFF at `path`, replacing any existing file
    pub fn write<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> Result<()> {
        GeoTiffWriter::new(*options)?.write_to_path(
            path,
            self.data.view(),
            &self.geo_info(),
            Some(&self.name),
        )
    }

    /// Serializes to any seekable sink
    pub fn write_to<W: SeekableWriter>(&self, out: &mut W, options: &WriteOptions) -> Result<()> {
        GeoTiffWriter::new(*options)?.write(out, self.data.view(), &self.geo_info(), Some(&self.name))
    }

    /// Reads a whole GeoTIFF into memory
    ///
    /// The file must carry both a transform and a CRS. The raster is named
    /// from its ImageDescription, falling back to the file stem.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = ChunkedRaster::<T>::open(path, ChunkShape::whole())?;

        let geo = source.geo_info().cloned().unwrap_or_default();
        let transform = geo.transform.ok_or(Error::MissingTag(tags::MODEL_TIEPOINT))?;
        let crs = geo.crs.ok_or(Error::MissingTag(tags::GEO_KEY_DIRECTORY))?;

        let name = source
            .description()
            .map(str::to_string)
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();

        let data = source.read_chunk(0, 0)?;
        Ok(Self::from_transform(name, data, transform, crs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::NamedTempFile;

    #[test]
    fn test_shape_mismatch() {
        let data = Array2::<i64>::zeros((3, 4));
        let result = GeoRaster::new(
            "bad",
            data,
            Array1::zeros(3),
            Array1::zeros(3),
            Affine::identity(),
            Crs::epsg(4326),
        );
        assert!(matches!(
            result,
            Err(Error::ShapeMismatch { expected: (3, 3), found: (3, 4) })
        ));
    }

    #[test]
    fn test_from_transform_coordinates() {
        let raster = GeoRaster::from_transform(
            "r",
            Array2::<i64>::zeros((2, 3)),
            Affine::new(0.1, 0.0, 10.0, 0.0, -0.1, 50.0),
            Crs::epsg(4326),
        );
        assert_eq!(raster.x_coords().len(), 3);
        assert_eq!(raster.y_coords().len(), 2);
        assert_eq!(raster.x_coords()[0], 10.0);
        assert_eq!(raster.y_coords()[0], 50.0);
        assert!((raster.x_coords()[2] - 10.2).abs() < 1e-12);
        assert!((raster.y_coords()[1] - 49.9).abs() < 1e-12);
    }

    #[test]
    fn test_write_read_round_trip() {
        let data = array![[1i16, -2, 3], [4, -5, 6]];
        let raster = GeoRaster::from_transform(
            "small",
            data.clone(),
            Affine::new(30.0, 0.0, 500000.0, 0.0, -30.0, 4000000.0),
            Crs::epsg(32633),
        );
        let file = NamedTempFile::new().unwrap();
        raster.write(file.path(), &WriteOptions::default()).unwrap();

        let back = GeoRaster::<i16>::read(file.path()).unwrap();
        assert_eq!(back, raster);
        assert_eq!(back.name(), "small");
    }

    #[test]
    fn test_read_without_georeferencing() {
        let file = NamedTempFile::new().unwrap();
        GeoTiffWriter::new(WriteOptions::default())
            .unwrap()
            .write_to_path(file.path(), Array2::<u8>::zeros((2, 2)).view(), &GeoInfo::default(), None)
            .unwrap();

        assert!(matches!(GeoRaster::<u8>::read(file.path()), Err(Error::MissingTag(_))));
    }
}
