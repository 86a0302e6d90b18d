//! GeoTIFF specific functionality

use crate::error::{Error, Result};
use crate::projection::{Affine, Coordinate, Crs};
use super::ifd::IFD;
use super::tags::{self, geo_keys};
use super::reader::TiffReader;
use super::writer::TagValue;

/// GeoKey value that marks a user-defined (non-EPSG) system
const USER_DEFINED: u16 = 32767;

/// Georeferencing carried by a GeoTIFF image
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoInfo {
    /// Pixel-corner to model-space transform
    pub transform: Option<Affine>,
    /// Coordinate reference system
    pub crs: Option<Crs>,
    /// GTModelTypeGeoKey (1 = projected, 2 = geographic)
    pub model_type: Option<u16>,
    /// GTRasterTypeGeoKey (1 = PixelIsArea, 2 = PixelIsPoint)
    pub raster_type: Option<u16>,
    /// GTCitationGeoKey text
    pub citation: Option<String>,
}

impl GeoInfo {
    /// Georeferencing for a north-up or sheared raster in a known CRS
    pub fn new(transform: Affine, crs: Crs) -> Self {
        Self {
            transform: Some(transform),
            model_type: Some(if crs.is_geographic() {
                geo_keys::MODEL_TYPE_GEOGRAPHIC
            } else {
                geo_keys::MODEL_TYPE_PROJECTED
            }),
            raster_type: Some(geo_keys::RASTER_PIXEL_IS_AREA),
            citation: Some(crs.to_string()),
            crs: Some(crs),
        }
    }

    /// Extracts GeoTIFF information from an IFD
    ///
    /// Returns `None` when the image carries no GeoTIFF tags at all.
    pub fn from_ifd(ifd: &IFD, reader: &TiffReader) -> Result<Option<Self>> {
        if !ifd.is_geotiff() {
            return Ok(None);
        }

        let doubles = |tag: u16| -> Result<Option<Vec<f64>>> {
            ifd.get_entry(tag)
                .map(|entry| reader.read_tag_doubles(entry))
                .transpose()
        };

        let pixel_scale = doubles(tags::MODEL_PIXEL_SCALE)?;
        let tiepoint = doubles(tags::MODEL_TIEPOINT)?;
        let matrix = doubles(tags::MODEL_TRANSFORMATION)?;

        let ascii = ifd.get_entry(tags::GEO_ASCII_PARAMS)
            .map(|entry| reader.read_tag_ascii(entry))
            .transpose()?;

        let keys = match ifd.get_entry(tags::GEO_KEY_DIRECTORY) {
            Some(entry) => parse_geo_keys(&reader.read_tag_u16s(entry)?, ascii.as_deref())?,
            None => GeoKeys::default(),
        };

        let mut transform = transform_from_tags(
            pixel_scale.as_deref(),
            tiepoint.as_deref(),
            matrix.as_deref(),
        );

        // Point-registered rasters tie the pixel centre, not its corner.
        if keys.raster_type == Some(geo_keys::RASTER_PIXEL_IS_POINT) {
            transform = transform.map(|t| {
                Affine::new(
                    t.a, t.b, t.c - 0.5 * (t.a + t.b),
                    t.d, t.e, t.f - 0.5 * (t.d + t.e),
                )
            });
        }

        Ok(Some(GeoInfo {
            transform,
            crs: keys.crs,
            model_type: keys.model_type,
            raster_type: keys.raster_type,
            citation: keys.citation,
        }))
    }

    /// Encodes this georeferencing as GeoTIFF tags, sorted by tag number
    ///
    /// North-up transforms use ModelPixelScale + ModelTiepoint; anything else
    /// is written as a full ModelTransformation matrix. Only EPSG systems
    /// with codes that fit a GeoKey can be written.
    pub fn to_tags(&self) -> Result<Vec<(u16, TagValue)>> {
        let mut out = Vec::new();

        if let Some(t) = self.transform {
            if t.is_rectilinear() && t.a > 0.0 && t.e < 0.0 {
                out.push((tags::MODEL_PIXEL_SCALE, TagValue::Double(vec![t.a, -t.e, 0.0])));
                out.push((tags::MODEL_TIEPOINT, TagValue::Double(vec![0.0, 0.0, 0.0, t.c, t.f, 0.0])));
            } else {
                out.push((tags::MODEL_TRANSFORMATION, TagValue::Double(vec![
                    t.a, t.b, 0.0, t.c,
                    t.d, t.e, 0.0, t.f,
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ])));
            }
        }

        if let Some(crs) = &self.crs {
            let code = crs.epsg_code()
                .ok_or_else(|| Error::Unsupported(format!("Non-EPSG CRS {} in GeoTIFF keys", crs)))?;
            let code = u16::try_from(code)
                .ok()
                .filter(|&c| c != USER_DEFINED)
                .ok_or_else(|| Error::Unsupported(format!("EPSG code {} does not fit a GeoKey", code)))?;

            let model_type = self.model_type.unwrap_or(if crs.is_geographic() {
                geo_keys::MODEL_TYPE_GEOGRAPHIC
            } else {
                geo_keys::MODEL_TYPE_PROJECTED
            });
            let cs_key = if model_type == geo_keys::MODEL_TYPE_GEOGRAPHIC {
                geo_keys::GEOGRAPHIC_TYPE
            } else {
                geo_keys::PROJECTED_CS_TYPE
            };

            let citation = self.citation.clone()
                .unwrap_or_else(|| crs.to_string())
                .replace('|', "/");
            let ascii = format!("{}|", citation);
            let ascii_len = u16::try_from(ascii.len()).map_err(|_| {
                Error::Unsupported(format!("GeoTIFF citation of {} bytes", ascii.len()))
            })?;

            let entries: [[u16; 4]; 4] = [
                [geo_keys::MODEL_TYPE, 0, 1, model_type],
                [geo_keys::RASTER_TYPE, 0, 1, self.raster_type.unwrap_or(geo_keys::RASTER_PIXEL_IS_AREA)],
                [geo_keys::CITATION, tags::GEO_ASCII_PARAMS, ascii_len, 0],
                [cs_key, 0, 1, code],
            ];

            let mut directory = vec![1, 1, 0, entries.len() as u16];
            for entry in entries {
                directory.extend_from_slice(&entry);
            }

            out.push((tags::GEO_KEY_DIRECTORY, TagValue::Short(directory)));
            out.push((tags::GEO_ASCII_PARAMS, TagValue::Ascii(ascii)));
        }

        out.sort_by_key(|(tag, _)| *tag);
        Ok(out)
    }

    /// Computes the bounding box in geo coordinates
    ///
    /// Returns (min_x, min_y, max_x, max_y)
    pub fn bounding_box(&self, width: u64, height: u64) -> Option<(f64, f64, f64, f64)> {
        Some(self.transform?.bounds(width, height))
    }

    /// Converts pixel coordinates to geographic coordinates
    pub fn pixel_to_geo(&self, pixel_x: u64, pixel_y: u64) -> Option<Coordinate> {
        Some(self.transform?.apply(pixel_x as f64, pixel_y as f64))
    }

    /// Converts geographic coordinates to pixel coordinates
    pub fn geo_to_pixel(&self, geo_coord: Coordinate) -> Option<(f64, f64)> {
        self.transform?.to_pixel(geo_coord)
    }
}

impl std::fmt::Display for GeoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nGeoTIFF Information:")?;

        if let Some(ref crs) = self.crs {
            writeln!(f, "  CRS: {}", crs)?;
        }

        if let Some(ref citation) = self.citation {
            writeln!(f, "  Citation: {}", citation)?;
        }

        if let Some(t) = self.transform {
            if t.is_rectilinear() {
                writeln!(f, "  Pixel Size: {} x {}", t.a, t.e)?;
            } else {
                writeln!(f, "  Transform:\n{}", t)?;
            }
            writeln!(f, "  Origin (geo): ({}, {})", t.c, t.f)?;
        }

        if self.raster_type == Some(geo_keys::RASTER_PIXEL_IS_POINT) {
            writeln!(f, "  Raster type: PixelIsPoint")?;
        }

        Ok(())
    }
}

/// The GeoKeys rasterlab understands
#[derive(Debug, Default, PartialEq)]
struct GeoKeys {
    crs: Option<Crs>,
    model_type: Option<u16>,
    raster_type: Option<u16>,
    citation: Option<String>,
}

/// Decodes a GeoKeyDirectory, resolving ASCII values against GeoAsciiParams
fn parse_geo_keys(keys: &[u16], ascii: Option<&str>) -> Result<GeoKeys> {
    if keys.len() < 4 {
        return Err(Error::InvalidFormat(format!(
            "GeoKeyDirectory has {} values, header needs 4",
            keys.len()
        )));
    }

    let num_keys = keys[3] as usize;
    let mut out = GeoKeys::default();
    let mut geographic = None;
    let mut projected = None;

    for key in keys[4..].chunks_exact(4).take(num_keys) {
        let (key_id, location, count, value) = (key[0], key[1], key[2] as usize, key[3]);

        match (key_id, location) {
            (geo_keys::MODEL_TYPE, 0) => out.model_type = Some(value),
            (geo_keys::RASTER_TYPE, 0) => out.raster_type = Some(value),
            (geo_keys::GEOGRAPHIC_TYPE, 0) => geographic = Some(value),
            (geo_keys::PROJECTED_CS_TYPE, 0) => projected = Some(value),
            (geo_keys::CITATION, tags::GEO_ASCII_PARAMS) => {
                let start = value as usize;
                out.citation = ascii
                    .and_then(|s| s.get(start..start + count))
                    .map(|s| s.trim_end_matches('|').to_string())
                    .filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let code = if out.model_type == Some(geo_keys::MODEL_TYPE_GEOGRAPHIC) {
        geographic.or(projected)
    } else {
        projected.or(geographic)
    };
    out.crs = code
        .filter(|&c| c != 0 && c != USER_DEFINED)
        .map(|c| Crs::epsg(c as u32));

    Ok(out)
}

/// Rebuilds the affine transform from whichever model tags are present
fn transform_from_tags(
    pixel_scale: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
    matrix: Option<&[f64]>,
) -> Option<Affine> {
    if let Some(m) = matrix.filter(|m| m.len() >= 8) {
        return Some(Affine::new(m[0], m[1], m[3], m[4], m[5], m[7]));
    }

    let scale = pixel_scale.filter(|s| s.len() >= 2)?;
    let tp = tiepoint.filter(|t| t.len() >= 6)?;
    let (sx, sy) = (scale[0], scale[1]);

    Some(Affine::new(
        sx, 0.0, tp[3] - sx * tp[0],
        0.0, -sy, tp[4] + sy * tp[1],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubles(written: &[(u16, TagValue)], tag: u16) -> Vec<f64> {
        match written.iter().find(|(t, _)| *t == tag) {
            Some((_, TagValue::Double(v))) => v.clone(),
            other => panic!("tag {} not written as doubles: {:?}", tag, other),
        }
    }

    fn shorts(written: &[(u16, TagValue)], tag: u16) -> Vec<u16> {
        match written.iter().find(|(t, _)| *t == tag) {
            Some((_, TagValue::Short(v))) => v.clone(),
            other => panic!("tag {} not written as shorts: {:?}", tag, other),
        }
    }

    #[test]
    fn test_north_up_tags() {
        let info = GeoInfo::new(Affine::new(0.1, 0.0, 10.0, 0.0, -0.1, 50.0), Crs::epsg(4326));
        let written = info.to_tags().unwrap();

        assert_eq!(doubles(&written, tags::MODEL_PIXEL_SCALE), vec![0.1, 0.1, 0.0]);
        assert_eq!(doubles(&written, tags::MODEL_TIEPOINT), vec![0.0, 0.0, 0.0, 10.0, 50.0, 0.0]);
        assert!(written.iter().all(|(t, _)| *t != tags::MODEL_TRANSFORMATION));

        let keys = shorts(&written, tags::GEO_KEY_DIRECTORY);
        assert_eq!(&keys[..4], &[1, 1, 0, 4]);
        assert_eq!(&keys[4..8], &[geo_keys::MODEL_TYPE, 0, 1, geo_keys::MODEL_TYPE_GEOGRAPHIC]);
        assert_eq!(&keys[16..20], &[geo_keys::GEOGRAPHIC_TYPE, 0, 1, 4326]);

        let sorted: Vec<u16> = written.iter().map(|(t, _)| *t).collect();
        let mut expected = sorted.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_sheared_transform_uses_matrix() {
        let info = GeoInfo::new(Affine::new(2.0, 0.5, 100.0, 0.25, -2.0, 200.0), Crs::epsg(32633));
        let written = info.to_tags().unwrap();

        let m = doubles(&written, tags::MODEL_TRANSFORMATION);
        assert_eq!(m.len(), 16);
        assert_eq!(
            transform_from_tags(None, None, Some(&m)),
            Some(Affine::new(2.0, 0.5, 100.0, 0.25, -2.0, 200.0))
        );

        let keys = shorts(&written, tags::GEO_KEY_DIRECTORY);
        assert_eq!(&keys[16..20], &[geo_keys::PROJECTED_CS_TYPE, 0, 1, 32633]);
    }

    #[test]
    fn test_geo_keys_round_trip() {
        let info = GeoInfo::new(Affine::identity(), Crs::epsg(3857));
        let written = info.to_tags().unwrap();
        let keys = shorts(&written, tags::GEO_KEY_DIRECTORY);
        let ascii = match written.iter().find(|(t, _)| *t == tags::GEO_ASCII_PARAMS) {
            Some((_, TagValue::Ascii(s))) => s.clone(),
            _ => panic!("missing GeoAsciiParams"),
        };

        let parsed = parse_geo_keys(&keys, Some(&ascii)).unwrap();
        assert_eq!(parsed.crs, Some(Crs::epsg(3857)));
        assert_eq!(parsed.model_type, Some(geo_keys::MODEL_TYPE_PROJECTED));
        assert_eq!(parsed.raster_type, Some(geo_keys::RASTER_PIXEL_IS_AREA));
        assert_eq!(parsed.citation.as_deref(), Some("EPSG:3857"));
    }

    #[test]
    fn test_cs_key_follows_known_geographic_codes() {
        let cases = [
            (4087, geo_keys::MODEL_TYPE_PROJECTED, geo_keys::PROJECTED_CS_TYPE),
            (4978, geo_keys::MODEL_TYPE_PROJECTED, geo_keys::PROJECTED_CS_TYPE),
            (7844, geo_keys::MODEL_TYPE_GEOGRAPHIC, geo_keys::GEOGRAPHIC_TYPE),
            (4258, geo_keys::MODEL_TYPE_GEOGRAPHIC, geo_keys::GEOGRAPHIC_TYPE),
        ];

        for (code, model_type, cs_key) in cases {
            let written = GeoInfo::new(Affine::identity(), Crs::epsg(code)).to_tags().unwrap();
            let keys = shorts(&written, tags::GEO_KEY_DIRECTORY);
            assert_eq!(&keys[4..8], &[geo_keys::MODEL_TYPE, 0, 1, model_type], "EPSG:{}", code);
            assert_eq!(&keys[16..20], &[cs_key, 0, 1, code as u16], "EPSG:{}", code);
        }
    }

    #[test]
    fn test_oversized_citation_rejected() {
        let mut info = GeoInfo::new(Affine::identity(), Crs::epsg(4326));
        info.citation = Some("x".repeat(70_000));
        assert!(matches!(info.to_tags(), Err(Error::Unsupported(_))));

        info.citation = Some("x".repeat(1000));
        let keys = shorts(&info.to_tags().unwrap(), tags::GEO_KEY_DIRECTORY);
        assert_eq!(&keys[12..16], &[geo_keys::CITATION, tags::GEO_ASCII_PARAMS, 1001, 0]);
    }

    #[test]
    fn test_user_defined_crs_is_dropped() {
        let keys = [1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, USER_DEFINED];
        let parsed = parse_geo_keys(&keys, None).unwrap();
        assert_eq!(parsed.crs, None);
        assert_eq!(parsed.model_type, Some(1));
    }

    #[test]
    fn test_truncated_directory() {
        assert!(matches!(parse_geo_keys(&[1, 1], None), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_non_epsg_crs_rejected() {
        let mut info = GeoInfo::new(Affine::identity(), Crs::epsg(4326));
        info.crs = Some(Crs::parse("ESRI:102003").unwrap());
        assert!(matches!(info.to_tags(), Err(Error::Unsupported(_))));

        info.crs = Some(Crs::epsg(100_000));
        assert!(matches!(info.to_tags(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_transform_from_scale_and_tiepoint() {
        let t = transform_from_tags(
            Some(&[30.0, 30.0, 0.0]),
            Some(&[0.0, 0.0, 0.0, 500000.0, 4000000.0, 0.0]),
            None,
        ).unwrap();
        assert_eq!(t, Affine::new(30.0, 0.0, 500000.0, 0.0, -30.0, 4000000.0));
        assert_eq!(transform_from_tags(Some(&[30.0, 30.0, 0.0]), None, None), None);
    }

    #[test]
    fn test_pixel_geo_conversions() {
        let info = GeoInfo::new(Affine::new(0.1, 0.0, 10.0, 0.0, -0.1, 50.0), Crs::epsg(4326));

        let c = info.pixel_to_geo(10, 20).unwrap();
        assert!((c.x - 11.0).abs() < 1e-9);
        assert!((c.y - 48.0).abs() < 1e-9);

        let (px, py) = info.geo_to_pixel(Coordinate::new(11.0, 48.0)).unwrap();
        assert!((px - 10.0).abs() < 1e-9);
        assert!((py - 20.0).abs() < 1e-9);

        let (min_x, min_y, max_x, max_y) = info.bounding_box(100, 100).unwrap();
        assert!((min_x - 10.0).abs() < 1e-9);
        assert!((min_y - 40.0).abs() < 1e-9);
        assert!((max_x - 20.0).abs() < 1e-9);
        assert!((max_y - 50.0).abs() < 1e-9);

        assert!(GeoInfo::default().pixel_to_geo(0, 0).is_none());
    }
}
