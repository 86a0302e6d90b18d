//! Synthetic raster generation

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::formats::tiff::WriteOptions;
use crate::grid;
use crate::projection::{epsg, Affine, Crs};
use crate::raster::GeoRaster;

/// Parameters for a synthetic raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Columns
    pub width: usize,
    /// Rows
    pub height: usize,
    pub transform: Affine,
    pub crs: Crs,
    /// Inclusive lower bound of the cell values
    pub low: i64,
    /// Exclusive upper bound of the cell values
    pub high: i64,
    pub name: String,
    pub output: PathBuf,
    pub write_options: WriteOptions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 15000,
            height: 50000,
            transform: Affine::new(0.1, 0.0, 10.0, 0.0, -0.1, 50.0),
            crs: Crs::epsg(epsg::WGS84),
            low: -1000,
            high: 1000,
            name: "completely_random_data".to_string(),
            output: PathBuf::from("completely_random_data.tif"),
            write_options: WriteOptions::default(),
        }
    }
}

/// Builds a raster of independent uniform draws from `[low, high)`
pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Result<GeoRaster<i64>> {
    let data = grid::random_grid(config.height, config.width, config.low..config.high, rng)?;
    info!(
        rows = config.height,
        cols = config.width,
        low = config.low,
        high = config.high,
        "generated random grid"
    );
    Ok(GeoRaster::from_transform(
        config.name.clone(),
        data,
        config.transform,
        config.crs.clone(),
    ))
}

/// Generates the raster and writes it to `config.output`
pub fn run<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Result<GeoRaster<i64>> {
    let raster = generate(config, rng)?;
    raster.write(&config.output, &config.write_options)?;
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn small_config(dir: &TempDir) -> GeneratorConfig {
        GeneratorConfig {
            width: 9,
            height: 6,
            output: dir.path().join("random.tif"),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!((config.width, config.height), (15000, 50000));
        assert_eq!(config.transform.to_array(), [0.1, 0.0, 10.0, 0.0, -0.1, 50.0]);
        assert_eq!(config.crs.to_string(), "EPSG:4326");
        assert_eq!(config.output, PathBuf::from("completely_random_data.tif"));
    }

    #[test]
    fn test_generate_is_seeded_and_bounded() {
        let dir = TempDir::new().unwrap();
        let config = small_config(&dir);

        let a = generate(&config, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate(&config, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.shape(), (6, 9));
        assert!(a.data().iter().all(|&v| (-1000..1000).contains(&v)));
        assert_eq!(a.name(), "completely_random_data");
    }

    #[test]
    fn test_run_writes_readable_file() {
        let dir = TempDir::new().unwrap();
        let config = small_config(&dir);

        let written = run(&config, &mut StdRng::seed_from_u64(1)).unwrap();
        let back = GeoRaster::<i64>::read(&config.output).unwrap();

        assert_eq!(back.shape(), (6, 9));
        assert_eq!(back.data(), written.data());
        assert_eq!(back.crs(), &config.crs);
        for (i, x) in back.x_coords().iter().enumerate() {
            assert!((x - (i as f64 * 0.1 + 10.0)).abs() < 1e-9);
        }
        for (j, y) in back.y_coords().iter().enumerate() {
            assert!((y - (j as f64 * -0.1 + 50.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let zero = GeneratorConfig { width: 0, ..small_config(&dir) };
        assert!(matches!(generate(&zero, &mut rng), Err(Error::InvalidDimensions(_))));

        let empty = GeneratorConfig { low: 5, high: 5, ..small_config(&dir) };
        assert!(matches!(generate(&empty, &mut rng), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig {
            output: dir.path().join("missing").join("out.tif"),
            ..small_config(&dir)
        };
        assert!(matches!(run(&config, &mut StdRng::seed_from_u64(0)), Err(Error::Io(_))));
    }
}
