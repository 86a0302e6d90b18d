//! Loading component configuration from JSON

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Reads a configuration value from a JSON file
///
/// Fields missing from the file take their `Default` values for the config
/// types in this crate.
pub fn load_json<C, P>(path: P) -> Result<C>
where
    C: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    from_json_str(&text).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parses a configuration value from JSON text
pub fn from_json_str<C: DeserializeOwned>(text: &str) -> Result<C> {
    serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::lazy::ChunkShape;
    use crate::probe::ProbeConfig;
    use crate::scaler::ScalerConfig;
    use crate::compression::Compression;
    use crate::projection::Crs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_generator_config() {
        let config: GeneratorConfig = from_json_str(
            r#"{ "width": 4, "height": 4, "crs": "epsg:3857",
                 "write_options": { "compression": "deflate" } }"#,
        ).unwrap();

        assert_eq!((config.width, config.height), (4, 4));
        assert_eq!(config.crs, Crs::epsg(3857));
        assert_eq!(config.write_options.compression, Compression::Deflate);
        assert_eq!(config.write_options.tile_width, 256);
        assert_eq!(config.low, -1000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "chunk": { "width": 500, "height": 250 } }"#).unwrap();
        file.flush().unwrap();

        let config: ScalerConfig = load_json(file.path()).unwrap();
        assert_eq!(config.chunk, ChunkShape::new(500, 250));
        assert_eq!(config.factor, 2);
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ rows: ").unwrap();
        file.flush().unwrap();

        let err = load_json::<ProbeConfig, _>(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_bad_crs_is_config_error() {
        let result = from_json_str::<GeneratorConfig>(r#"{ "crs": "4326" }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
