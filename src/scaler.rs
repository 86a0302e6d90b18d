//! Lazy chunked scaling of a raster file

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::lazy::{ChunkShape, LazyRaster};

/// Parameters for the chunked scaler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    pub path: PathBuf,
    pub chunk: ChunkShape,
    pub factor: i64,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("completely_random_data.tif"),
            chunk: ChunkShape::new(1000, 1000),
            factor: 2,
        }
    }
}

/// Opens the raster and returns the unevaluated `source * factor` expression
pub fn build(config: &ScalerConfig) -> Result<LazyRaster<i64>> {
    let scaled = LazyRaster::<i64>::open(&config.path, config.chunk)? * config.factor;
    info!(expr = %scaled.expr(), chunks = scaled.chunk_grid().chunk_count(), "built lazy expression");
    Ok(scaled)
}
