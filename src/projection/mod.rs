//! Spatial reference: affine pixel-to-world mapping and CRS tags

pub mod affine;
pub mod crs;

pub use affine::{Affine, Coordinate};
pub use crs::Crs;

/// Common EPSG codes
pub mod epsg {
    /// WGS 84 geographic
    pub const WGS84: u32 = 4326;
    /// WGS 84 / Pseudo-Mercator
    pub const WEB_MERCATOR: u32 = 3857;
}
