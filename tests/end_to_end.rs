use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use rasterlab::generator::{self, GeneratorConfig};
use rasterlab::probe::{self, ProbeConfig};
use rasterlab::scaler::{self, ScalerConfig};
use rasterlab::{
    Affine, BigTiffMode, ChunkShape, Compression, Crs, GeoRaster, TiffReader, WriteOptions,
};

fn small_tiles() -> WriteOptions {
    WriteOptions { tile_width: 16, tile_height: 16, ..Default::default() }
}

#[test]
fn generated_raster_has_expected_coordinates() {
    let dir = TempDir::new().unwrap();
    let config = GeneratorConfig {
        width: 4,
        height: 4,
        transform: Affine::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0),
        output: dir.path().join("grid.tif"),
        write_options: small_tiles(),
        ..Default::default()
    };
    let written = generator::run(&config, &mut StdRng::seed_from_u64(11)).unwrap();

    let back = GeoRaster::<i64>::read(&config.output).unwrap();
    assert_eq!(back.x_coords().to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(back.y_coords().to_vec(), vec![0.0, -1.0, -2.0, -3.0]);
    assert_eq!(back.crs(), &Crs::epsg(4326));
    assert_eq!(back.data(), written.data());
    assert!(back.data().iter().all(|&v| (-1000..1000).contains(&v)));
}

#[test]
fn probe_reports_eight_to_one() {
    let config = ProbeConfig { rows: 2, cols: 2, ..Default::default() };
    let report = probe::run(&config, &mut StdRng::seed_from_u64(5)).unwrap();

    assert_eq!(report.before, 32);
    assert_eq!(report.after, 4);
    assert_eq!(report.before_mib(), 32.0 / (1024.0 * 1024.0));
    assert_eq!(report.after_mib(), 4.0 / (1024.0 * 1024.0));
}

#[test]
fn scaler_doubles_generated_values() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("random.tif");
    let config = GeneratorConfig {
        width: 37,
        height: 23,
        output: output.clone(),
        write_options: small_tiles(),
        ..Default::default()
    };
    let raster = generator::run(&config, &mut StdRng::seed_from_u64(2)).unwrap();

    let scaled = scaler::build(&ScalerConfig {
        path: output,
        chunk: ChunkShape::new(10, 10),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(scaled.value_at(0, 0).unwrap(), raster.data()[[0, 0]] * 2);
    assert_eq!(scaled.value_at(22, 36).unwrap(), raster.data()[[22, 36]] * 2);

    let full = scaled.compute().unwrap();
    assert_eq!(full, raster.data().mapv(|v| v * 2));
}

#[test]
fn deflate_big_tiff_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packed.tif");
    let data = Array2::from_shape_fn((33, 50), |(r, c)| (r * 50 + c) as i32 - 800);
    let raster = GeoRaster::from_transform(
        "packed",
        data,
        Affine::from_origin(-180.0, 90.0, 0.5, 0.5),
        Crs::epsg(4326),
    );
    let options = WriteOptions {
        compression: Compression::Deflate,
        predictor: true,
        big_tiff: BigTiffMode::Always,
        ..small_tiles()
    };
    raster.write(&path, &options).unwrap();

    let reader = TiffReader::open(&path).unwrap();
    assert!(reader.is_big_tiff());
    assert_eq!(GeoRaster::<i32>::read(&path).unwrap(), raster);
}

#[test]
fn sheared_transform_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sheared.tif");
    let transform = Affine::new(2.0, 0.5, 100.0, 0.25, -2.0, 200.0);
    let raster = GeoRaster::from_transform(
        "sheared",
        array![[1.5f64, 2.5], [3.5, 4.5]],
        transform,
        Crs::epsg(3857),
    );
    raster.write(&path, &WriteOptions::default()).unwrap();

    let back = GeoRaster::<f64>::read(&path).unwrap();
    assert_eq!(back.transform(), &transform);
    assert_eq!(back.data(), raster.data());
}
