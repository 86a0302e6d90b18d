use rasterlab::{
    logging, ChunkShape, ChunkedRaster, DataType, Element, GeoInfo, Result, TiffReader,
};

const INPUT: &str = "completely_random_data.tif";

/// Prints a few cells spread over the image
fn print_samples<T: Element>(width: u64, height: u64) -> Result<()> {
    let raster = ChunkedRaster::<T>::open_with_options(INPUT, ChunkShape::new(1000, 1000), 16)?;

    let points = [
        ("top-left", 0, 0),
        ("center", height / 2, width / 2),
        ("bottom-right", height.saturating_sub(1), width.saturating_sub(1)),
    ];

    for (label, row, col) in points {
        match raster.read_value(row as usize, col as usize) {
            Ok(value) => println!("   {} ({}, {}): {}", label, row, col, value),
            Err(e) => println!("   {} ({}, {}): Error: {}", label, row, col, e),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    logging::init_tracing();
    println!("rasterlab - TIFF File Info\n");

    let reader = TiffReader::open(INPUT)?;
    let tiff = reader.read()?;

    println!("{}", tiff);

    let Some(ifd) = tiff.main_ifd() else {
        return Ok(());
    };

    if let Some(geo_info) = GeoInfo::from_ifd(ifd, &reader)? {
        println!("{}", geo_info);

        if let Some(dims) = ifd.dimensions() {
            if let Some((min_x, min_y, max_x, max_y)) = geo_info.bounding_box(dims.width, dims.height) {
                println!("  Bounding Box:");
                println!("    Min: ({}, {})", min_x, min_y);
                println!("    Max: ({}, {})", max_x, max_y);
                println!("    Extent: {} x {}", max_x - min_x, max_y - min_y);
            }
        }
    }

    let Some(dims) = ifd.dimensions() else {
        return Ok(());
    };

    println!("\n--- Sample Pixels ---");
    let sampled = match ifd.data_type() {
        Some(DataType::U8) => print_samples::<u8>(dims.width, dims.height),
        Some(DataType::U16) => print_samples::<u16>(dims.width, dims.height),
        Some(DataType::U32) => print_samples::<u32>(dims.width, dims.height),
        Some(DataType::U64) => print_samples::<u64>(dims.width, dims.height),
        Some(DataType::I8) => print_samples::<i8>(dims.width, dims.height),
        Some(DataType::I16) => print_samples::<i16>(dims.width, dims.height),
        Some(DataType::I32) => print_samples::<i32>(dims.width, dims.height),
        Some(DataType::I64) => print_samples::<i64>(dims.width, dims.height),
        Some(DataType::F32) => print_samples::<f32>(dims.width, dims.height),
        Some(DataType::F64) => print_samples::<f64>(dims.width, dims.height),
        None => {
            println!("   Unsupported data type");
            Ok(())
        }
    };

    if let Err(e) = sampled {
        println!("   Error: {}", e);
    }

    Ok(())
}
