use rasterlab::generator::{self, GeneratorConfig};
use rasterlab::{logging, Result};

fn main() -> Result<()> {
    logging::init_tracing();

    let config = GeneratorConfig::default();
    generator::run(&config, &mut rand::rng())?;

    println!("GeoTIFF file '{}' has been created!", config.output.display());
    Ok(())
}
