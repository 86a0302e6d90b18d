use rasterlab::probe::{self, ProbeConfig};
use rasterlab::{logging, Result};

fn main() -> Result<()> {
    logging::init_tracing();

    let report = probe::run(&ProbeConfig::default(), &mut rand::rng())?;
    println!("{}", report);
    Ok(())
}
