use rasterlab::scaler::{self, ScalerConfig};
use rasterlab::{logging, Result};

fn main() -> Result<()> {
    logging::init_tracing();

    // Built but never forced.
    let _scaled = scaler::build(&ScalerConfig::default())?;
    Ok(())
}
