mod cli;
mod logging;
mod report;

use std::fmt::Display;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use cannon_matrix::random;
use cannon_mesh::Engine;
use clap::Parser;
use rand::distributions::uniform::SampleUniform;

use crate::cli::{Cli, ElementType};
use crate::report::Tolerance;

fn main() {
    let cli = Cli::parse();
    logging::init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let engine = Engine::new(cli.engine_config()).context("invalid worker grid")?;
    let seed = cli.seed.unwrap_or_else(clock_seed);
    tracing::info!(seed, "generating input matrices");

    let ok = match cli.dtype {
        ElementType::I32 => {
            let low = i32::try_from(cli.min).context("--min does not fit in i32")?;
            let high = i32::try_from(cli.max).context("--max does not fit in i32")?;
            execute(&engine, cli, low, high, seed)?
        }
        ElementType::I64 => execute(&engine, cli, cli.min, cli.max, seed)?,
        ElementType::F32 => execute(&engine, cli, cli.min as f32, cli.max as f32, seed)?,
        ElementType::F64 => execute(&engine, cli, cli.min as f64, cli.max as f64, seed)?,
    };

    if !ok {
        bail!("distributed result does not match the sequential product");
    }
    Ok(())
}

/// Generate A and B, multiply them on the grid, and report. Returns false
/// only when verification was requested and failed.
fn execute<T>(engine: &Engine, cli: &Cli, low: T, high: T, seed: u64) -> Result<bool>
where
    T: Tolerance + SampleUniform + Display,
{
    let a = random::uniform(cli.order, low..=high, seed).context("generating A")?;
    let b = random::uniform(cli.order, low..=high, seed.wrapping_add(1)).context("generating B")?;

    let product = engine
        .multiply(&a, &b)
        .context("distributed multiplication failed")?;
    report::print_summary(&product, engine);

    if cli.verify {
        let expected = a.reference_product(&b).context("sequential multiplication")?;
        return Ok(report::print_verification(&product.matrix, &expected));
    }
    Ok(true)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
