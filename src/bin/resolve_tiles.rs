//! Resolve the survey sub-tiles overlapping an image footprint.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{ensure, Context};
use clap::Parser;
use log::info;

use fieldstack::io::write_skycell_table;
use fieldstack::{Equatorial, Footprint, SkyGridResolver};

/// Parse a footprint corner in "ra,dec" degrees.
fn parse_corner(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("corner must be in format 'ra,dec'".to_string());
    }

    let ra = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "invalid RA value".to_string())?;
    let dec = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "invalid Dec value".to_string())?;

    Ok((ra, dec))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve survey sub-tiles overlapping an image footprint")]
struct Args {
    /// Zone catalog table (CSV)
    #[arg(long)]
    grid: PathBuf,

    /// Footprint corner as "ra,dec" in degrees; pass exactly four times
    #[arg(long = "corner", value_parser = parse_corner, required = true)]
    corners: Vec<(f64, f64)>,

    /// Output table path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    ensure!(
        args.corners.len() == 4,
        "expected exactly four --corner arguments, got {}",
        args.corners.len()
    );

    let corners = [
        Equatorial::from_degrees(args.corners[0].0, args.corners[0].1),
        Equatorial::from_degrees(args.corners[1].0, args.corners[1].1),
        Equatorial::from_degrees(args.corners[2].0, args.corners[2].1),
        Equatorial::from_degrees(args.corners[3].0, args.corners[3].1),
    ];
    let footprint = Footprint::new(corners).context("building footprint")?;

    let resolver = SkyGridResolver::from_csv_path(&args.grid)
        .with_context(|| format!("loading zone catalog {}", args.grid.display()))?;
    let cells = resolver.resolve(&footprint).context("resolving footprint")?;
    info!("footprint overlaps {} sub-tile(s)", cells.len());

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output table {}", path.display()))?;
            write_skycell_table(&cells, file)?;
        }
        None => write_skycell_table(&cells, std::io::stdout().lock())?,
    }

    Ok(())
}
