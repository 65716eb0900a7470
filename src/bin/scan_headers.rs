//! Extract grouping metadata from a directory of FITS images into the CSV
//! table consumed by `group_fields`.

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use fieldstack::io::fits::FitsDirSource;
use fieldstack::io::write_metadata_table;
use fieldstack::MetadataSource;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract grouping metadata from FITS headers")]
struct Args {
    /// Directory of FITS images
    #[arg(long)]
    path: PathBuf,

    /// Output metadata table (CSV)
    #[arg(long, default_value = "images.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let records = FitsDirSource::new(&args.path)
        .load()
        .with_context(|| format!("scanning {}", args.path.display()))?;
    info!("read {} usable header(s)", records.len());

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    write_metadata_table(&records, file)?;
    info!("wrote {}", args.output.display());

    Ok(())
}
