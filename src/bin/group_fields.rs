//! Group a metadata table of exposures into fields and epochs and write
//! the stacking manifests.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use fieldstack::io::TableSource;
use fieldstack::{group_catalog, GreedyFieldAssigner, GroupManifestWriter, GroupingConfig, ImageCatalog};

#[derive(Parser, Debug)]
#[command(author, version, about = "Group exposures into fields and epochs for stacking")]
struct Args {
    /// Image metadata table (CSV)
    #[arg(long)]
    table: PathBuf,

    /// Field association radius in arcminutes
    #[arg(long, default_value_t = 10.0)]
    radius: f64,

    /// Maximum epoch duration in hours
    #[arg(long, default_value_t = 1.0)]
    delta_t: f64,

    /// Output directory for the group lists
    #[arg(long, default_value = "fieldlists")]
    lists: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let source = TableSource::new(&args.table);
    let mut catalog = ImageCatalog::from_source(&source)
        .with_context(|| format!("loading metadata table {}", args.table.display()))?;
    info!("loaded {} image record(s)", catalog.len());

    let config = GroupingConfig {
        radius_arcmin: args.radius,
        delta_t_hours: args.delta_t,
    };
    group_catalog(&mut catalog, &config, &GreedyFieldAssigner);

    let writer = GroupManifestWriter::new(&args.lists)
        .with_context(|| format!("creating list directory {}", args.lists.display()))?;
    let lists = writer.write(&catalog).context("writing group lists")?;
    info!("wrote {} group list(s) to {}", lists.len(), args.lists.display());

    Ok(())
}
