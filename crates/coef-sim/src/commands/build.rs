use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use coef_basis::load_basis_config;
use coef_batch::{load_pipeline_config, run_manifest, PipelineConfig};
use coef_pread::ReaderKind;
use tracing::{info, warn};

use super::write_json;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// YAML basis description (`id` plus parameters).
    #[arg(long)]
    pub basis: PathBuf,
    /// Batch manifest listing the snapshot groups.
    #[arg(long)]
    pub list: PathBuf,
    /// YAML pipeline configuration.
    #[arg(long, required_unless_present = "component", conflicts_with = "component")]
    pub config: Option<PathBuf>,
    /// Component type to project when no configuration file is given.
    #[arg(long)]
    pub component: Option<String>,
    /// Snapshot format used together with `--component`.
    #[arg(long, default_value = "ascii")]
    pub reader: ReaderKind,
    /// Worker threads used together with `--component`.
    #[arg(long, default_value_t = 1)]
    pub parallelism: usize,
    /// Series destination; `.bin`/`.bincode` selects the binary encoding.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &BuildArgs) -> Result<(), Box<dyn Error>> {
    let basis = load_basis_config(&args.basis)?;
    let config = match (&args.config, &args.component) {
        (Some(path), _) => load_pipeline_config(path)?,
        (None, Some(component)) => {
            let mut config = PipelineConfig::for_component(component.clone());
            config.reader = args.reader;
            config.parallelism = args.parallelism;
            config
        }
        (None, None) => return Err("either --config or --component is required".into()),
    };

    let outcome = run_manifest(&args.list, &basis, &config)?;
    let summary_path = args.out.with_file_name("summary.json");
    write_json(&summary_path, &outcome.summary)?;
    println!("{}", outcome.summary);

    match outcome.accumulator.series() {
        Some(series) => {
            series.store(&args.out)?;
            info!(path = %args.out.display(), entries = series.len(), "stored series");
        }
        None => warn!("no group produced coefficients; series not written"),
    }
    Ok(())
}
