use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use coef_series::CoefficientSeries;

#[derive(Args, Debug)]
pub struct TimesArgs {
    /// Stored series (`.json`, `.bin` or `.bincode`).
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Stored series (`.json`, `.bin` or `.bincode`).
    #[arg(long)]
    pub input: PathBuf,
    /// Time to look up; the nearest entry is printed.
    #[arg(long, allow_negative_numbers = true)]
    pub time: f64,
}

pub fn run_times(args: &TimesArgs) -> Result<(), Box<dyn Error>> {
    let series = CoefficientSeries::load(&args.input)?;
    for time in series.times() {
        println!("{time}");
    }
    Ok(())
}

pub fn run_show(args: &ShowArgs) -> Result<(), Box<dyn Error>> {
    let series = CoefficientSeries::load(&args.input)?;
    let entry = series
        .nearest(args.time)
        .ok_or_else(|| format!("no entry near time {}", args.time))?;
    println!("{}", serde_json::to_string_pretty(entry)?);
    Ok(())
}
