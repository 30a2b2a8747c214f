use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Args;
use coef_diag::{cooling_curve, read_species, DiagnosticSeries, ParseOptions};

#[derive(Args, Debug)]
pub struct SpeciesArgs {
    /// Species diagnostic file.
    #[arg(long)]
    pub input: PathBuf,
    /// List global and per-species fields.
    #[arg(long)]
    pub fields: bool,
    /// Treat every column as a global field.
    #[arg(long)]
    pub flat: bool,
    /// Drop rows later than this time.
    #[arg(long)]
    pub tmax: Option<f64>,
    /// Drop rows without a positive value past the first two columns.
    #[arg(long)]
    pub skip_zero: bool,
}

#[derive(Args, Debug)]
pub struct CoolingArgs {
    /// Species diagnostic file.
    #[arg(long)]
    pub input: PathBuf,
    /// Degree of the fitted polynomial.
    #[arg(long, default_value_t = 2)]
    pub degree: usize,
    /// Factor applied to the reported times.
    #[arg(long, default_value_t = 1.0)]
    pub tscale: f64,
    /// Global field to fit.
    #[arg(long, default_value = "Temp")]
    pub field: String,
    /// Treat every column as a global field.
    #[arg(long)]
    pub flat: bool,
    /// Drop rows later than this time.
    #[arg(long)]
    pub tmax: Option<f64>,
    /// Optional CSV destination; defaults to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_options(flat: bool, tmax: Option<f64>, skip_zero_rows: bool) -> ParseOptions {
    let base = if flat {
        ParseOptions::flat()
    } else {
        ParseOptions::default()
    };
    ParseOptions {
        tmax,
        skip_zero_rows,
        ..base
    }
}

pub fn run_species(args: &SpeciesArgs) -> Result<(), Box<dyn Error>> {
    let options = parse_options(args.flat, args.tmax, args.skip_zero);
    let series = read_species(&args.input, &options)?;

    println!("rows: {} ({} skipped)", series.len(), series.skipped.len());
    for skipped in &series.skipped {
        println!("  line {}: {}", skipped.line, skipped.reason);
    }
    if args.fields {
        print_fields(&series);
    }
    Ok(())
}

fn print_fields(series: &DiagnosticSeries) {
    for (idx, label) in series.fields.iter().enumerate() {
        println!("{:5} {}", idx + 1, label);
    }
    for (species, fields) in &series.species {
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        println!("{species}: {}", names.join(" "));
    }
}

pub fn run_cooling(args: &CoolingArgs) -> Result<(), Box<dyn Error>> {
    let options = parse_options(args.flat, args.tmax, true);
    let series = read_species(&args.input, &options)?;
    let curve = cooling_curve(&series, &args.field, args.degree, args.tscale)?;

    let mut writer: csv::Writer<Box<dyn io::Write>> = match &args.out {
        Some(path) => csv::Writer::from_writer(Box::new(std::fs::File::create(path)?)),
        None => csv::Writer::from_writer(Box::new(io::stdout())),
    };
    for row in &curve.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
