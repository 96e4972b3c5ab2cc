use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use gapminder_panda::config::{DashboardConfig, OutputFormat, View};
use gapminder_panda::data::export::pretty_format;
use gapminder_panda::data::loader::load_dataset;
use gapminder_panda::state::DashboardState;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "gapminder-panda")]
#[command(about = "Shape development indicators into per-continent chart tables")]
struct Args {
    /// Dataset file (.csv, .json or .parquet)
    #[arg(short, long)]
    file: PathBuf,

    /// Year for the per-year views (defaults to the first year in the data)
    #[arg(short, long)]
    year: Option<i64>,

    /// overview, exploration, statistics, distribution or time-series
    #[arg(short, long)]
    view: Option<View>,

    /// table or json
    #[arg(long)]
    format: Option<OutputFormat>,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only keep these continents (repeatable)
    #[arg(long = "continent")]
    continents: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(view) = args.view {
        config.view = view;
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    let dataset = load_dataset(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;

    let mut state = DashboardState::new(dataset, &config)?;
    state.restrict_continents(&args.continents)?;
    if let Some(year) = args.year {
        state.set_year(year)?;
    }

    let sections = state.render()?;

    match config.format {
        OutputFormat::Table => {
            for section in &sections {
                println!("== {}", section.title);
                for note in &section.notes {
                    println!("   {note}");
                }
                for (name, table) in &section.tables {
                    println!("\n-- {name}");
                    println!("{}", pretty_format(table)?);
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let docs = sections
                .iter()
                .map(|s| s.to_json())
                .collect::<Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&docs)?);
        }
    }

    Ok(())
}
