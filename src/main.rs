//! Resource monitor visualizer - plots and summarizes CPU, memory and I/O
//! metrics recorded as CSV by an external process monitor.

mod display;
mod loader;
mod metrics;
mod plot;
mod summary;

use anyhow::Result;
use clap::Parser;
use metrics::{MetricFamily, PlotType};
use plot::{ChartRenderer, PlotOutcome, Renderer};
use std::path::{Path, PathBuf};
use summary::ReportFormat;

/// Visualize resource monitoring metrics
#[derive(Parser, Debug)]
#[command(name = "monviz")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CPU metrics CSV file
    #[arg(long)]
    cpu: Option<PathBuf>,

    /// Memory metrics CSV file
    #[arg(long)]
    memory: Option<PathBuf>,

    /// I/O metrics CSV file
    #[arg(long)]
    io: Option<PathBuf>,

    /// Output file for the plot (PNG, or SVG with a .svg extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Type of plot to generate
    #[arg(long = "type", value_enum, default_value_t = PlotType::All)]
    plot_type: PlotType,

    /// Print a summary report instead of plotting
    #[arg(long)]
    summary: bool,

    /// Print the summary report as JSON
    #[arg(long, requires = "summary")]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn input_for(&self, family: MetricFamily) -> Option<&Path> {
        match family {
            MetricFamily::Cpu => self.cpu.as_deref(),
            MetricFamily::Memory => self.memory.as_deref(),
            MetricFamily::Io => self.io.as_deref(),
        }
    }
}

/// Output path for one family's chart. With `--type all` each family gets
/// its own file: `chart.png` becomes `chart_cpu.png`, `chart_memory.png`...
fn derive_output(output: &Path, family: MetricFamily, plot_type: PlotType) -> PathBuf {
    let output = if output.extension().is_none() {
        output.with_extension("png")
    } else {
        output.to_path_buf()
    };
    if plot_type != PlotType::All {
        return output;
    }

    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, family.flag(), ext))
}

/// Draw every family the plot type asks for. Problems are printed and
/// the remaining families still get drawn.
fn run_plots<R: Renderer>(args: &Args, renderer: &mut R) -> Vec<(MetricFamily, PlotOutcome)> {
    let mut outcomes = Vec::new();

    for family in args.plot_type.families() {
        let Some(input) = args.input_for(family) else {
            eprintln!(
                "Error: --{} file required for {} plot",
                family.flag(),
                family.label()
            );
            outcomes.push((family, PlotOutcome::MissingInput));
            continue;
        };

        let Some(series) = loader::load_series(input) else {
            outcomes.push((family, PlotOutcome::Failed));
            continue;
        };

        let output = args
            .output
            .as_deref()
            .map(|o| derive_output(o, family, args.plot_type));
        let outcome = plot::plot_family(renderer, family, &series, output.as_deref());
        log::debug!("{} plot: {:?}", family.label(), outcome);
        outcomes.push((family, outcome));
    }

    outcomes
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.summary {
        let format = if args.json {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        };
        summary::generate_summary_report(
            args.cpu.as_deref(),
            args.memory.as_deref(),
            args.io.as_deref(),
            format,
        );
        return Ok(());
    }

    run_plots(&args, &mut ChartRenderer);
    Ok(())
}
