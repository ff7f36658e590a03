use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trialstat::{
    cli::{Cli, OutputFormat},
    config::AnalysisConfig,
    coordinator::{AnalysisRun, Coordinator},
    csv_output::SeriesCsv,
    event::JsonLinesSource,
    json_output, report,
};

/// Initialize tracing subscriber writing to stderr
///
/// `--debug` raises the level to debug; otherwise RUST_LOG applies, falling
/// back to warnings only.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(run: &AnalysisRun, config: &AnalysisConfig, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Text => report::render_text(run),
        OutputFormat::Json => {
            json_output::to_json(run, config).context("Failed to serialize JSON output")?
        }
        OutputFormat::Csv => {
            let mut csv = SeriesCsv::new();
            for subject in run.reports() {
                csv.add_series(&subject.series);
            }
            csv.to_csv()
        }
    };
    Ok(output)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let mut config = AnalysisConfig::from_file(&args.config)?;
    args.apply_overrides(&mut config);

    let coordinator = Coordinator::new(config, JsonLinesSource::new())?;
    tracing::info!(
        "Analyzing {} subjects with {} workers",
        coordinator.config().subjects.len(),
        coordinator.workers()
    );

    // Subject failures are part of the output, not the exit status
    let run = coordinator.run();

    let output = render(&run, coordinator.config(), args.format)?;
    print!("{}", output);
    if args.format == OutputFormat::Json {
        println!();
    }

    Ok(())
}
