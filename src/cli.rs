//! The command line interface for the LCOE engine.
use crate::input::load_parameters;
use crate::log;
use crate::metrics::{LcoeCalculator, LcoeMetrics};
use crate::output::{create_output_directory, get_output_dir, write_metrics};
use crate::parameters::LcoeOverrides;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the LCOE engine.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Calculate metrics for an asset.
    Run {
        /// Path to the asset description file.
        input_path: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example assets.
    Example {
        /// The available subcommands for managing example assets.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate an asset description file.
    Validate {
        /// Path to the asset description file.
        input_path: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { input_path, opts } => handle_run_command(&input_path, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { input_path } => handle_validate_command(&input_path, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start enliten
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ enliten --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    input_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(input_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the asset to analyse
    let parameters = load_parameters(input_path).context("Failed to load asset.")?;
    info!("Loaded asset from {}", input_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let metrics = LcoeCalculator::new(parameters)
        .calculate_metrics_checked(&LcoeOverrides::default())
        .context("Invalid asset parameters.")?;
    write_metrics(output_path, &metrics).context("Failed to write results.")?;
    log_summary(&metrics);

    Ok(())
}

/// Log the headline results for an asset
fn log_summary(metrics: &LcoeMetrics) {
    info!(
        "LCOE (after tax): {:.4}/kWh, LCOE (before tax): {:.4}/kWh",
        metrics.lcoe.after_tax.0, metrics.lcoe.before_tax.0
    );

    match metrics.irr {
        Some(irr) => info!("IRR: {:.2}%", irr.0 * 100.0),
        None => warn!("IRR is undefined: net cash flows never change sign"),
    }

    match metrics.payback_period {
        Some(years) => info!("Payback period: {years} years"),
        None => warn!("Initial investment is not recovered within the analysis period"),
    }
}

/// Handle the `validate` command.
pub fn handle_validate_command(input_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None)
        .context("Failed to initialise logging.")?;

    // Load/validate the asset
    let parameters = load_parameters(input_path).context("Failed to load asset.")?;
    parameters
        .validate()
        .context("Invalid asset parameters.")?;
    info!("Asset validation successful!");

    Ok(())
}
