use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use htan_catalog::app::App;
use htan_catalog::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use htan_catalog::error::CatalogError;
use htan_catalog::http::HttpCatalogSource;
use htan_catalog::output::{JsonOutput, LogProgress};
use htan_catalog::source::{CatalogSource, FileCatalogSource};

#[derive(Parser)]
#[command(name = "htan-catalog")]
#[command(about = "Resolve an HTAN catalogue dataset into files, cases and atlases")]
#[command(version, author)]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Config file (defaults to ./htan-catalog.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Dataset path or URL, overriding the config
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Atlas metadata path or URL, overriding the config
    #[arg(long, global = true)]
    metadata: Option<String>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    #[command(about = "Print resolved files and atlases as JSON")]
    Resolve,
    #[command(about = "Print entity counts and unresolved references")]
    Summary,
    #[command(about = "Print published atlases with case and biospecimen counts")]
    Atlases,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::MissingConfig
        | CatalogError::MissingSource(_)
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_)
        | CatalogError::UnsupportedSchemaVersion { .. }
        | CatalogError::InvalidLocation(_) => 2,
        CatalogError::Http(_) | CatalogError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        dataset: cli.sources.dataset,
        atlas_metadata: cli.sources.metadata,
    };
    let config = ConfigLoader::resolve(cli.sources.config.as_deref(), &overrides)?;

    if config.is_remote() {
        let source = HttpCatalogSource::new(
            config.dataset.clone(),
            config.atlas_metadata.clone(),
            config.timeout,
            config.retry,
        )?;
        run_command(cli.command, App::new(source))
    } else {
        run_command(cli.command, App::new(file_source(&config)))
    }
}

fn file_source(config: &ResolvedConfig) -> FileCatalogSource {
    FileCatalogSource::new(config.dataset.clone(), config.atlas_metadata.clone())
}

fn run_command<S: CatalogSource>(command: Commands, app: App<S>) -> miette::Result<()> {
    let progress = LogProgress;
    match command {
        Commands::Resolve => {
            let result = app.load(&progress)?;
            JsonOutput::print_load(&result).into_diagnostic()
        }
        Commands::Summary => {
            let result = app.summary(&progress)?;
            JsonOutput::print_summary(&result).into_diagnostic()
        }
        Commands::Atlases => {
            let result = app.atlases(&progress)?;
            JsonOutput::print_atlases(&result).into_diagnostic()
        }
    }
}
