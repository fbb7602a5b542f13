use std::net::SocketAddr;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use micrograph_catalog::catalog::Catalog;
use micrograph_catalog::config::ConfigLoader;
use micrograph_catalog::error::CatalogError;
use micrograph_catalog::http;
use micrograph_catalog::seed;
use micrograph_catalog::store::SqliteStore;

#[derive(Parser)]
#[command(name = "micat")]
#[command(about = "Read-only microscopy image catalog server")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the catalog HTTP server")]
    Serve(ServeArgs),
    #[command(about = "Populate an empty catalog with synthetic sample data")]
    Seed(SeedArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    listen: Option<SocketAddr>,

    #[arg(long)]
    db: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    db: Option<Utf8PathBuf>,

    #[arg(long, default_value_t = 0)]
    rng_seed: u64,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(catalog) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(catalog));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::UnknownName { .. } => 2,
        CatalogError::AlreadySeeded => 2,
        CatalogError::Store(_) | CatalogError::Http(_) => 3,
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
    match cli.command {
        Commands::Serve(args) => run_serve(args),
        Commands::Seed(args) => run_seed(args),
    }
}

fn run_serve(args: ServeArgs) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref(), args.listen, args.db)?;
    let store = SqliteStore::open(&config.database)?;
    let catalog = Catalog::new(store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(http::serve(config.listen_addr, catalog))?;
    Ok(())
}

fn run_seed(args: SeedArgs) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref(), None, args.db)?;
    let store = SqliteStore::open(&config.database)?;
    let summary = seed::seed(&store, args.rng_seed)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).into_diagnostic()?
    );
    Ok(())
}
