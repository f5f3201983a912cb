use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_matrix::pipeline::{self, BuildOptions};
use feature_matrix::render::DEFAULT_SPECIFICATION_URL;

#[derive(Parser)]
#[command(name = "feature-matrix")]
#[command(about = "Static HTML compliance-matrix generator for SDK feature trees")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the sources and write the compliance table
    Build(SourceArgs),
    /// Validate the sources without writing any output
    Check(SourceArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Canonical feature tree document
    #[arg(long, default_value = "sdk.yaml")]
    source: PathBuf,

    /// Directory holding per-SDK manifests, one `<label>.yaml` each
    #[arg(long, default_value = "sdk-manifests")]
    manifest_dir: PathBuf,

    /// SDK manifest label; repeatable, order sets the column order
    #[arg(long = "sdk")]
    sdks: Vec<String>,

    /// Output directory for the rendered document
    #[arg(long, default_value = "output/features")]
    output: PathBuf,

    /// Page title
    #[arg(long, default_value = "SDK Features")]
    title: String,

    /// Base URL that specification points are appended to
    #[arg(long, default_value = DEFAULT_SPECIFICATION_URL)]
    specification_url: String,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            source: PathBuf::from("sdk.yaml"),
            manifest_dir: PathBuf::from("sdk-manifests"),
            sdks: Vec::new(),
            output: PathBuf::from("output/features"),
            title: "SDK Features".to_string(),
            specification_url: DEFAULT_SPECIFICATION_URL.to_string(),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "feature_matrix=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Read the canonical source and every registered manifest from disk.
fn read_sources(args: &SourceArgs) -> anyhow::Result<(String, Vec<(String, String)>)> {
    let canonical = std::fs::read_to_string(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;

    let mut manifests = Vec::with_capacity(args.sdks.len());
    for label in &args.sdks {
        let path = args.manifest_dir.join(format!("{label}.yaml"));
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        manifests.push((label.clone(), source));
    }
    Ok((canonical, manifests))
}

fn run_build(args: SourceArgs) -> anyhow::Result<()> {
    let (canonical, manifest_sources) = read_sources(&args)?;
    let sources = pipeline::load(&canonical, &manifest_sources)?;

    let options = BuildOptions {
        title: args.title,
        specification_url: args.specification_url,
    };
    let path = pipeline::write_to_directory(&sources, &options, &args.output)?;
    tracing::info!("wrote {}", path.display());
    Ok(())
}

fn run_check(args: SourceArgs) -> anyhow::Result<()> {
    let (canonical, manifest_sources) = read_sources(&args)?;
    let sources = pipeline::load(&canonical, &manifest_sources)?;

    let options = BuildOptions {
        title: args.title,
        specification_url: args.specification_url,
    };
    let levels = pipeline::check(&sources, &options)?;
    tracing::info!(
        levels,
        manifests = sources.manifests.len(),
        "sources are valid"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Build(args)) => run_build(args),
        Some(Commands::Check(args)) => run_check(args),
        None => run_build(SourceArgs::default()),
    }
}
