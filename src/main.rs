use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use conflate::codec;
use conflate::merge;
use conflate::model::Pipeline;
use conflate::telemetry;

/// Merge Concourse CI pipeline definitions
///
/// conflate combines two pipeline YAML documents into one semantically
/// equivalent pipeline while minimizing duplication: shared resource
/// types and resources collapse onto a single declaration, name
/// collisions with different content are renamed, and every reference in
/// the second pipeline is rewired so its jobs keep behaving as before.
///
/// QUICK START:
///
///   conflate merge base.yml extra.yml > combined.yml
///
///   # Read the first pipeline from stdin:
///   cat base.yml | conflate merge - extra.yml
///
///   # Fuse same-named jobs by unioning their parallel branches:
///   conflate merge --deep base.yml extra.yml
#[derive(Parser)]
#[command(name = "conflate")]
#[command(version, about)]
#[command(after_help = "See 'conflate <command> --help' for more information on a specific command.")]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two pipelines and write the result to stdout
    ///
    /// The first pipeline takes priority: its declarations and names are
    /// kept verbatim. The second pipeline's entities are appended, renamed
    /// where their names collide with different content, and dropped where
    /// an identical declaration already exists.
    Merge(MergeArgs),

    /// Check that a pipeline's resources reference declared resource types
    ///
    /// Exits non-zero and lists each offending resource when the check
    /// fails. This is the same check 'merge' runs on both inputs.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Base pipeline file ('-' for stdin)
    left: PathBuf,

    /// Pipeline file to merge in
    right: PathBuf,

    /// Fuse jobs that share a name by unioning their parallel branches
    #[arg(long)]
    deep: bool,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Pipeline file to check ('-' for stdin)
    file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.debug);

    match cli.command {
        Commands::Merge(args) => run_merge(&args),
        Commands::Validate(args) => run_validate(&args),
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

fn run_merge(args: &MergeArgs) -> Result<()> {
    let left = read_input(&args.left).context("failed to load the base pipeline")?;
    let right = read_input(&args.right).context("failed to load the second pipeline")?;

    let merged = merge::merge(&left, &right, args.deep)?;

    let yaml = codec::serialize_pipeline(&merged)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(yaml.as_bytes())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let pipeline = read_input(&args.file).context("failed to load the pipeline")?;

    let undeclared = pipeline.undeclared_types();
    if undeclared.is_empty() {
        return Ok(());
    }

    let mut report = format!("pipeline is not valid ({} problem(s)):", undeclared.len());
    for u in &undeclared {
        report.push_str(&format!("\n  - {u}"));
    }
    anyhow::bail!(report)
}

// ---------------------------------------------------------------------------
// input plumbing
// ---------------------------------------------------------------------------

/// Load a pipeline from a file path, or from stdin when the path is `-`.
fn read_input(path: &Path) -> Result<Pipeline> {
    if path == Path::new("-") {
        let pipeline = codec::read_pipeline(std::io::stdin().lock())?;
        Ok(pipeline)
    } else {
        Ok(codec::load_pipeline(path)?)
    }
}
