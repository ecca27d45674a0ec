use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "GraphProt Developers",
    version,
    about = "GraphProt CLI - hierarchical coarsening and management of molecular contact graph archives.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster and pool every graph of an archive over one or more rounds.
    Coarsen(CoarsenArgs),
    /// Combine archives written by independent workers into one.
    Merge(MergeArgs),
}

/// Arguments for the `coarsen` subcommand.
#[derive(Args, Debug)]
pub struct CoarsenArgs {
    /// Path to the input graph archive (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the archive holding the coarsest level of every graph.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a coarsening configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the community detection method ('mcl' or 'louvain').
    #[arg(short, long, value_name = "NAME")]
    pub method: Option<String>,

    /// Override the number of cluster-and-pool rounds.
    #[arg(short, long, value_name = "INT")]
    pub rounds: Option<usize>,

    /// Seed for the Louvain node visiting order.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Use this edge attribute column as clustering weight.
    #[arg(short, long, value_name = "COLUMN")]
    pub weight_column: Option<usize>,

    /// Use precomputed cluster assignments stored in the graphs.
    #[arg(long)]
    pub use_preloaded: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S clustering.inflation=3.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `merge` subcommand.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Path for the merged archive.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Keep the partial archives after a successful merge.
    #[arg(long)]
    pub keep_partials: bool,

    /// Partial archives to combine.
    #[arg(required = true, value_name = "PARTS")]
    pub inputs: Vec<PathBuf>,
}
