use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ForceBench - a batch evaluation harness comparing trained interatomic force/energy models against a held-out reference trajectory.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the evaluation trajectory (extended-XYZ) from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Override the output directory from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override how many trailing structures of the trajectory are evaluated.
    #[arg(short, long, value_name = "INT")]
    pub tail: Option<usize>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
