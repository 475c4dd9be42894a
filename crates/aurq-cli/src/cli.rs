use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set request headers
    #[arg(required = false, long, short = 'H', global = true)]
    pub header: Option<Vec<String>>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    /// Resolver to use: rpc or snapshot
    #[arg(required = false, long, short = 'b', global = true)]
    pub backend: Option<String>,

    /// Maximum names per info request (0 disables chunking)
    #[arg(required = false, long, global = true)]
    pub batch_size: Option<usize>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search packages whose fields contain any of the needles
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s")]
    Search {
        /// Needles to search for (regular expressions for the snapshot backend)
        #[arg(required = true)]
        needles: Vec<String>,

        /// Field selector, e.g. name, name-desc, maintainer, depends, provides
        #[arg(required = false, long)]
        by: Option<String>,
    },

    /// Show packages matching the given names exactly
    #[command(arg_required_else_help = true)]
    #[clap(name = "info", visible_alias = "i")]
    Info {
        /// Package names (or field values with --by)
        #[arg(required = true)]
        names: Vec<String>,

        /// Field selector, defaults to name
        #[arg(required = false, long)]
        by: Option<String>,
    },

    /// Download the metadata snapshot
    #[clap(name = "sync")]
    Sync {
        /// Fetch even when the local copy is still fresh
        #[arg(required = false, short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Config,

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,
}
