use clap::{Parser, Subcommand, ValueEnum};

/// reclaim — find and remove reclaimable disk space
#[derive(Parser, Debug)]
#[command(
    name = "reclaim",
    version,
    about = "Find and remove reclaimable disk space",
    long_about = "reclaim scans caches, logs, trash, build artifacts, large files and\n\
                  duplicate files concurrently, applies your ignore rules, and cleans\n\
                  what you select.",
    after_help = "EXAMPLES:\n  \
        reclaim scan                                 Scan every category\n  \
        reclaim scan --categories caches,logs        Scan selected categories\n  \
        reclaim scan --sequential --format json      One scanner at a time, JSON output\n  \
        reclaim dup ~/Downloads --min-size 1048576   Find duplicate files\n  \
        reclaim clean --categories trash --dry-run   Preview a cleanup\n  \
        reclaim categories                           List known categories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode — minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Also write logs to ~/.reclaim/logs
    #[arg(long, global = true)]
    pub log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for cleanable files
    Scan {
        /// Only scan specific categories
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Run one scanner at a time
        #[arg(long)]
        sequential: bool,

        /// Maximum scanners running at once
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Show individual items in results
        #[arg(long)]
        detailed: bool,
    },

    /// Find duplicate files
    Dup {
        /// Directories to search (default: Downloads, Documents, Desktop).
        /// Ignore rules and permission checks from the config apply to the results.
        paths: Vec<String>,

        /// Minimum file size to consider (in bytes)
        #[arg(long)]
        min_size: Option<u64>,

        /// How deep to descend below each directory
        #[arg(long)]
        max_depth: Option<usize>,

        /// Show every file in each group
        #[arg(long)]
        detailed: bool,
    },

    /// Remove items found in the given categories
    Clean {
        /// Categories to clean
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<String>,

        /// Show what would be removed without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List scan categories
    Categories,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
        }
    }
}
