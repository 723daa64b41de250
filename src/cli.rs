use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-tally")]
#[command(about = "Per-author commit statistics over a time window")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository", default_value = ".")]
    pub repo: PathBuf,

    #[arg(
        long,
        help = "Start of period (RFC3339, YYYY-MM-DD, YYYY-MM-DD HH:MM, or '<duration> ago')"
    )]
    pub since: Option<String>,

    #[arg(long, help = "End of period (same formats as --since)")]
    pub until: Option<String>,

    #[arg(long, help = "Case-insensitive substring filter on author name or email")]
    pub author: Option<String>,

    #[arg(long, help = "Include merge commits", default_value_t = false)]
    pub include_merges: bool,

    #[arg(long, help = "Write the ranked rows to a CSV file")]
    pub csv: Option<PathBuf>,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::run::exec(self)
    }
}
