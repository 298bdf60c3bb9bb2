use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::PageSelection;

#[derive(Debug, Parser)]
#[command(
    name = "logistics-risk-dashboard",
    version,
    about = "Risk dashboard over cleaned transport and supply-chain incident datasets"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Configuration file (default: dashboard.toml if present)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory holding the cleaned CSV exports")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the dashboard window
    Gui,
    /// List page ids
    Pages,
    /// Build pages headless and print them
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long, default_value = "all", help = "Page id, or 'all'")]
    pub page: PageSelection,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(long, help = "Write the report to a file instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::PageId;

    #[test]
    fn no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["logistics-risk-dashboard"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::try_parse_from([
            "logistics-risk-dashboard",
            "report",
            "--page",
            "last_mile",
            "--format",
            "json",
            "--data-dir",
            "/tmp/data",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        match cli.command {
            Some(Commands::Report(args)) => {
                assert_eq!(args.page, PageSelection::One(PageId::LastMile));
                assert_eq!(args.format, ReportFormat::Json);
                assert!(args.out.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
