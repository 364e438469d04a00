use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "milestone-scan",
    version,
    about = "Milestone Scan - Extract project milestones from planning documents",
    long_about = "Milestone Scan reads Markdown plans, Excel workbooks and Microsoft Project schedules and extracts normalized milestone records from their tables, prose and tasks."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract milestones from a document
    #[command(about = "Extract milestones from a Markdown, Excel or MS Project file")]
    Extract(ExtractArgs),

    /// Validate a schedule file
    #[command(about = "Check that an MS Project file can be read")]
    Validate(ValidateArgs),

    /// Show schedule backends
    #[command(about = "Show which MS Project backends are available")]
    Capabilities,

    /// Show a schedule timeline
    #[command(about = "Show critical path, dependencies and assignments of an MS Project file")]
    Timeline(TimelineArgs),
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Path to the document
    #[arg(help = "Path to the document to extract milestones from")]
    pub path: PathBuf,

    /// Print milestones as JSON
    #[arg(long, help = "Print milestones as pretty JSON")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the schedule file
    #[arg(help = "Path to the .mpp file to validate")]
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct TimelineArgs {
    /// Path to the schedule file
    #[arg(help = "Path to the .mpp file")]
    pub path: PathBuf,

    /// Print the timeline as JSON
    #[arg(long, help = "Print the timeline as pretty JSON")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from(["milestone-scan", "-vv", "extract", "plan.md", "--json"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.path, PathBuf::from("plan.md"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["milestone-scan", "validate", "plan.mpp", "-c", "cfg.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_capabilities_takes_no_args() {
        let cli = Cli::parse_from(["milestone-scan", "capabilities"]);
        assert!(matches!(cli.command, Commands::Capabilities));
        assert!(Cli::try_parse_from(["milestone-scan", "capabilities", "x"]).is_err());
    }
}
