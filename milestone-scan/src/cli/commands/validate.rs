//! Validate command for MS Project files

use anyhow::{Result, bail};
use milestone_core::{ExtractorConfig, ScheduleHandler};

use crate::cli::app::ValidateArgs;

/// Execute the validate command; fails when the file has validation errors
pub fn execute(args: ValidateArgs, config: ExtractorConfig) -> Result<()> {
    let handler = ScheduleHandler::new(&config.schedule);
    let report = handler.validate_structure(&args.path);

    println!("Validating: {}", args.path.display());

    if !report.errors.is_empty() {
        println!("\n Errors:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    if !report.warnings.is_empty() {
        println!("\n Warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    if !report.is_valid() {
        bail!("{} is not a readable MS Project file", args.path.display());
    }

    println!("\n Valid MS Project file");
    Ok(())
}
