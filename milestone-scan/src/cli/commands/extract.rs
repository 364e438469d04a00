//! Extract milestones command

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use milestone_core::{ExtractorConfig, Milestone, MilestoneExtractor};
use std::collections::BTreeMap;

use crate::cli::app::ExtractArgs;

/// Execute the extract command
pub fn execute(args: ExtractArgs, config: ExtractorConfig) -> Result<()> {
    let extractor = MilestoneExtractor::new(config);
    let milestones = extractor
        .extract_milestones(&args.path)
        .with_context(|| format!("Could not extract milestones from {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&milestones)?);
        return Ok(());
    }

    println!("Milestones in: {}", args.path.display());
    if milestones.is_empty() {
        println!("\n  No milestones found");
        return Ok(());
    }

    let today = Local::now().date_naive();
    for milestone in &milestones {
        println!("{}", summary_line(milestone, today));
        if !milestone.owner.is_empty() {
            println!("      Owner: {}", milestone.owner);
        }
        if !milestone.dependencies.is_empty() {
            println!("      Depends on: {}", milestone.dependencies.join(", "));
        }
    }

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for milestone in &milestones {
        *by_status.entry(milestone.status.to_string()).or_insert(0) += 1;
    }

    println!("\n Summary:");
    println!("  Total: {}", milestones.len());
    for (status, count) in &by_status {
        println!("  {}: {}", status, count);
    }
    let overdue = milestones.iter().filter(|m| m.is_overdue(today)).count();
    if overdue > 0 {
        println!("  Past target date: {}", overdue);
    }

    Ok(())
}

fn summary_line(milestone: &Milestone, today: NaiveDate) -> String {
    let timing = match milestone.schedule_variance_days() {
        Some(variance) => format!("finished {:+} days vs target", variance),
        None => {
            let days = milestone.days_until_target(today);
            if days >= 0 { format!("in {} days", days) } else { format!("{} days late", -days) }
        }
    };

    format!(
        "  - [{}] {}: {} (target {}, {})",
        milestone.status,
        milestone.id,
        milestone.name.chars().take(80).collect::<String>(),
        milestone.target_date,
        timing
    )
}
