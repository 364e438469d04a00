//! Show the timeline of an MS Project file

use anyhow::{Context, Result};
use milestone_core::{ExtractorConfig, ScheduleHandler};

use crate::cli::app::TimelineArgs;

pub fn execute(args: TimelineArgs, config: ExtractorConfig) -> Result<()> {
    let handler = ScheduleHandler::new(&config.schedule);
    let timeline = handler
        .extract_timeline(&args.path)
        .with_context(|| format!("Could not read timeline from {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    println!("Project: {}", timeline.project_name.as_deref().unwrap_or("(unnamed)"));
    let show = |date: Option<chrono::NaiveDate>| date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    println!("  Start: {}", show(timeline.project_start));
    println!("  Finish: {}", show(timeline.project_finish));

    println!("\n Critical path ({} tasks):", timeline.critical_path.len());
    for task in &timeline.critical_path {
        println!("  - {} {} ({} -> {})", task.unique_id, task.name, show(task.start_date), show(task.finish_date));
    }

    println!("\n Dependencies ({}):", timeline.dependencies.len());
    for link in timeline.dependencies.iter().take(20) {
        println!("  - {} -> {} [{}, lag {}]", link.predecessor_uid, link.successor_uid, link.link_type, link.lag);
    }
    if timeline.dependencies.len() > 20 {
        println!("  ... and {} more", timeline.dependencies.len() - 20);
    }

    println!("\n Assignments ({}):", timeline.resource_assignments.len());
    for assignment in &timeline.resource_assignments {
        println!("  - {}: {}", assignment.resource_name, assignment.task_name);
    }

    Ok(())
}
