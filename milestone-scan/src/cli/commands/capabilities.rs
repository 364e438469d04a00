//! Show schedule backend availability

use anyhow::Result;
use milestone_core::{BackendKind, ExtractorConfig, ScheduleHandler};

pub fn execute(config: ExtractorConfig) -> Result<()> {
    let handler = ScheduleHandler::new(&config.schedule);
    let capability = handler.capabilities();

    println!("MS Project backends (in priority order):");
    for kind in BackendKind::ALL {
        let mark = if capability.is_available(kind) { "available" } else { "unavailable" };
        println!("  {:<16} {}", kind.to_string(), mark);
    }

    if !capability.any() {
        println!("\n No backend can read .mpp files on this machine");
    }

    Ok(())
}
