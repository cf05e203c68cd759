use super::build_hub;
use crate::output::Output;
use color_eyre::Result;
use serde_json::json;

pub fn run_clear(output: &Output) -> Result<()> {
    let hub = build_hub()?;
    let removed = hub.clear_cache()?;

    if output.is_human() {
        if removed == 0 {
            output.info("No snapshots found to clear");
        } else {
            output.success(format!("Removed {} snapshot(s)", removed));
        }
    } else {
        output.data(&json!({ "removed": removed }));
    }
    Ok(())
}
