use crate::output::print_json;
use std::path::Path;
use timelock_core::types::ActionId;

pub fn run(root: &Path, rpc_url: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = super::Session::open(root, rpc_url)?;
    let report = session.orchestrator().reconcile()?;

    if json {
        return print_json(&report);
    }
    print_ids("ready to execute", &report.promoted_to_ready);
    print_ids("back to pending", &report.demoted_to_pending);
    print_ids("rescheduled", &report.rescheduled);
    print_ids("executed or cancelled", &report.promoted_to_executed);
    println!("unchanged: {}", report.unchanged.len());
    Ok(())
}

fn print_ids(heading: &str, ids: &[ActionId]) {
    println!("{heading}: {}", ids.len());
    for id in ids {
        println!("  {id}");
    }
}
