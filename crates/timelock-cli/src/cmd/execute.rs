use crate::output::print_json;
use std::path::Path;
use timelock_core::types::ActionId;

pub fn run(root: &Path, rpc_url: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = super::Session::open(root, rpc_url)?;
    let report = session.orchestrator().execute_ready()?;

    if json {
        print_json(&report)?;
    } else {
        let state = session.load_state()?;
        let describe = |id: &ActionId| match state.get(id) {
            Some(a) => format!("{id}  {} ({}, target {})", a.label, a.description, a.target),
            None => id.to_string(),
        };
        println!("executed: {}", report.executed.len());
        for id in &report.executed {
            println!("  {}", describe(id));
        }
        println!("still pending: {}", report.still_pending.len());
        for id in &report.still_pending {
            println!("  {}", describe(id));
        }
        if !report.vanished.is_empty() {
            println!("no longer on-chain (run reconcile): {}", report.vanished.len());
            for id in &report.vanished {
                println!("  {}", describe(id));
            }
        }
        if !report.failed.is_empty() {
            println!("failed: {}", report.failed.len());
            for (id, reason) in &report.failed {
                println!("  {}", describe(id));
                println!("    {reason}");
            }
        }
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} action(s) failed to execute", report.failed.len());
    }
    Ok(())
}
