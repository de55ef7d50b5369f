use crate::output::print_json;
use std::path::Path;
use timelock_core::action::format_wait;

pub fn run(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root, None)?;
    let state = super::open_store(root, &config)?.load()?;
    let action = state.find(id)?;

    if json {
        return print_json(action);
    }

    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".into());
    println!("id:           {}", action.id);
    println!("label:        {}", action.label);
    println!("description:  {}", action.description);
    println!("status:       {}", action.status);
    println!("target:       {}", action.target);
    println!("value (wei):  {}", action.value);
    println!("payload:      {}", action.payload);
    println!(
        "ready at:     {}",
        or_dash(action.ready_at().map(|t| t.to_rfc3339()))
    );
    if let Some(secs) = action.remaining_wait(chrono::Utc::now()) {
        println!("wait:         {}", format_wait(secs));
    }
    println!(
        "scheduled:    {}",
        or_dash(action.scheduled_at_local.map(|t| t.to_rfc3339()))
    );
    println!(
        "executed:     {}",
        or_dash(action.executed_at.map(|t| t.to_rfc3339()))
    );
    println!("execution tx: {}", or_dash(action.execution_tx.clone()));
    if let Some(err) = &action.last_error {
        println!("last error:   {err}");
    }
    Ok(())
}
