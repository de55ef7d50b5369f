use crate::output::{print_json, print_table};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use timelock_core::action::{format_wait, GovernanceAction};

#[derive(Serialize)]
struct ListEntry<'a> {
    #[serde(flatten)]
    action: &'a GovernanceAction,
    remaining_wait_secs: Option<u64>,
}

pub fn run(root: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root, None)?;
    let state = super::open_store(root, &config)?.load()?;
    let now = Utc::now();

    let mut actions: Vec<&GovernanceAction> = state.pending.values().collect();
    if all {
        actions.extend(state.executed.values());
    }

    if json {
        let entries: Vec<ListEntry> = actions
            .iter()
            .map(|a| ListEntry {
                action: a,
                remaining_wait_secs: a.remaining_wait(now),
            })
            .collect();
        return print_json(&entries);
    }

    if actions.is_empty() {
        println!("No {} actions.", if all { "tracked" } else { "pending" });
        return Ok(());
    }

    let rows: Vec<Vec<String>> = actions
        .iter()
        .map(|a| {
            let ready = a
                .ready_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into());
            let wait = match a.remaining_wait(now) {
                Some(secs) if !a.status.is_terminal() => format_wait(secs),
                _ => "-".into(),
            };
            vec![
                a.id.short(),
                a.label.clone(),
                a.status.to_string(),
                ready,
                wait,
                a.target.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "LABEL", "STATUS", "READY AT (UTC)", "WAIT", "TARGET"], &rows);
    Ok(())
}
