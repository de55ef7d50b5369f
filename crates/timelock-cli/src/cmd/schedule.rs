use crate::output::print_json;
use serde::Serialize;
use std::path::Path;
use timelock_core::action::{ActionRequest, GovernanceAction};
use timelock_core::plan::Plan;
use timelock_core::paths;
use timelock_core::types::{self, ActionId, Address};

pub struct ScheduleArgs<'a> {
    pub label: &'a str,
    pub target: &'a str,
    pub calldata: &'a str,
    pub value: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub fn run(
    root: &Path,
    rpc_url: Option<&str>,
    args: ScheduleArgs<'_>,
    json: bool,
) -> anyhow::Result<()> {
    let target = types::parse_address(args.target)?;
    let mut request = ActionRequest::new(args.label, target, args.calldata.parse()?)?;
    if let Some(v) = args.value {
        request = request.with_value(types::parse_value(v)?);
    }
    if let Some(d) = args.description {
        request = request.with_description(d);
    }

    let session = super::Session::open(root, rpc_url)?;
    let action = session.orchestrator().schedule(&request)?;

    if json {
        print_json(&action)?;
    } else {
        print_scheduled(&action);
    }
    Ok(())
}

#[derive(Serialize)]
struct Outcome<'a> {
    id: ActionId,
    label: &'a str,
    description: &'a str,
    target: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<GovernanceAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Schedule every action in the plan. Failures are reported and the batch
/// continues; the command fails at the end if any action failed.
pub fn run_all(
    root: &Path,
    rpc_url: Option<&str>,
    plan: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let plan_path = plan
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::plan_path(root));
    let requests = Plan::load(&plan_path)?.resolve()?;

    let session = super::Session::open(root, rpc_url)?;
    let results = session.orchestrator().schedule_all(&requests);

    let outcomes: Vec<Outcome> = results
        .into_iter()
        .map(|(req, res)| {
            let (action, error) = match res {
                Ok(a) => (Some(a), None),
                Err(e) => (None, Some(format!("{e:#}"))),
            };
            Outcome {
                id: req.id(),
                label: &req.label,
                description: &req.description,
                target: req.target,
                action,
                error,
            }
        })
        .collect();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    if json {
        print_json(&outcomes)?;
    } else if outcomes.is_empty() {
        println!("Plan has no actions.");
    } else {
        for o in &outcomes {
            match (&o.action, &o.error) {
                (Some(a), _) => print_scheduled(a),
                (None, Some(err)) => {
                    println!(
                        "FAILED     {}  {}  ({}, target {})",
                        o.id, o.label, o.description, o.target
                    );
                    println!("           {err}");
                }
                (None, None) => {}
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} action(s) failed to schedule", outcomes.len());
    }
    Ok(())
}

fn print_scheduled(action: &GovernanceAction) {
    let ready = action
        .ready_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into());
    println!(
        "{:<10} {}  {}  ready at {ready}",
        action.status.to_string(),
        action.id,
        action.label
    );
}
