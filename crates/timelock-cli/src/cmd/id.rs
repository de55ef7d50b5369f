use crate::output::print_json;
use timelock_core::action::ActionRequest;
use timelock_core::types;

pub fn run(label: &str, target: &str, calldata: &str, json: bool) -> anyhow::Result<()> {
    let request = ActionRequest::new(label, types::parse_address(target)?, calldata.parse()?)?;
    let id = request.id();
    if json {
        print_json(&serde_json::json!({
            "id": id,
            "label": request.label,
            "target": request.target,
        }))?;
    } else {
        println!("{id}");
    }
    Ok(())
}
