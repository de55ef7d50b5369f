//! Governance plans: administrative calls expressed as data.
//!
//! A plan file names the addresses it touches once, then lists actions as
//! `label + target + payload` where the payload is either raw calldata or a
//! call template: a function signature plus one argument per parameter,
//! ABI-encoded with `alloy-dyn-abi`. Address arguments may be `@alias`;
//! every other argument is coerced from its text form (`"0xff..ff"`, `6`,
//! `true`, `[1, 2]`).
//!
//! ```yaml
//! addresses:
//!   vault: "0x489ee077994B6658eAfA855C308275EAd8097C4A"
//!   usdc:  "0xaf88d065e77c8cC2239327C5EDb3A432268e5831"
//! actions:
//!   - label: whitelist-usdc
//!     description: Whitelist USDC on the vault
//!     target: "@vault"
//!     call:
//!       signature: "setTokenConfig(address,uint256,uint256,uint256,uint256,bool,bool)"
//!       args: ["@usdc", 6, 10000, 75, 0, true, false]
//!   - label: set-gov
//!     target: "@vault"
//!     calldata: "0xcfad57a2000000000000000000000000000000000000000000000000000000000000dead"
//! ```

use crate::action::ActionRequest;
use crate::error::{Result, TimelockError};
use crate::io;
use crate::types::{self, Address, Payload, U256};
use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::Function;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub addresses: BTreeMap<String, Address>,
    #[serde(default)]
    pub actions: Vec<PlanAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAction {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Literal address or `@alias` from `addresses`.
    pub target: String,
    /// Wei amount, decimal or `0x` hex.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub calldata: Option<String>,
    #[serde(default)]
    pub call: Option<CallTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTemplate {
    pub signature: String,
    #[serde(default)]
    pub args: Vec<serde_yaml::Value>,
}

pub const EXAMPLE_PLAN: &str = r#"# Governance plan: one entry per timelocked call.
# Run `timelock schedule-all` to schedule every entry (already-known
# entries are skipped), then `timelock execute-all` once buffers elapse.
addresses: {}
#  vault: "0x0000000000000000000000000000000000000000"
#  usdc: "0x0000000000000000000000000000000000000000"
actions: []
#  - label: whitelist-usdc
#    description: Whitelist USDC on the vault
#    target: "@vault"
#    call:
#      signature: "setTokenConfig(address,uint256,uint256,uint256,uint256,bool,bool)"
#      args: ["@usdc", 6, 10000, 75, 0, true, false]
"#;

impl Plan {
    pub fn load(path: &Path) -> Result<Self> {
        let Some(data) = io::read_optional(path)? else {
            return Err(TimelockError::PlanFile(format!(
                "plan not found at {}",
                path.display()
            )));
        };
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Resolve every entry into a concrete request, in file order.
    pub fn resolve(&self) -> Result<Vec<ActionRequest>> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.actions.len());
        for entry in &self.actions {
            let request = self.resolve_one(entry)?;
            if !seen.insert(request.id()) {
                return Err(plan_err(&entry.label, "duplicate of an earlier entry".into()));
            }
            out.push(request);
        }
        Ok(out)
    }

    fn resolve_one(&self, entry: &PlanAction) -> Result<ActionRequest> {
        let label = &entry.label;
        types::validate_label(label)?;
        let target = self.address(label, &entry.target)?;
        let value = match &entry.value {
            Some(v) => types::parse_value(v)?,
            None => U256::ZERO,
        };
        let payload = match (&entry.calldata, &entry.call) {
            (Some(raw), None) => raw.parse::<Payload>()?,
            (None, Some(call)) => Payload(self.encode_call(label, call)?),
            _ => {
                return Err(plan_err(
                    label,
                    "exactly one of 'calldata' or 'call' is required".into(),
                ))
            }
        };
        let mut request = ActionRequest::new(label.clone(), target, payload)?.with_value(value);
        if let Some(d) = &entry.description {
            request = request.with_description(d.clone());
        }
        Ok(request)
    }

    fn address(&self, label: &str, raw: &str) -> Result<Address> {
        match raw.strip_prefix('@') {
            Some(alias) => self
                .addresses
                .get(alias)
                .copied()
                .ok_or_else(|| plan_err(label, format!("unknown address alias '@{alias}'"))),
            None => types::parse_address(raw),
        }
    }

    fn encode_call(&self, label: &str, call: &CallTemplate) -> Result<Vec<u8>> {
        let function = Function::parse(&call.signature)
            .map_err(|e| plan_err(label, format!("bad signature '{}': {e}", call.signature)))?;
        if function.inputs.len() != call.args.len() {
            return Err(plan_err(
                label,
                format!(
                    "'{}' takes {} argument(s), {} given",
                    call.signature,
                    function.inputs.len(),
                    call.args.len()
                ),
            ));
        }
        let mut values = Vec::with_capacity(call.args.len());
        for (param, arg) in function.inputs.iter().zip(&call.args) {
            let ty = param
                .resolve()
                .map_err(|e| plan_err(label, format!("unsupported type '{}': {e}", param.ty)))?;
            values.push(self.encode_arg(label, &ty, arg)?);
        }
        function
            .abi_encode_input(&values)
            .map_err(|e| plan_err(label, format!("cannot encode '{}': {e}", call.signature)))
    }

    fn encode_arg(
        &self,
        label: &str,
        ty: &DynSolType,
        arg: &serde_yaml::Value,
    ) -> Result<DynSolValue> {
        let text = scalar(arg).ok_or_else(|| {
            let ty = ty.sol_type_name();
            plan_err(label, format!("argument for {ty} must be a scalar or a list"))
        })?;
        if *ty == DynSolType::Address {
            return Ok(DynSolValue::Address(self.address(label, &text)?));
        }
        let bad = |why: String| {
            plan_err(label, format!("bad {} argument '{text}': {why}", ty.sol_type_name()))
        };
        let value = ty.coerce_str(&text).map_err(|e| bad(e.to_string()))?;
        if let DynSolValue::Uint(v, bits) = &value {
            if v.bit_len() > *bits {
                return Err(bad("out of range".into()));
            }
        }
        Ok(value)
    }
}

fn plan_err(label: &str, reason: String) -> TimelockError {
    TimelockError::Plan {
        label: label.to_string(),
        reason,
    }
}

fn scalar(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Sequence(items) => {
            let items = items.iter().map(scalar).collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", items.join(",")))
        }
        _ => None,
    }
}
