//! ABI encoding of the timelock calls, on `alloy-dyn-abi`.
//!
//! The three function signatures come from configuration, so they are
//! parsed once and checked against the argument shapes the gateway sends:
//! `(bytes32)` for the ready-timestamp read and
//! `(address,uint256,bytes,bytes32)` for schedule and execute.

use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::Function;
use alloy_primitives::{B256, U256};

use crate::types::{ActionId, Address};

use super::{LedgerError, LedgerResult};

pub fn id_call_params() -> Vec<DynSolType> {
    vec![DynSolType::FixedBytes(32)]
}

pub fn action_call_params() -> Vec<DynSolType> {
    vec![
        DynSolType::Address,
        DynSolType::Uint(256),
        DynSolType::Bytes,
        DynSolType::FixedBytes(32),
    ]
}

/// Parse `signature` and require its inputs to be exactly `expected`.
pub fn parse_function(signature: &str, expected: &[DynSolType]) -> Result<Function, String> {
    let function =
        Function::parse(signature).map_err(|e| format!("bad signature '{signature}': {e}"))?;
    let inputs = function
        .inputs
        .iter()
        .map(|p| p.resolve())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad signature '{signature}': {e}"))?;
    if inputs != expected {
        let want: Vec<_> = expected.iter().map(|t| t.sol_type_name()).collect();
        return Err(format!("'{signature}' must take ({})", want.join(",")));
    }
    Ok(function)
}

fn id_word(id: &ActionId) -> DynSolValue {
    DynSolValue::FixedBytes(B256::from(id.0), 32)
}

/// Calldata for `f(bytes32)`.
pub fn encode_id_call(function: &Function, id: &ActionId) -> LedgerResult<Vec<u8>> {
    function
        .abi_encode_input(&[id_word(id)])
        .map_err(|e| LedgerError::Encoding(format!("{}: {e}", function.name)))
}

/// Calldata for `f(address,uint256,bytes,bytes32)`.
pub fn encode_action_call(
    function: &Function,
    target: &Address,
    value: U256,
    data: &[u8],
    id: &ActionId,
) -> LedgerResult<Vec<u8>> {
    let args = [
        DynSolValue::Address(*target),
        DynSolValue::Uint(value, 256),
        DynSolValue::Bytes(data.to_vec()),
        id_word(id),
    ];
    function
        .abi_encode_input(&args)
        .map_err(|e| LedgerError::Encoding(format!("{}: {e}", function.name)))
}

/// Decode a single `uint256` return value that must fit in a `u64`.
pub fn decode_u64(ret: &[u8]) -> LedgerResult<u64> {
    let decoded = DynSolType::Uint(256)
        .abi_decode(ret)
        .map_err(|e| LedgerError::Malformed(format!("expected a uint256 return: {e}")))?;
    let (word, _) = decoded
        .as_uint()
        .ok_or_else(|| LedgerError::Malformed("expected a uint256 return".into()))?;
    u64::try_from(word)
        .map_err(|_| LedgerError::Malformed(format!("uint256 return {word} does not fit in u64")))
}
