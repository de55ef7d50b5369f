//! JSON-RPC implementation of [`LedgerGateway`].
//!
//! Reads go through `eth_call`. Writes are pre-flighted with
//! `eth_estimateGas` (which is where revert reasons surface), sent with
//! `eth_sendTransaction` from a node-managed sender account, and then
//! awaited by polling `eth_getTransactionReceipt`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use alloy_dyn_abi::DynSolType;
use alloy_json_abi::Function;
use alloy_sol_types::decode_revert_reason;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LedgerConfig;
use crate::error::{Result, TimelockError};
use crate::types::{decode_hex, encode_hex, ActionId, Address, Payload, U256};

use super::abi;
use super::{ConfirmedTx, LedgerError, LedgerGateway, LedgerResult};

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

pub struct JsonRpcGateway {
    client: Client,
    url: String,
    timelock: Address,
    sender: Address,
    ready_timestamp_fn: Function,
    schedule_fn: Function,
    execute_fn: Function,
    not_ready_markers: Vec<String>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcGateway {
    pub fn new(cfg: &LedgerConfig) -> Result<Self> {
        let (timelock, sender) = cfg.require_accounts()?;
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| TimelockError::InvalidConfig(format!("cannot build http client: {e}")))?;
        let function = |sig: &str, params: Vec<DynSolType>| {
            abi::parse_function(sig, &params)
                .map_err(|e| TimelockError::InvalidConfig(format!("ledger: {e}")))
        };
        Ok(Self {
            client,
            url: cfg.rpc_url.clone(),
            timelock,
            sender,
            ready_timestamp_fn: function(&cfg.ready_timestamp_fn, abi::id_call_params())?,
            schedule_fn: function(&cfg.schedule_fn, abi::action_call_params())?,
            execute_fn: function(&cfg.execute_fn, abi::action_call_params())?,
            not_ready_markers: cfg
                .not_ready_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            confirmation_timeout: cfg.confirmation_timeout(),
            poll_interval: cfg.poll_interval(),
            next_id: AtomicU64::new(1),
        })
    }

    fn call(&self, method: &str, params: Value) -> LedgerResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        tracing::debug!(method, id, "rpc request");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("{method}: http {status}")));
        }
        let envelope: RpcEnvelope = resp
            .json()
            .map_err(|e| LedgerError::Malformed(format!("{method}: {e}")))?;
        if let Some(err) = envelope.error {
            return Err(self.classify(err));
        }
        envelope
            .result
            .ok_or_else(|| LedgerError::Malformed(format!("{method}: response has no result")))
    }

    /// Map a JSON-RPC error object onto the ledger error taxonomy.
    fn classify(&self, err: RpcErrorObject) -> LedgerError {
        let mut text = err.message.clone();
        if let Some(reason) = err.data.as_ref().and_then(revert_reason) {
            text = format!("{text}: {reason}");
        }
        let lower = text.to_lowercase();
        if self.not_ready_markers.iter().any(|m| lower.contains(m)) {
            return LedgerError::BufferNotElapsed(text);
        }
        if err.code == 3 || lower.contains("revert") {
            return LedgerError::Rejected(text);
        }
        LedgerError::Rpc {
            code: err.code,
            message: text,
        }
    }

    fn submit(&self, data: Vec<u8>, value: U256) -> LedgerResult<ConfirmedTx> {
        let mut tx = json!({
            "from": self.sender.to_string(),
            "to": self.timelock.to_string(),
            "data": encode_hex(&data),
            "value": format!("{value:#x}"),
        });
        let gas = parse_quantity(&self.call("eth_estimateGas", json!([tx.clone()]))?)?;
        tx["gas"] = json!(format!("0x{:x}", gas.saturating_add(gas / 5)));

        let hash = self
            .call("eth_sendTransaction", json!([tx]))?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Malformed("eth_sendTransaction: expected hash".into()))?;
        tracing::info!(tx = %hash, "transaction sent; awaiting confirmation");
        self.await_receipt(&hash)
    }

    fn await_receipt(&self, hash: &str) -> LedgerResult<ConfirmedTx> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            let receipt = self.call("eth_getTransactionReceipt", json!([hash]))?;
            if !receipt.is_null() {
                let block_number = parse_quantity(&receipt["blockNumber"])?;
                return match receipt["status"].as_str() {
                    Some("0x1") => Ok(ConfirmedTx {
                        tx_hash: hash.to_string(),
                        block_number,
                    }),
                    _ => Err(LedgerError::Rejected(format!(
                        "transaction {hash} reverted in block {block_number}"
                    ))),
                };
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::Timeout(format!(
                    "transaction {hash} not confirmed within {}s",
                    self.confirmation_timeout.as_secs()
                )));
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl LedgerGateway for JsonRpcGateway {
    fn ready_timestamp(&self, id: &ActionId) -> LedgerResult<u64> {
        let data = abi::encode_id_call(&self.ready_timestamp_fn, id)?;
        let ret = self.call(
            "eth_call",
            json!([{ "to": self.timelock.to_string(), "data": encode_hex(&data) }, "latest"]),
        )?;
        let raw = ret
            .as_str()
            .ok_or_else(|| LedgerError::Malformed("eth_call: expected hex string".into()))?;
        let bytes = decode_hex(raw).map_err(|e| LedgerError::Malformed(e.to_string()))?;
        abi::decode_u64(&bytes)
    }

    fn submit_schedule(
        &self,
        target: &Address,
        value: U256,
        payload: &Payload,
        id: &ActionId,
    ) -> LedgerResult<ConfirmedTx> {
        let data =
            abi::encode_action_call(&self.schedule_fn, target, value, payload.as_bytes(), id)?;
        self.submit(data, U256::ZERO)
    }

    fn submit_execute(
        &self,
        target: &Address,
        value: U256,
        payload: &Payload,
        id: &ActionId,
    ) -> LedgerResult<ConfirmedTx> {
        let data =
            abi::encode_action_call(&self.execute_fn, target, value, payload.as_bytes(), id)?;
        self.submit(data, value)
    }
}

fn transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout(e.to_string())
    } else {
        LedgerError::Transport(e.to_string())
    }
}

fn parse_quantity(v: &Value) -> LedgerResult<u64> {
    let s = v
        .as_str()
        .ok_or_else(|| LedgerError::Malformed(format!("expected hex quantity, got {v}")))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|_| LedgerError::Malformed(format!("bad hex quantity '{s}'")))
}

/// Decode a revert payload carried in an RPC error's `data` field.
/// `Error(string)` yields its message; plain-string data is returned as-is.
fn revert_reason(data: &Value) -> Option<String> {
    let s = data.as_str().or_else(|| data.get("data")?.as_str())?;
    let Ok(bytes) = decode_hex(s) else {
        return Some(s.to_string());
    };
    if bytes.is_empty() {
        return None;
    }
    let reason = decode_revert_reason(&bytes)?;
    match reason.strip_prefix("revert: ") {
        Some(msg) => Some(msg.to_string()),
        None => Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{Revert, SolError};
    use mockito::{Matcher, Server};

    fn gateway(url: String) -> JsonRpcGateway {
        let cfg = LedgerConfig {
            rpc_url: url,
            timelock_address: Some(Address::repeat_byte(0xaa)),
            sender: Some(Address::repeat_byte(0xbb)),
            poll_interval_ms: 1,
            confirmation_timeout_secs: 1,
            ..LedgerConfig::default()
        };
        JsonRpcGateway::new(&cfg).unwrap()
    }

    fn method(name: &str) -> Matcher {
        Matcher::PartialJson(json!({ "method": name }))
    }

    fn ok(result: Value) -> String {
        json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
    }

    fn err(code: i64, message: &str) -> String {
        json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } })
            .to_string()
    }

    fn error_string_payload(msg: &str) -> String {
        encode_hex(&Revert { reason: msg.into() }.abi_encode())
    }

    #[test]
    fn ready_timestamp_decodes_uint256() {
        let mut server = Server::new();
        let word = format!("0x{:064x}", 1_700_000_300u64);
        let m = server
            .mock("POST", "/")
            .match_body(method("eth_call"))
            .with_body(ok(json!(word)))
            .create();

        let gw = gateway(server.url());
        assert_eq!(gw.ready_timestamp(&ActionId([1; 32])).unwrap(), 1_700_000_300);
        m.assert();
    }

    #[test]
    fn ready_timestamp_sends_selector_and_id() {
        let mut server = Server::new();
        let id = ActionId([0x42; 32]);
        let f = abi::parse_function("getReadyTimestamp(bytes32)", &abi::id_call_params()).unwrap();
        let expected_data = encode_hex(&abi::encode_id_call(&f, &id).unwrap());
        let m = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_call",
                "params": [{ "to": Address::repeat_byte(0xaa).to_string(), "data": expected_data }, "latest"],
            })))
            .with_body(ok(json!(format!("0x{:064x}", 0))))
            .create();

        assert_eq!(gateway(server.url()).ready_timestamp(&id).unwrap(), 0);
        m.assert();
    }

    #[test]
    fn submit_waits_for_successful_receipt() {
        let mut server = Server::new();
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(ok(json!("0x5208")))
            .create();
        let send = server
            .mock("POST", "/")
            .match_body(method("eth_sendTransaction"))
            .with_body(ok(json!("0xfeed")))
            .expect(1)
            .create();
        let _receipt = server
            .mock("POST", "/")
            .match_body(method("eth_getTransactionReceipt"))
            .with_body(ok(json!({ "status": "0x1", "blockNumber": "0x10" })))
            .create();

        let tx = gateway(server.url())
            .submit_schedule(&Address::repeat_byte(1), U256::ZERO, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap();
        assert_eq!(
            tx,
            ConfirmedTx {
                tx_hash: "0xfeed".into(),
                block_number: 16
            }
        );
        send.assert();
    }

    #[test]
    fn not_ready_revert_is_buffer_not_elapsed() {
        let mut server = Server::new();
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(err(3, "execution reverted: Timelock: action time not yet passed"))
            .create();
        let send = server
            .mock("POST", "/")
            .match_body(method("eth_sendTransaction"))
            .expect(0)
            .create();

        let e = gateway(server.url())
            .submit_execute(&Address::repeat_byte(1), U256::ZERO, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap_err();
        assert!(matches!(e, LedgerError::BufferNotElapsed(_)), "{e:?}");
        send.assert();
    }

    #[test]
    fn other_revert_is_rejected_with_decoded_reason() {
        let mut server = Server::new();
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 3,
                "message": "execution reverted",
                "data": error_string_payload("Timelock: forbidden"),
            }
        });
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(body.to_string())
            .create();

        let e = gateway(server.url())
            .submit_execute(&Address::repeat_byte(1), U256::ZERO, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap_err();
        assert_eq!(
            e,
            LedgerError::Rejected("execution reverted: Timelock: forbidden".into())
        );
    }

    #[test]
    fn reverted_receipt_is_rejected() {
        let mut server = Server::new();
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(ok(json!("0x5208")))
            .create();
        let _send = server
            .mock("POST", "/")
            .match_body(method("eth_sendTransaction"))
            .with_body(ok(json!("0xdead")))
            .create();
        let _receipt = server
            .mock("POST", "/")
            .match_body(method("eth_getTransactionReceipt"))
            .with_body(ok(json!({ "status": "0x0", "blockNumber": "0x11" })))
            .create();

        let e = gateway(server.url())
            .submit_execute(&Address::repeat_byte(1), U256::ZERO, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap_err();
        assert!(matches!(e, LedgerError::Rejected(ref m) if m.contains("0xdead")), "{e:?}");
    }

    #[test]
    fn unmined_transaction_times_out() {
        let mut server = Server::new();
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(ok(json!("0x5208")))
            .create();
        let _send = server
            .mock("POST", "/")
            .match_body(method("eth_sendTransaction"))
            .with_body(ok(json!("0xslow")))
            .create();
        let _receipt = server
            .mock("POST", "/")
            .match_body(method("eth_getTransactionReceipt"))
            .with_body(ok(Value::Null))
            .create();

        let e = gateway(server.url())
            .submit_schedule(&Address::repeat_byte(1), U256::ZERO, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap_err();
        assert!(matches!(e, LedgerError::Timeout(_)), "{e:?}");
        assert!(e.is_transient());
    }

    #[test]
    fn http_failure_is_transport() {
        let mut server = Server::new();
        let _m = server.mock("POST", "/").with_status(502).create();
        let e = gateway(server.url())
            .ready_timestamp(&ActionId([1; 32]))
            .unwrap_err();
        assert!(matches!(e, LedgerError::Transport(_)), "{e:?}");
    }

    #[test]
    fn non_revert_rpc_error_keeps_code() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/")
            .with_body(err(-32000, "nonce too low"))
            .create();
        let e = gateway(server.url())
            .ready_timestamp(&ActionId([1; 32]))
            .unwrap_err();
        assert_eq!(
            e,
            LedgerError::Rpc {
                code: -32000,
                message: "nonce too low".into()
            }
        );
    }

    #[test]
    fn missing_accounts_fail_construction() {
        assert!(JsonRpcGateway::new(&LedgerConfig::default()).is_err());
    }

    #[test]
    fn misshapen_function_signature_fails_construction() {
        let cfg = LedgerConfig {
            timelock_address: Some(Address::repeat_byte(0xaa)),
            sender: Some(Address::repeat_byte(0xbb)),
            execute_fn: "executeAction(address,bytes32)".into(),
            ..LedgerConfig::default()
        };
        let err = JsonRpcGateway::new(&cfg).err().unwrap();
        assert!(matches!(err, TimelockError::InvalidConfig(_)), "{err}");
        assert!(err.to_string().contains("executeAction"), "{err}");
    }

    #[test]
    fn execute_sends_full_width_value_and_saturated_gas() {
        let mut server = Server::new();
        let _gas = server
            .mock("POST", "/")
            .match_body(method("eth_estimateGas"))
            .with_body(ok(json!("0xffffffffffffffff")))
            .create();
        let send = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                method("eth_sendTransaction"),
                Matcher::Regex(r#""gas":"0xffffffffffffffff""#.into()),
                Matcher::Regex(format!(r#""value":"0x{}""#, "f".repeat(64))),
            ]))
            .with_body(ok(json!("0xfeed")))
            .expect(1)
            .create();
        let _receipt = server
            .mock("POST", "/")
            .match_body(method("eth_getTransactionReceipt"))
            .with_body(ok(json!({ "status": "0x1", "blockNumber": "0x10" })))
            .create();

        gateway(server.url())
            .submit_execute(&Address::repeat_byte(1), U256::MAX, &Payload(vec![1]), &ActionId([2; 32]))
            .unwrap();
        send.assert();
    }

    #[test]
    fn revert_reason_handles_plain_and_encoded_data() {
        assert_eq!(
            revert_reason(&json!(error_string_payload("nope"))).as_deref(),
            Some("nope")
        );
        assert_eq!(
            revert_reason(&json!("Timelock: invalid target")).as_deref(),
            Some("Timelock: invalid target")
        );
        assert_eq!(revert_reason(&json!(42)), None);
        assert_eq!(revert_reason(&json!("0x")), None);
    }

    #[test]
    fn error_string_with_oversized_length_is_not_decoded() {
        // Error(string) whose length word claims u64::MAX bytes.
        let mut data = Revert::SELECTOR.to_vec();
        data.extend_from_slice(&U256::from(32).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(u64::MAX).to_be_bytes::<32>());
        assert_eq!(revert_reason(&json!(encode_hex(&data))), None);
    }
}
