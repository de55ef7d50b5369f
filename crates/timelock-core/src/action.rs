//! Governance action data model.
//!
//! A `GovernanceAction` is the unit of administration: one call against a
//! target program, gated by the timelock's buffer. Its identity is derived
//! by the codec from `(label, target, payload)`; everything else is the
//! orchestrator's last observation of where the action is in its lifecycle.

use crate::codec;
use crate::error::Result;
use crate::types::{self, ActionId, Address, Payload, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// A desired administrative call, before it has been scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub target: Address,
    #[serde(with = "types::wei_string", default)]
    pub value: U256,
    pub payload: Payload,
}

impl ActionRequest {
    pub fn new(label: impl Into<String>, target: Address, payload: Payload) -> Result<Self> {
        let label = label.into();
        types::validate_label(&label)?;
        Ok(Self {
            description: label.clone(),
            label,
            target,
            value: U256::ZERO,
            payload,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn id(&self) -> ActionId {
        codec::identify(&self.label, &self.target, self.payload.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// LocalStatus
// ---------------------------------------------------------------------------

/// The orchestrator's last observation of an action.
///
/// Transitions:
/// `Pending ⇄ ReadyToExecute → Executed | ExecutedOrCancelled`
///
/// `Executed` means the Executor saw the execute transaction confirm.
/// `ExecutedOrCancelled` means the Reconciler found the action gone from the
/// program without having executed it itself. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalStatus {
    Pending,
    ReadyToExecute,
    Executed,
    ExecutedOrCancelled,
    #[serde(other)]
    Unknown,
}

impl LocalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::ExecutedOrCancelled)
    }
}

impl std::fmt::Display for LocalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::ReadyToExecute => "ready",
            Self::Executed => "executed",
            Self::ExecutedOrCancelled => "executed-or-cancelled",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// GovernanceAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceAction {
    pub id: ActionId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub target: Address,
    #[serde(with = "types::wei_string", default)]
    pub value: U256,
    pub payload: Payload,
    pub status: LocalStatus,
    /// When this process submitted the schedule call. `None` for actions
    /// adopted from the chain.
    #[serde(default)]
    pub scheduled_at_local: Option<DateTime<Utc>>,
    /// On-chain timestamp (unix seconds) after which execution is allowed.
    /// `0` means the program has no record of the action.
    #[serde(default)]
    pub ready_at_chain: u64,
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_tx: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GovernanceAction {
    /// Build a tracked action from a request and the observed on-chain
    /// readiness timestamp (must be non-zero).
    pub fn observed(
        request: &ActionRequest,
        ready_at_chain: u64,
        scheduled_at_local: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut action = Self {
            id: request.id(),
            label: request.label.clone(),
            description: request.description.clone(),
            target: request.target,
            value: request.value,
            payload: request.payload.clone(),
            status: LocalStatus::Pending,
            scheduled_at_local,
            ready_at_chain,
            executed_at: None,
            execution_tx: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        action.status = action.readiness_at(now);
        action
    }

    /// `ReadyToExecute` if the recorded timestamp has elapsed, else `Pending`.
    pub fn readiness_at(&self, now: DateTime<Utc>) -> LocalStatus {
        if self.ready_at_chain != 0 && self.ready_at_chain <= unix(now) {
            LocalStatus::ReadyToExecute
        } else {
            LocalStatus::Pending
        }
    }

    /// Seconds left until the buffer elapses, `None` once ready or unknown.
    pub fn remaining_wait(&self, now: DateTime<Utc>) -> Option<u64> {
        let now = unix(now);
        if self.ready_at_chain > now {
            Some(self.ready_at_chain - now)
        } else {
            None
        }
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        if self.ready_at_chain == 0 {
            return None;
        }
        DateTime::from_timestamp(self.ready_at_chain as i64, 0)
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

pub(crate) fn unix(t: DateTime<Utc>) -> u64 {
    t.timestamp().max(0) as u64
}

/// Human-readable duration such as `4m 12s` or `2h 5m`.
pub fn format_wait(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ActionRequest {
        ActionRequest::new("setGov", Address::repeat_byte(1), Payload(vec![0xaa])).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn request_rejects_bad_label() {
        assert!(ActionRequest::new("bad label", Address::ZERO, Payload::default()).is_err());
    }

    #[test]
    fn observed_future_timestamp_is_pending() {
        let a = GovernanceAction::observed(&request(), 1_300, Some(at(1_000)), at(1_000));
        assert_eq!(a.status, LocalStatus::Pending);
        assert_eq!(a.remaining_wait(at(1_000)), Some(300));
        assert_eq!(a.id, request().id());
    }

    #[test]
    fn observed_elapsed_timestamp_is_ready() {
        let a = GovernanceAction::observed(&request(), 1_000, None, at(1_000));
        assert_eq!(a.status, LocalStatus::ReadyToExecute);
        assert_eq!(a.remaining_wait(at(1_000)), None);
    }

    #[test]
    fn zero_timestamp_is_never_ready() {
        let mut a = GovernanceAction::observed(&request(), 5, None, at(10));
        a.ready_at_chain = 0;
        assert_eq!(a.readiness_at(at(10_000)), LocalStatus::Pending);
        assert!(a.ready_at().is_none());
    }

    #[test]
    fn unknown_status_deserializes() {
        let s: LocalStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(s, LocalStatus::Unknown);
        assert!(!s.is_terminal());
    }

    #[test]
    fn value_is_stored_as_decimal_string() {
        let a = GovernanceAction::observed(
            &request().with_value(U256::from(10u128.pow(20))),
            1,
            None,
            at(0),
        );
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["value"], "100000000000000000000");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn format_wait_units() {
        assert_eq!(format_wait(42), "42s");
        assert_eq!(format_wait(252), "4m 12s");
        assert_eq!(format_wait(7_500), "2h 5m");
    }
}
