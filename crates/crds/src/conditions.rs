//! Status conditions
//!
//! Condition records follow the Kubernetes convention: one entry per type,
//! True/False/Unknown status, and a transition timestamp that only moves
//! when the condition actually changes.

use crate::hana_express::HanaExpressStatus;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents one aspect of a resource's observed state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. "Available", "Degraded")
    pub r#type: String,

    /// Status of the condition
    pub status: ConditionStatus,

    /// CamelCase reason for the last transition
    pub reason: String,

    /// Human-readable message describing the transition
    pub message: String,

    /// RFC 3339 timestamp of the last status transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Tri-state condition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The condition could not be determined
    Unknown,
}

impl Condition {
    /// Creates a condition stamped with the current time.
    pub fn new(
        r#type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// Inserts or replaces a condition by type.
///
/// If an entry with the candidate's type already exists and its
/// (status, reason, message) triple is unchanged, the collection is left
/// untouched - in particular the existing transition timestamp survives.
/// A changed entry is replaced in place, keeping its position; a new type
/// is appended. Returns whether the collection changed.
pub fn upsert(conditions: &mut Vec<Condition>, candidate: Condition) -> bool {
    match conditions
        .iter_mut()
        .find(|existing| existing.r#type == candidate.r#type)
    {
        Some(existing) => {
            if existing.status == candidate.status
                && existing.reason == candidate.reason
                && existing.message == candidate.message
            {
                return false;
            }
            *existing = candidate;
            true
        }
        None => {
            conditions.push(candidate);
            true
        }
    }
}

impl HanaExpressStatus {
    /// Upserts a condition into the status, see [`upsert`].
    pub fn upsert_condition(&mut self, candidate: Condition) -> bool {
        upsert(&mut self.conditions, candidate)
    }
}
