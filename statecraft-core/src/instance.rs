//! Instance records.

use crate::schematic::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted current state of one running machine.
///
/// Records are replaced, never mutated in place: every successful fire
/// produces a successor via [`advanced`](Self::advanced) carrying a fresh
/// commit tag, so a repository keeps an auditable history and can commit
/// with compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Unique machine id.
    pub machine_id: String,

    /// Name of the schematic this instance runs.
    pub schematic_name: String,

    /// Current state.
    pub state: State,

    /// Opaque concurrency token; regenerated on every commit.
    pub commit_tag: Uuid,

    /// When this record was committed.
    pub updated_at: DateTime<Utc>,

    /// Payload of the fire that produced this record, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Content type of that payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl InstanceRecord {
    /// Creates the first record of a machine at its schematic's initial
    /// state.
    pub fn new(
        machine_id: impl Into<String>,
        schematic_name: impl Into<String>,
        initial_state: State,
    ) -> Self {
        Self {
            machine_id: machine_id.into(),
            schematic_name: schematic_name.into(),
            state: initial_state,
            commit_tag: Uuid::new_v4(),
            updated_at: Utc::now(),
            payload: None,
            content_type: None,
        }
    }

    /// Derives the successor record for a committed transition.
    pub fn advanced(
        &self,
        new_state: State,
        payload: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            machine_id: self.machine_id.clone(),
            schematic_name: self.schematic_name.clone(),
            state: new_state,
            commit_tag: Uuid::new_v4(),
            updated_at: Utc::now(),
            payload,
            content_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_carries_initial_state() {
        let record = InstanceRecord::new("m-1", "order", State::from("created"));

        assert_eq!(record.machine_id, "m-1");
        assert_eq!(record.schematic_name, "order");
        assert_eq!(record.state.as_str(), "created");
        assert!(record.payload.is_none());
    }

    #[test]
    fn test_advanced_replaces_tag_and_keeps_identity() {
        let record = InstanceRecord::new("m-1", "order", State::from("created"));
        let next = record.advanced(
            State::from("paid"),
            Some("{\"amount\":100}".to_string()),
            Some("application/json".to_string()),
        );

        assert_eq!(next.machine_id, record.machine_id);
        assert_eq!(next.schematic_name, record.schematic_name);
        assert_eq!(next.state.as_str(), "paid");
        assert_ne!(next.commit_tag, record.commit_tag);
        assert_eq!(next.payload.as_deref(), Some("{\"amount\":100}"));
        // The prior record is untouched.
        assert_eq!(record.state.as_str(), "created");
    }
}
