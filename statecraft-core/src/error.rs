//! Core error types.

use thiserror::Error;

/// Errors raised while declaring or validating a schematic, or while
/// resolving connectors. Never retryable.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("state name must not be blank")]
    BlankStateName,

    #[error("trigger name must not be blank on state '{state}'")]
    BlankTriggerName { state: String },

    #[error("resultant state must not be blank for trigger '{trigger}' on state '{state}'")]
    BlankResultantState { state: String, trigger: String },

    #[error("a transition for trigger '{trigger}' is already defined on state '{state}'")]
    DuplicateTrigger { state: String, trigger: String },

    #[error("schematic '{schematic}' declares no initial state")]
    NoInitialState { schematic: String },

    #[error("schematic '{schematic}' marks multiple states as initial: '{first}' and '{second}'")]
    MultipleInitialStates {
        schematic: String,
        first: String,
        second: String,
    },

    #[error("initial state '{state}' of schematic '{schematic}' is not a declared state")]
    UnknownInitialState { schematic: String, state: String },

    #[error("transition for trigger '{trigger}' on state '{state}' targets undeclared state '{resultant}'")]
    UnknownResultantState {
        state: String,
        trigger: String,
        resultant: String,
    },

    #[error("state '{state}' references undeclared parent state '{parent}'")]
    UnknownParentState { state: String, parent: String },

    #[error("no connector registered for key '{key}'")]
    UnknownConnector { key: String },

    #[error("connector '{key}' does not provide {role}")]
    ConnectorRoleMissing { key: String, role: &'static str },
}

/// Errors from the state machine runtime.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("schematic not found: {schematic}")]
    SchematicNotFound { schematic: String },

    #[error("machine instance not found: {machine_id}")]
    InstanceNotFound { machine_id: String },

    #[error("machine instance already exists: {machine_id}")]
    InstanceExists { machine_id: String },

    #[error("machine {machine_id} is in state '{state}' which is not declared by its schematic")]
    UnknownState { machine_id: String, state: String },

    #[error("invalid transition: cannot fire '{trigger}' in state '{state}'")]
    InvalidTransition { state: String, trigger: String },

    #[error("concurrency conflict: stale commit tag for machine {machine_id}")]
    ConcurrencyConflict { machine_id: String },

    #[error("connector '{key}' failed: {reason}")]
    ConnectorFailed { key: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MachineError {
    /// Returns whether the caller may reload the instance record and retry.
    ///
    /// Only a stale commit tag is recoverable; every other failure is either
    /// a rejection of the fire or a configuration fault.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MachineError::ConcurrencyConflict { .. })
    }
}
