//! The per-instance runtime handle.

use crate::connector::ConnectorRegistry;
use crate::error::MachineError;
use crate::instance::InstanceRecord;
use crate::repository::Repository;
use crate::schematic::{Schematic, State, StateConfiguration, Trigger};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A handle to one persisted machine instance.
///
/// All operations are async and may be invoked concurrently against the same
/// instance from multiple handles or processes; the repository's
/// compare-and-swap commit closes the guard-evaluate-then-commit race. A
/// fire future dropped before its commit await leaves the instance
/// untouched; the commit itself is a single repository call.
#[derive(Clone)]
pub struct StateMachine {
    machine_id: String,
    schematic: Arc<Schematic>,
    repository: Arc<dyn Repository>,
    connectors: Arc<ConnectorRegistry>,
}

// The repository and registry are trait objects, so Debug is by hand.
impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("machine_id", &self.machine_id)
            .field("schematic", &self.schematic.schematic_name())
            .finish()
    }
}

impl StateMachine {
    pub(crate) fn new(
        machine_id: String,
        schematic: Arc<Schematic>,
        repository: Arc<dyn Repository>,
        connectors: Arc<ConnectorRegistry>,
    ) -> Self {
        Self {
            machine_id,
            schematic,
            repository,
            connectors,
        }
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn schematic(&self) -> &Schematic {
        &self.schematic
    }

    /// Fires a trigger against the instance.
    ///
    /// Loads the current record; rejects a stale `expected_commit_tag`
    /// before evaluating anything; looks up the transition (absence and a
    /// declining guard are one and the same
    /// [`MachineError::InvalidTransition`], indistinguishable by design);
    /// commits the resultant state through the repository's atomic CAS; then
    /// invokes the resultant state's entry connector best-effort. An entry
    /// action failure is logged and never rolls back the committed
    /// transition. No automatic retry on a concurrency conflict: the caller
    /// reloads and retries.
    pub async fn fire(
        &self,
        trigger: &Trigger,
        content_type: Option<&str>,
        payload: Option<&str>,
        expected_commit_tag: Option<Uuid>,
    ) -> Result<InstanceRecord, MachineError> {
        let record = self.repository.get_instance(&self.machine_id).await?;

        if let Some(expected) = expected_commit_tag {
            if expected != record.commit_tag {
                return Err(MachineError::ConcurrencyConflict {
                    machine_id: self.machine_id.clone(),
                });
            }
        }

        let configuration = self.state_configuration(&record)?;
        let transition = configuration.transition(trigger).ok_or_else(|| {
            MachineError::InvalidTransition {
                state: record.state.to_string(),
                trigger: trigger.to_string(),
            }
        })?;

        if let Some(guard) = transition.guard() {
            let connector = self.connectors.resolve(guard.connector_key())?;
            let permitted = connector
                .guard(
                    &record.state,
                    trigger,
                    payload,
                    content_type,
                    guard.configuration(),
                )
                .await?;
            if !permitted {
                return Err(MachineError::InvalidTransition {
                    state: record.state.to_string(),
                    trigger: trigger.to_string(),
                });
            }
        }

        // Resolve the entry connector before committing so an unresolvable
        // key surfaces as a pre-commit configuration error; invocation
        // happens only after the commit.
        let resultant = self
            .schematic
            .state(transition.resultant_state().as_str())
            .ok_or_else(|| MachineError::UnknownState {
                machine_id: self.machine_id.clone(),
                state: transition.resultant_state().to_string(),
            })?;
        let entry = match resultant.on_entry() {
            Some(descriptor) => Some((
                self.connectors.resolve(descriptor.connector_key())?,
                descriptor,
            )),
            None => None,
        };

        let committed = self
            .repository
            .commit_instance(
                &self.machine_id,
                transition.resultant_state().clone(),
                payload.map(str::to_string),
                content_type.map(str::to_string),
                record.commit_tag,
            )
            .await?;

        tracing::debug!(
            "machine {}: '{}' fired, {} -> {}",
            self.machine_id,
            trigger,
            record.state,
            committed.state
        );

        if let Some((connector, descriptor)) = entry {
            if let Err(err) = connector
                .on_entry(
                    &committed.state,
                    content_type,
                    payload,
                    descriptor.configuration(),
                )
                .await
            {
                tracing::warn!(
                    "machine {}: entry connector '{}' failed after commit to '{}': {}",
                    self.machine_id,
                    descriptor.connector_key(),
                    committed.state,
                    err
                );
            }
        }

        Ok(committed)
    }

    /// Loads the instance's current record.
    pub async fn current_record(&self) -> Result<InstanceRecord, MachineError> {
        self.repository.get_instance(&self.machine_id).await
    }

    /// Returns true if the current state equals `state` or has it on its
    /// parent-state chain. The parent link is lookup-only; transitions are
    /// never inherited through it.
    pub async fn is_in_state(&self, state: &State) -> Result<bool, MachineError> {
        let record = self.repository.get_instance(&self.machine_id).await?;
        Ok(self.schematic.is_in_state(&record.state, state))
    }

    /// Returns the triggers currently permitted from the instance's state:
    /// the state's transition keys, filtered through their guards.
    ///
    /// Every applicable guard is resolved and awaited in turn, so this is
    /// I/O-bound, not a cheap map lookup. Guards are queried with no
    /// payload. The result is sorted by trigger name.
    pub async fn permitted_triggers(&self) -> Result<Vec<Trigger>, MachineError> {
        let record = self.repository.get_instance(&self.machine_id).await?;
        let configuration = self.state_configuration(&record)?;

        let mut permitted = Vec::new();
        for transition in configuration.transitions() {
            match transition.guard() {
                None => permitted.push(transition.trigger().clone()),
                Some(guard) => {
                    let connector = self.connectors.resolve(guard.connector_key())?;
                    if connector
                        .guard(
                            &record.state,
                            transition.trigger(),
                            None,
                            None,
                            guard.configuration(),
                        )
                        .await?
                    {
                        permitted.push(transition.trigger().clone());
                    }
                }
            }
        }

        permitted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(permitted)
    }

    fn state_configuration(
        &self,
        record: &InstanceRecord,
    ) -> Result<&StateConfiguration, MachineError> {
        self.schematic
            .state(record.state.as_str())
            .ok_or_else(|| MachineError::UnknownState {
                machine_id: self.machine_id.clone(),
                state: record.state.to_string(),
            })
    }
}
