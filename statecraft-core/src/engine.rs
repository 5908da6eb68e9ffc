//! State engine - instantiates machines and reloads handles from storage.

use crate::connector::ConnectorRegistry;
use crate::error::MachineError;
use crate::instance::InstanceRecord;
use crate::machine::StateMachine;
use crate::repository::Repository;
use crate::schematic::Schematic;
use std::sync::Arc;
use uuid::Uuid;

/// Entry point tying a repository and a connector registry together.
///
/// The engine hands out [`StateMachine`] handles; the schematic inside a
/// handle is read-only and safely shared across concurrent machines.
pub struct StateEngine {
    repository: Arc<dyn Repository>,
    connectors: Arc<ConnectorRegistry>,
}

impl StateEngine {
    pub fn new(repository: Arc<dyn Repository>, connectors: Arc<ConnectorRegistry>) -> Self {
        Self {
            repository,
            connectors,
        }
    }

    /// Creates a new machine instance at the schematic's initial state.
    ///
    /// The schematic is validated, the instance record is created, then the
    /// schematic is persisted; a missing `machine_id` is filled with a
    /// fresh UUID. Fails with [`MachineError::InstanceExists`] if the id is
    /// already taken, in which case the repository is left untouched.
    pub async fn instantiate_machine(
        &self,
        schematic: Schematic,
        machine_id: Option<&str>,
    ) -> Result<StateMachine, MachineError> {
        schematic.validate()?;

        let machine_id = machine_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = InstanceRecord::new(
            &machine_id,
            schematic.schematic_name(),
            schematic.initial_state().clone(),
        );
        // Instance first: a rejected duplicate id must not overwrite a
        // stored schematic of the same name.
        let record = self.repository.create_instance(record).await?;
        self.repository.save_schematic(&schematic).await?;

        tracing::info!(
            "instantiated machine {} from schematic '{}' at state '{}'",
            machine_id,
            schematic.schematic_name(),
            record.state
        );

        Ok(StateMachine::new(
            machine_id,
            Arc::new(schematic),
            self.repository.clone(),
            self.connectors.clone(),
        ))
    }

    /// Reloads a handle for an existing instance from its stored record and
    /// schematic.
    pub async fn get_machine(&self, machine_id: &str) -> Result<StateMachine, MachineError> {
        let record = self.repository.get_instance(machine_id).await?;
        let schematic = self.repository.get_schematic(&record.schematic_name).await?;
        schematic.validate()?;

        Ok(StateMachine::new(
            record.machine_id,
            Arc::new(schematic),
            self.repository.clone(),
            self.connectors.clone(),
        ))
    }

    /// Loads a stored schematic, e.g. for diagnostics or map rendering.
    pub async fn get_schematic(&self, schematic_name: &str) -> Result<Schematic, MachineError> {
        self.repository.get_schematic(schematic_name).await
    }
}
