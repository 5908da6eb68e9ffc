//! Repository contract.

use crate::error::MachineError;
use crate::instance::InstanceRecord;
use crate::schematic::{Schematic, State};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable store for schematics and instance records.
///
/// The repository is the sole serialization point across callers and
/// processes: [`commit_instance`](Self::commit_instance) must be an atomic
/// compare-and-swap on the stored commit tag. The runtime never re-validates
/// the tag after issuing a commit, and holds no in-process lock over the
/// guard-evaluate-then-commit window.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Loads a schematic by name.
    async fn get_schematic(&self, schematic_name: &str) -> Result<Schematic, MachineError>;

    /// Persists a schematic under its name.
    async fn save_schematic(&self, schematic: &Schematic) -> Result<(), MachineError>;

    /// Stores the first record of a new instance; fails if the machine id
    /// already exists.
    async fn create_instance(&self, record: InstanceRecord) -> Result<InstanceRecord, MachineError>;

    /// Loads the current record of an instance.
    async fn get_instance(&self, machine_id: &str) -> Result<InstanceRecord, MachineError>;

    /// Atomically replaces the current record if its commit tag still equals
    /// `expected_commit_tag`, returning the successor record.
    ///
    /// A mismatched tag fails with
    /// [`MachineError::ConcurrencyConflict`]; exactly one of any set of
    /// racing commits against the same tag succeeds.
    async fn commit_instance(
        &self,
        machine_id: &str,
        new_state: State,
        payload: Option<String>,
        content_type: Option<String>,
        expected_commit_tag: Uuid,
    ) -> Result<InstanceRecord, MachineError>;
}
