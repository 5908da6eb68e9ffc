//! In-memory repository.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use statecraft_core::{InstanceRecord, MachineError, Repository, Schematic, State};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory store for schematics and instance records.
///
/// Schematics are kept serialized, keyed by name; saving an identical name
/// is last-write-wins. Instance records live in a [`DashMap`]; the commit
/// compares and replaces under the shard's write guard, so racing commits
/// against one tag admit exactly one winner.
#[derive(Default)]
pub struct InMemoryRepository {
    schematics: RwLock<HashMap<String, String>>,
    instances: DashMap<String, InstanceRecord>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_schematic(&self, schematic_name: &str) -> Result<Schematic, MachineError> {
        let encoded = self
            .schematics
            .read()
            .get(schematic_name)
            .cloned()
            .ok_or_else(|| MachineError::SchematicNotFound {
                schematic: schematic_name.to_string(),
            })?;
        Ok(serde_json::from_str(&encoded)?)
    }

    async fn save_schematic(&self, schematic: &Schematic) -> Result<(), MachineError> {
        let encoded = serde_json::to_string(schematic)?;
        self.schematics
            .write()
            .insert(schematic.schematic_name().to_string(), encoded);
        Ok(())
    }

    async fn create_instance(&self, record: InstanceRecord) -> Result<InstanceRecord, MachineError> {
        match self.instances.entry(record.machine_id.clone()) {
            Entry::Occupied(_) => Err(MachineError::InstanceExists {
                machine_id: record.machine_id.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get_instance(&self, machine_id: &str) -> Result<InstanceRecord, MachineError> {
        self.instances
            .get(machine_id)
            .map(|record| record.clone())
            .ok_or_else(|| MachineError::InstanceNotFound {
                machine_id: machine_id.to_string(),
            })
    }

    async fn commit_instance(
        &self,
        machine_id: &str,
        new_state: State,
        payload: Option<String>,
        content_type: Option<String>,
        expected_commit_tag: Uuid,
    ) -> Result<InstanceRecord, MachineError> {
        // get_mut holds the shard's write guard for the whole
        // compare-and-replace, which is what makes this a CAS.
        let mut current =
            self.instances
                .get_mut(machine_id)
                .ok_or_else(|| MachineError::InstanceNotFound {
                    machine_id: machine_id.to_string(),
                })?;

        if current.commit_tag != expected_commit_tag {
            return Err(MachineError::ConcurrencyConflict {
                machine_id: machine_id.to_string(),
            });
        }

        let next = current.advanced(new_state, payload, content_type);
        *current = next.clone();
        Ok(next)
    }
}
