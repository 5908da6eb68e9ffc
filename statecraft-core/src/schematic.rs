//! Immutable schematic definition types.
//!
//! A schematic declares states, trigger-keyed transitions, and connector
//! descriptors. It is produced by [`SchematicBuilder`](crate::builder::SchematicBuilder)
//! (or deserialized from a repository) and is read-only for the life of the
//! process; the runtime only ever sees this frozen form.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A state name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for State {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named input event that may cause a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trigger(pub String);

impl Trigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Trigger {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Trigger {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for Trigger {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptor for a pluggable guard predicate or entry action.
///
/// The key identifies an external implementation in a
/// [`ConnectorRegistry`](crate::connector::ConnectorRegistry); the
/// configuration map is passed verbatim to the resolved connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDescriptor {
    connector_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    configuration: HashMap<String, String>,
}

impl ConnectorDescriptor {
    pub fn new(connector_key: impl Into<String>) -> Self {
        Self {
            connector_key: connector_key.into(),
            description: None,
            configuration: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a configuration option handed to the connector on construction.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(name.into(), value.into());
        self
    }

    pub fn connector_key(&self) -> &str {
        &self.connector_key
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn configuration(&self) -> &HashMap<String, String> {
        &self.configuration
    }
}

/// A declared edge: trigger, resultant state, optional guard.
///
/// No guard means the transition is unconditionally permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    trigger: Trigger,
    resultant_state: State,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    guard: Option<ConnectorDescriptor>,
}

impl Transition {
    pub(crate) fn new(trigger: Trigger, resultant_state: State, guard: Option<ConnectorDescriptor>) -> Self {
        Self {
            trigger,
            resultant_state,
            guard,
        }
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn resultant_state(&self) -> &State {
        &self.resultant_state
    }

    pub fn guard(&self) -> Option<&ConnectorDescriptor> {
        self.guard.as_ref()
    }
}

/// Frozen configuration of a single state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfiguration {
    state_name: State,

    /// Lookup link for ancestor queries only; transitions are never inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_state_name: Option<State>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default)]
    transitions: HashMap<Trigger, Transition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_entry: Option<ConnectorDescriptor>,
}

impl StateConfiguration {
    pub(crate) fn new(
        state_name: State,
        parent_state_name: Option<State>,
        description: Option<String>,
        transitions: HashMap<Trigger, Transition>,
        on_entry: Option<ConnectorDescriptor>,
    ) -> Self {
        Self {
            state_name,
            parent_state_name,
            description,
            transitions,
            on_entry,
        }
    }

    pub fn state_name(&self) -> &State {
        &self.state_name
    }

    pub fn parent_state_name(&self) -> Option<&State> {
        self.parent_state_name.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Looks up the transition keyed by the given trigger.
    pub fn transition(&self, trigger: &Trigger) -> Option<&Transition> {
        self.transitions.get(trigger)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn on_entry(&self) -> Option<&ConnectorDescriptor> {
        self.on_entry.as_ref()
    }
}

/// Immutable declarative definition of a state machine.
///
/// Invariants (enforced by the builder and re-checked by [`validate`](Self::validate)
/// for deserialized schematics): the initial state is declared, every
/// transition's resultant state is declared, and trigger names are unique
/// per state by construction of the transition map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schematic {
    schematic_name: String,
    initial_state: State,
    states: HashMap<State, StateConfiguration>,
}

impl Schematic {
    pub(crate) fn new(
        schematic_name: String,
        initial_state: State,
        states: HashMap<State, StateConfiguration>,
    ) -> Self {
        Self {
            schematic_name,
            initial_state,
            states,
        }
    }

    pub fn schematic_name(&self) -> &str {
        &self.schematic_name
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    /// Looks up a state's configuration by name.
    pub fn state(&self, name: &str) -> Option<&StateConfiguration> {
        self.states.get(name)
    }

    pub fn states(&self) -> impl Iterator<Item = &StateConfiguration> {
        self.states.values()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Checks the structural invariants.
    ///
    /// Builder output always passes; this exists so schematics coming back
    /// from a repository get the same guarantees before the runtime uses
    /// them.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.states.contains_key(self.initial_state.as_str()) {
            return Err(ConfigurationError::UnknownInitialState {
                schematic: self.schematic_name.clone(),
                state: self.initial_state.to_string(),
            });
        }

        for (name, config) in &self.states {
            if name.as_str().trim().is_empty()
                || config.state_name().as_str().trim().is_empty()
            {
                return Err(ConfigurationError::BlankStateName);
            }

            if let Some(parent) = config.parent_state_name() {
                if !self.states.contains_key(parent.as_str()) {
                    return Err(ConfigurationError::UnknownParentState {
                        state: config.state_name().to_string(),
                        parent: parent.to_string(),
                    });
                }
            }

            for transition in config.transitions() {
                if transition.trigger().as_str().trim().is_empty() {
                    return Err(ConfigurationError::BlankTriggerName {
                        state: config.state_name().to_string(),
                    });
                }
                if !self.states.contains_key(transition.resultant_state().as_str()) {
                    return Err(ConfigurationError::UnknownResultantState {
                        state: config.state_name().to_string(),
                        trigger: transition.trigger().to_string(),
                        resultant: transition.resultant_state().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns true if `query` equals `current` or is an ancestor of it.
    ///
    /// Walks the parent-state chain from `current`; the walk is cycle-safe.
    pub fn is_in_state(&self, current: &State, query: &State) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cursor = Some(current.as_str());

        while let Some(name) = cursor {
            if name == query.as_str() {
                return true;
            }
            if !seen.insert(name) {
                return false;
            }
            cursor = self
                .state(name)
                .and_then(|config| config.parent_state_name())
                .map(State::as_str);
        }

        false
    }
}
