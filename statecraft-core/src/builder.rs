//! Mutable builder that compiles declarative state definitions into an
//! immutable [`Schematic`].
//!
//! The builder is the only sanctioned way to author a schematic in code.
//! Trigger collisions and blank names fail at the call site; single-initial-
//! state and resultant-state existence are checked when the accumulated
//! configuration is frozen by [`SchematicBuilder::into_schematic`]. The
//! mutable intermediate types never reach the runtime.

use crate::error::ConfigurationError;
use crate::schematic::{ConnectorDescriptor, Schematic, State, StateConfiguration, Transition, Trigger};
use std::collections::{BTreeMap, HashMap};

/// Accumulates state declarations for one schematic.
#[derive(Debug)]
pub struct SchematicBuilder {
    schematic_name: String,
    // BTreeMap so build-time validation reports violations in a stable order.
    states: BTreeMap<String, StateBuilder>,
}

impl SchematicBuilder {
    pub fn new(schematic_name: impl Into<String>) -> Self {
        Self {
            schematic_name: schematic_name.into(),
            states: BTreeMap::new(),
        }
    }

    /// Returns the mutable configuration for `name`, declaring the state if
    /// it has not been seen yet.
    pub fn state(&mut self, name: &str) -> Result<&mut StateBuilder, ConfigurationError> {
        self.state_owned(name.to_string())
    }

    /// Applies one configuration closure across many state names.
    ///
    /// This is the bulk path for large generated state spaces (for example a
    /// coordinate-by-heading grid); each state's transition insertions stay
    /// O(1) amortized through the trigger-keyed map.
    pub fn with_states<I, S, F>(
        &mut self,
        names: I,
        mut configure: F,
    ) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&mut StateBuilder) -> Result<(), ConfigurationError>,
    {
        for name in names {
            let state = self.state_owned(name.into())?;
            configure(state)?;
        }
        Ok(self)
    }

    /// Snapshots the accumulated configuration into an immutable
    /// [`Schematic`], validating the whole definition.
    ///
    /// Fails, naming the offending state or trigger, on: zero initial-state
    /// marks, more than one mark (no silent last-wins), a transition whose
    /// resultant state was never declared, or a dangling parent reference.
    pub fn into_schematic(self) -> Result<Schematic, ConfigurationError> {
        let mut initial: Option<String> = None;
        for (name, state) in &self.states {
            if state.initial {
                match &initial {
                    None => initial = Some(name.clone()),
                    Some(first) => {
                        return Err(ConfigurationError::MultipleInitialStates {
                            schematic: self.schematic_name.clone(),
                            first: first.clone(),
                            second: name.clone(),
                        })
                    }
                }
            }
        }
        let initial = initial.ok_or(ConfigurationError::NoInitialState {
            schematic: self.schematic_name.clone(),
        })?;

        let states: HashMap<State, StateConfiguration> = self
            .states
            .into_iter()
            .map(|(name, state)| (State::from(name), state.into_configuration()))
            .collect();

        let schematic = Schematic::new(self.schematic_name, State::from(initial), states);
        schematic.validate()?;
        Ok(schematic)
    }

    fn state_owned(&mut self, name: String) -> Result<&mut StateBuilder, ConfigurationError> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::BlankStateName);
        }
        Ok(self
            .states
            .entry(name.clone())
            .or_insert_with(|| StateBuilder::new(State::from(name))))
    }
}

/// Mutable configuration of a single state.
#[derive(Debug)]
pub struct StateBuilder {
    state_name: State,
    initial: bool,
    parent_state_name: Option<State>,
    description: Option<String>,
    transitions: HashMap<Trigger, Transition>,
    on_entry: Option<ConnectorDescriptor>,
}

impl StateBuilder {
    fn new(state_name: State) -> Self {
        Self {
            state_name,
            initial: false,
            parent_state_name: None,
            description: None,
            transitions: HashMap::new(),
            on_entry: None,
        }
    }

    pub fn state_name(&self) -> &State {
        &self.state_name
    }

    /// Marks this state as the schematic's initial state.
    ///
    /// More than one mark across the schematic fails the build; the
    /// violation surfaces from [`SchematicBuilder::into_schematic`].
    pub fn as_initial_state(&mut self) -> &mut Self {
        self.initial = true;
        self
    }

    /// Links a parent state for ancestor queries. Transitions are never
    /// inherited through this link.
    pub fn with_parent(&mut self, parent_state_name: &str) -> &mut Self {
        self.parent_state_name = Some(State::from(parent_state_name));
        self
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a transition keyed by `trigger_name`.
    ///
    /// Fails immediately on a blank trigger or resultant name, or if a
    /// transition already exists under that trigger for this state.
    pub fn with_transition(
        &mut self,
        trigger_name: &str,
        resultant_state_name: &str,
        guard: Option<ConnectorDescriptor>,
    ) -> Result<&mut Self, ConfigurationError> {
        if trigger_name.trim().is_empty() {
            return Err(ConfigurationError::BlankTriggerName {
                state: self.state_name.to_string(),
            });
        }
        if resultant_state_name.trim().is_empty() {
            return Err(ConfigurationError::BlankResultantState {
                state: self.state_name.to_string(),
                trigger: trigger_name.to_string(),
            });
        }

        let trigger = Trigger::from(trigger_name);
        if self.transitions.contains_key(&trigger) {
            return Err(ConfigurationError::DuplicateTrigger {
                state: self.state_name.to_string(),
                trigger: trigger_name.to_string(),
            });
        }

        let transition = Transition::new(
            trigger.clone(),
            State::from(resultant_state_name),
            guard,
        );
        self.transitions.insert(trigger, transition);
        Ok(self)
    }

    /// Attaches an entry-action descriptor invoked when this state is
    /// entered.
    pub fn with_entry_connector(&mut self, descriptor: ConnectorDescriptor) -> &mut Self {
        self.on_entry = Some(descriptor);
        self
    }

    fn into_configuration(self) -> StateConfiguration {
        StateConfiguration::new(
            self.state_name,
            self.parent_state_name,
            self.description,
            self.transitions,
            self.on_entry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_build_two_state_schematic() {
        let mut builder = SchematicBuilder::new("toggle");
        builder
            .state("A")
            .unwrap()
            .as_initial_state()
            .with_transition("go", "B", None)
            .unwrap();
        builder
            .state("B")
            .unwrap()
            .with_transition("go", "A", None)
            .unwrap();

        let schematic = builder.into_schematic().unwrap();
        assert_eq!(schematic.schematic_name(), "toggle");
        assert_eq!(schematic.initial_state().as_str(), "A");
        assert_eq!(schematic.state_count(), 2);
    }

    #[test]
    fn test_duplicate_trigger_conflicts() {
        let mut builder = SchematicBuilder::new("dup");
        let state = builder.state("A").unwrap();
        state.with_transition("go", "A", None).unwrap();

        let err = state.with_transition("go", "A", None).unwrap_err();
        match err {
            ConfigurationError::DuplicateTrigger { state, trigger } => {
                assert_eq!(state, "A");
                assert_eq!(trigger, "go");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_trigger_rejected() {
        let mut builder = SchematicBuilder::new("blank");
        let err = builder
            .state("A")
            .unwrap()
            .with_transition("  ", "A", None)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::BlankTriggerName { .. }));
    }

    #[test]
    fn test_blank_state_name_rejected() {
        let mut builder = SchematicBuilder::new("blank");
        assert!(matches!(
            builder.state("   "),
            Err(ConfigurationError::BlankStateName)
        ));
    }

    #[test]
    fn test_two_initial_states_fail_build() {
        let mut builder = SchematicBuilder::new("twin");
        builder.state("A").unwrap().as_initial_state();
        builder.state("B").unwrap().as_initial_state();

        let err = builder.into_schematic().unwrap_err();
        match err {
            ConfigurationError::MultipleInitialStates { first, second, .. } => {
                assert_eq!(first, "A");
                assert_eq!(second, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_initial_state_fails_build() {
        let mut builder = SchematicBuilder::new("adrift");
        builder.state("A").unwrap();

        let err = builder.into_schematic().unwrap_err();
        assert!(matches!(err, ConfigurationError::NoInitialState { .. }));
    }

    #[test]
    fn test_dangling_resultant_state_named_in_error() {
        let mut builder = SchematicBuilder::new("dangling");
        builder
            .state("A")
            .unwrap()
            .as_initial_state()
            .with_transition("go", "nowhere", None)
            .unwrap();

        let err = builder.into_schematic().unwrap_err();
        match err {
            ConfigurationError::UnknownResultantState {
                state,
                trigger,
                resultant,
            } => {
                assert_eq!(state, "A");
                assert_eq!(trigger, "go");
                assert_eq!(resultant, "nowhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_with_states_bulk_configuration() {
        // A 10x10 coordinate grid where every cell steps east until the edge.
        let names: Vec<String> = (0..10)
            .flat_map(|x| (0..10).map(move |y| format!("{x},{y}")))
            .collect();

        let mut builder = SchematicBuilder::new("grid");
        builder
            .with_states(names, |state| {
                let (x, y) = state
                    .state_name()
                    .as_str()
                    .split_once(',')
                    .map(|(x, y)| (x.parse::<i32>().unwrap(), y.parse::<i32>().unwrap()))
                    .unwrap();

                if x == 0 && y == 0 {
                    state.as_initial_state();
                }
                if x < 9 {
                    state.with_transition("east", &format!("{},{}", x + 1, y), None)?;
                }
                Ok(())
            })
            .unwrap();

        let schematic = builder.into_schematic().unwrap();
        assert_eq!(schematic.state_count(), 100);
        assert!(schematic
            .state("3,4")
            .unwrap()
            .transition(&Trigger::from("east"))
            .is_some());
        assert!(schematic
            .state("9,4")
            .unwrap()
            .transition(&Trigger::from("east"))
            .is_none());
    }

    proptest! {
        // Rings of any size build cleanly: every state gets exactly one
        // "next" transition and the whole definition validates.
        #[test]
        fn ring_schematics_always_validate(n in 2usize..40) {
            let names: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();

            let mut builder = SchematicBuilder::new("ring");
            builder
                .with_states(names, |state| {
                    let index: usize = state.state_name().as_str()[1..].parse().unwrap();
                    if index == 0 {
                        state.as_initial_state();
                    }
                    state.with_transition("next", &format!("s{}", (index + 1) % n), None)?;
                    Ok(())
                })
                .unwrap();

            let schematic = builder.into_schematic().unwrap();
            prop_assert_eq!(schematic.state_count(), n);
            for config in schematic.states() {
                prop_assert_eq!(config.transitions().count(), 1);
            }
        }
    }
}
