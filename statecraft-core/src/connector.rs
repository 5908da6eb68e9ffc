//! Connector contracts and the capability-keyed registry.
//!
//! A connector is an external implementation of a guard predicate and/or an
//! entry action, looked up by string key. Resolution failure is a
//! configuration error, deliberately distinct from a guard evaluating false.

use crate::error::{ConfigurationError, MachineError};
use crate::schematic::{State, Trigger};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A pluggable guard predicate and/or entry action.
///
/// Both roles default to a "role not provided" configuration error, so an
/// implementation overrides only what it supports. Each invocation receives
/// the descriptor's configuration map verbatim, and may block or suspend on
/// I/O; the runtime awaits connectors strictly in order within one fire.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The key this connector is registered and resolved under.
    fn key(&self) -> &str;

    /// Guard predicate: whether the transition is currently permitted.
    async fn guard(
        &self,
        state: &State,
        trigger: &Trigger,
        payload: Option<&str>,
        content_type: Option<&str>,
        configuration: &HashMap<String, String>,
    ) -> Result<bool, MachineError> {
        let _ = (state, trigger, payload, content_type, configuration);
        Err(ConfigurationError::ConnectorRoleMissing {
            key: self.key().to_string(),
            role: "a guard predicate",
        }
        .into())
    }

    /// Entry action invoked after a transition into a state commits.
    async fn on_entry(
        &self,
        state: &State,
        content_type: Option<&str>,
        payload: Option<&str>,
        configuration: &HashMap<String, String>,
    ) -> Result<(), MachineError> {
        let _ = (state, content_type, payload, configuration);
        Err(ConfigurationError::ConnectorRoleMissing {
            key: self.key().to_string(),
            role: "an entry action",
        }
        .into())
    }
}

/// Registry resolving a connector key to its implementation.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector under its own key. A later registration with
    /// the same key replaces the earlier one.
    pub fn register(&mut self, connector: Arc<dyn Connector>) -> &mut Self {
        self.connectors
            .insert(connector.key().to_string(), connector);
        self
    }

    /// Resolves a connector key.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Connector>, ConfigurationError> {
        self.connectors
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownConnector {
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GuardOnly;

    #[async_trait]
    impl Connector for GuardOnly {
        fn key(&self) -> &str {
            "guard-only"
        }

        async fn guard(
            &self,
            _state: &State,
            _trigger: &Trigger,
            _payload: Option<&str>,
            _content_type: Option<&str>,
            configuration: &HashMap<String, String>,
        ) -> Result<bool, MachineError> {
            Ok(configuration.get("permit").map(String::as_str) == Some("true"))
        }
    }

    #[tokio::test]
    async fn test_resolve_and_evaluate() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(GuardOnly));

        let connector = registry.resolve("guard-only").unwrap();
        let mut configuration = HashMap::new();
        configuration.insert("permit".to_string(), "true".to_string());

        let permitted = connector
            .guard(
                &State::from("A"),
                &Trigger::from("go"),
                None,
                None,
                &configuration,
            )
            .await
            .unwrap();
        assert!(permitted);
    }

    #[test]
    fn test_unknown_key_is_configuration_error() {
        let registry = ConnectorRegistry::new();
        let err = registry.resolve("missing").err().unwrap();
        assert!(matches!(
            err,
            ConfigurationError::UnknownConnector { key } if key == "missing"
        ));
    }

    #[tokio::test]
    async fn test_missing_role_is_distinct_from_guard_false() {
        let connector = GuardOnly;
        let err = connector
            .on_entry(&State::from("A"), None, None, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MachineError::Configuration(ConfigurationError::ConnectorRoleMissing { .. })
        ));
    }
}
