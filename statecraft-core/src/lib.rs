//! # statecraft-core
//!
//! Schematic-driven state machine engine.
//!
//! This crate provides:
//! - A declarative builder compiling states, trigger-keyed transitions,
//!   guard predicates, and entry actions into an immutable [`Schematic`]
//! - A runtime applying one trigger at a time to a persisted instance under
//!   optimistic concurrency control
//! - The collaborator contracts the runtime consumes: [`Repository`]
//!   (durable store with atomic compare-and-swap commits) and
//!   [`Connector`]/[`ConnectorRegistry`] (pluggable guards and entry
//!   actions resolved by string key)
//! - A [`Cartographer`] for rendering schematics as directed graphs

pub mod builder;
pub mod connector;
pub mod engine;
pub mod error;
pub mod graph;
pub mod instance;
pub mod machine;
pub mod repository;
pub mod schematic;

pub use builder::{SchematicBuilder, StateBuilder};
pub use connector::{Connector, ConnectorRegistry};
pub use engine::StateEngine;
pub use error::{ConfigurationError, MachineError};
pub use graph::{Cartographer, DotGraphCartographer};
pub use instance::InstanceRecord;
pub use machine::StateMachine;
pub use repository::Repository;
pub use schematic::{ConnectorDescriptor, Schematic, State, StateConfiguration, Transition, Trigger};
