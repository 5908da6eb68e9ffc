//! # statecraft-inmemory
//!
//! In-memory [`Repository`](statecraft_core::Repository) implementation.
//!
//! The reference implementation of the compare-and-swap commit contract and
//! the substrate for the runtime's integration tests. Schematics are stored
//! serialized, the way a durable backend would hold them; instance records
//! live in a sharded map whose per-key exclusive guard makes the commit a
//! true CAS.

mod repository;

pub use repository::InMemoryRepository;
