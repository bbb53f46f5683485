//! cw-calls
//!
//! Wires the pure reconciler to a call store.
//!
//! This crate owns the store abstraction ([`CallStore`]) and the service the
//! transport boundary calls ([`CallService`]). It ships one concrete store,
//! [`InMemoryCallStore`]; the Postgres store lives in `cw-db`.

pub mod memory;
pub mod service;
pub mod store;

pub use memory::InMemoryCallStore;
pub use service::{CallService, MetricsWindows, SubmitError};
pub use store::{CallStore, CloseOutcome, CreateOutcome, StoreError};
