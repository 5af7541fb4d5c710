//! Name Registry with Commit-Reveal Registration
//!
//! Lets any identity claim a unique human-readable name without being
//! front-run: a salted hash of the name is paid for first (`preorder`) and the
//! name itself is only revealed in a later `register` call. Registered names
//! carry an owner, an expiry, an optional resolver and key/value records.
//!
//! The clock, the payment ledger and caller authentication are collaborators
//! supplied by the host; see [`Clock`], [`Ledger`] and [`auth`].

pub mod auth;
pub mod clock;
pub mod commitment;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod locks;
pub mod registry;
pub mod store;
pub mod types;

pub use crate::config::RegistryConfig;
pub use clock::{Clock, ManualClock};
pub use commitment::compute_commitment;
pub use errors::*;
pub use ledger::{Ledger, MemoryLedger};
pub use registry::NameRegistry;
pub use store::{MemoryStore, Mutation, RegistryStore, SledStore, WriteBatch};
pub use types::*;
