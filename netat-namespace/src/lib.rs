//! Network namespace confinement for individual OS threads
//!
//! This crate runs a closure with the calling OS thread temporarily inside
//! another network namespace, without moving the rest of the process:
//! - [`NamespaceExecutor`] - pin, switch, run, restore
//! - [`NamespaceBackend`] - the switch primitive (`setns(2)` or a mock)
//! - [`NetNs`] - owned namespace handles
//! - [`ThreadPin`] - scoped OS thread affinity

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod backend;
pub mod executor;
pub mod handle;
pub mod pin;

pub use backend::{LinuxBackend, MockBackend, MockCall, NamespaceBackend};
pub use executor::{run_in, NamespaceExecutor};
pub use handle::NetNs;
pub use pin::ThreadPin;

// Re-export commonly used types
pub use netat_core::{Error, ErrorKind, NamespaceId, Result, ThreadId};
