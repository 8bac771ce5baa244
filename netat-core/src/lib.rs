//! netat Core - shared errors and identity types
//!
//! This crate provides the types used by the namespace executor and the
//! namespace-scoped network operations.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::{NamespaceId, ThreadId};
