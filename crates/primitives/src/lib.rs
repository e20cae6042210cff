//! Core identifier type used to address documents, decoded values and stores.

/// Namespaced `namespace:path` identifiers.
pub mod identifier;

pub use identifier::{DEFAULT_NAMESPACE, Identifier, IdentifierError};
