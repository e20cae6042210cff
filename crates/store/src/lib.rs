//! Reloadable keyed data stores.
//!
//! # Purpose
//!
//! A [`DataStore<T>`] maps [`Identifier`](codeclib_primitives::Identifier)s to
//! decoded values loaded from one resource folder. Every reload builds a new
//! [`Generation`] off to the side and publishes it with a single atomic swap.
//!
//! # Mental Model
//!
//! ```text
//! ResourceSupplier::collect(folder)
//!     -> decode each document (failures logged and reported, entry dropped)
//!     -> Candidate<T>
//!     -> Validator::validate
//!     -> publish Generation<T>   (or keep the previous one on rejection)
//! ```
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`DataStore`] | Owner of the published generation and the reload pipeline. |
//! | [`Generation`] | Immutable snapshot readers hold on to. |
//! | [`Candidate`] | Owned draft passed through the validator. |
//! | [`ResourceSupplier`] | Where raw JSON documents come from. |
//! | [`StoreConfig`] | Folder and rejection policy, loadable from TOML. |

mod config;
mod error;
mod generation;
mod store;
mod supplier;
mod validate;

pub use config::{RejectionPolicy, StoreConfig};
pub use error::{ConfigError, StoreError, SupplierError};
pub use generation::{Candidate, Generation};
pub use store::{DataStore, DataStoreBuilder, ReloadOutcome, ReloadReport, Replaced, StoreState};
pub use supplier::{Collected, DirectorySupplier, Documents, MemorySupplier, ResourceSupplier};
pub use validate::{AcceptAll, ValidationError, Validator};
