//! Post-decode validation stage.

use crate::Candidate;

/// The candidate generation broke an invariant and must not be published.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationError {
	pub reason: String,
}

impl ValidationError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}

/// Inspects a fully decoded candidate before it is published.
///
/// Runs once per reload, after every document has been decoded. The
/// returned candidate is what gets published, so a validator may prune
/// entries (for example dangling cross references) instead of rejecting.
pub trait Validator<T>: Send + Sync {
	fn validate(&self, candidate: Candidate<T>) -> Result<Candidate<T>, ValidationError>;
}

impl<T, F> Validator<T> for F
where
	F: Fn(Candidate<T>) -> Result<Candidate<T>, ValidationError> + Send + Sync,
{
	fn validate(&self, candidate: Candidate<T>) -> Result<Candidate<T>, ValidationError> {
		self(candidate)
	}
}

/// Accepts every candidate unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<T> Validator<T> for AcceptAll {
	fn validate(&self, candidate: Candidate<T>) -> Result<Candidate<T>, ValidationError> {
		Ok(candidate)
	}
}
