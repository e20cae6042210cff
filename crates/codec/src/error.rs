//! Decode/encode errors and lenient decode results.

use crate::Value;

const ROOT: &str = "$";

/// A value failed to decode.
///
/// `path` locates the failure inside the input, rooted at `$`
/// (for example `$[2].name`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {reason}")]
pub struct DecodeError {
	pub path: String,
	pub reason: String,
}

/// A value failed to encode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {reason}")]
pub struct EncodeError {
	pub path: String,
	pub reason: String,
}

macro_rules! path_builders {
	($ty:ident) => {
		impl $ty {
			/// Creates an error at the root of the input.
			pub fn new(reason: impl Into<String>) -> Self {
				Self {
					path: ROOT.to_string(),
					reason: reason.into(),
				}
			}

			/// Nests this error under list index `index`.
			pub fn at_index(mut self, index: usize) -> Self {
				self.path = format!("{ROOT}[{index}]{}", self.path.strip_prefix(ROOT).unwrap_or(&self.path));
				self
			}

			/// Nests this error under map key `key`.
			pub fn at_key(mut self, key: &str) -> Self {
				self.path = format!("{ROOT}.{key}{}", self.path.strip_prefix(ROOT).unwrap_or(&self.path));
				self
			}
		}
	};
}

path_builders!(DecodeError);
path_builders!(EncodeError);

impl DecodeError {
	/// Error for an input of the wrong shape.
	pub fn expected(what: &str, found: &Value) -> Self {
		Self::new(format!("expected {what}, found {}", found.kind()))
	}
}

/// One element dropped by a lenient decode, with the raw input it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
	pub input: Value,
	pub error: DecodeError,
}

/// A successful decode, possibly missing elements that failed individually.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
	pub value: T,
	pub failures: Vec<Failure>,
}

impl<T> Decoded<T> {
	/// A decode with nothing skipped.
	pub fn complete(value: T) -> Self {
		Self {
			value,
			failures: Vec::new(),
		}
	}

	pub fn partial(value: T, failures: Vec<Failure>) -> Self {
		Self { value, failures }
	}

	/// True when at least one element was skipped.
	pub fn is_partial(&self) -> bool {
		!self.failures.is_empty()
	}

	/// Keeps whatever decoded and discards the failure record.
	pub fn into_value(self) -> T {
		self.value
	}

	/// Rejects partial results, surfacing the first skipped element.
	pub fn strict(self) -> Result<T, DecodeError> {
		match self.failures.into_iter().next() {
			Some(failure) => Err(failure.error),
			None => Ok(self.value),
		}
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
		Decoded {
			value: f(self.value),
			failures: self.failures,
		}
	}
}

/// Outcome of [`crate::Codec::decode`].
pub type DecodeResult<T> = Result<Decoded<T>, DecodeError>;

/// Re-roots the failures of a nested decode under `index`.
pub(crate) fn nest_failures_at_index(failures: Vec<Failure>, index: usize) -> impl Iterator<Item = Failure> {
	failures.into_iter().map(move |f| Failure {
		input: f.input,
		error: f.error.at_index(index),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_nest_outside_in() {
		let err = DecodeError::new("bad").at_key("name").at_index(2);
		assert_eq!(err.path, "$[2].name");
		assert_eq!(err.to_string(), "$[2].name: bad");
	}

	#[test]
	fn strict_surfaces_first_failure() {
		let decoded = Decoded::partial(
			vec![1],
			vec![Failure {
				input: Value::Null,
				error: DecodeError::new("first").at_index(1),
			}],
		);
		assert!(decoded.is_partial());
		assert_eq!(decoded.strict().unwrap_err().path, "$[1]");
		assert_eq!(Decoded::complete(5).strict(), Ok(5));
	}
}
