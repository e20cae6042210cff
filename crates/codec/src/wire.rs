//! Binary payloads built from a [`Codec`].
//!
//! The codec turns a value into a [`Value`] tree, and postcard writes the
//! tree. Integer widths chosen by the codec survive the trip.

use bytes::Bytes;

use crate::{Codec, DecodeError, EncodeError, Value};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
	#[error("encode failed: {0}")]
	Encode(#[from] EncodeError),
	#[error("decode failed: {0}")]
	Decode(#[from] DecodeError),
	#[error("malformed payload: {0}")]
	Postcard(#[from] postcard::Error),
}

/// Writes and reads one value as a self-contained binary payload.
#[derive(Debug, Clone)]
pub struct WireCodec<C> {
	codec: C,
}

impl<C: Codec> WireCodec<C> {
	pub fn new(codec: C) -> Self {
		Self { codec }
	}

	pub fn codec(&self) -> &C {
		&self.codec
	}

	pub fn write(&self, value: &C::Target) -> Result<Bytes, WireError> {
		let tree = self.codec.encode(value)?;
		Ok(Bytes::from(write_value(&tree)?))
	}

	/// Reads a payload. Any element the codec would skip is an error.
	pub fn read(&self, payload: &[u8]) -> Result<C::Target, WireError> {
		let tree = read_value(payload)?;
		Ok(self.codec.decode(&tree)?.strict()?)
	}

	/// Produces an independent copy by writing then reading `value`.
	pub fn copy(&self, value: &C::Target) -> Result<C::Target, WireError> {
		self.read(&self.write(value)?)
	}
}

pub fn write_value(value: &Value) -> Result<Vec<u8>, postcard::Error> {
	postcard::to_stdvec(value)
}

pub fn read_value(payload: &[u8]) -> Result<Value, postcard::Error> {
	postcard::from_bytes(payload)
}
