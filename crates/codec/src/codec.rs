//! The [`Codec`] trait and its mapping adapters.

use std::sync::Arc;

use crate::collections::{ListOf, SetOf};
use crate::{DecodeError, DecodeResult, EncodeError, Value};

/// A two-way strategy between a typed value and a [`Value`] tree.
///
/// Codecs are stateless descriptions and are shared freely across threads.
pub trait Codec: Send + Sync {
	/// Decoded type.
	type Target;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError>;

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target>;
}

/// Type-erased, shareable codec.
pub type BoxCodec<T> = Arc<dyn Codec<Target = T>>;

impl<C: Codec + ?Sized> Codec for Arc<C> {
	type Target = C::Target;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		(**self).encode(value)
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		(**self).decode(input)
	}
}

impl<C: Codec + ?Sized> Codec for &C {
	type Target = C::Target;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		(**self).encode(value)
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		(**self).decode(input)
	}
}

/// Adapters available on every sized codec.
pub trait CodecExt: Codec + Sized {
	/// Maps through a bijection.
	fn xmap<U, F, G>(self, to: F, from: G) -> XMap<Self, F, G>
	where
		F: Fn(Self::Target) -> U + Send + Sync,
		G: Fn(&U) -> Self::Target + Send + Sync,
	{
		XMap { inner: self, to, from }
	}

	/// Maps through conversions that may fail in either direction.
	fn flat_xmap<U, F, G>(self, to: F, from: G) -> FlatXMap<Self, F, G>
	where
		F: Fn(Self::Target) -> Result<U, String> + Send + Sync,
		G: Fn(&U) -> Result<Self::Target, String> + Send + Sync,
	{
		FlatXMap { inner: self, to, from }
	}

	/// Strict list of this codec's values.
	fn list_of(self) -> ListOf<Self> {
		ListOf::new(self)
	}

	/// Lenient set of this codec's values; see [`crate::set_of`].
	fn set_of(self) -> SetOf<Self> {
		SetOf::new(self)
	}

	fn boxed(self) -> BoxCodec<Self::Target>
	where
		Self: 'static,
	{
		Arc::new(self)
	}
}

impl<C: Codec + Sized> CodecExt for C {}

/// Codec produced by [`CodecExt::xmap`].
pub struct XMap<C, F, G> {
	inner: C,
	to: F,
	from: G,
}

impl<C, F, G, U> Codec for XMap<C, F, G>
where
	C: Codec,
	F: Fn(C::Target) -> U + Send + Sync,
	G: Fn(&U) -> C::Target + Send + Sync,
{
	type Target = U;

	fn encode(&self, value: &U) -> Result<Value, EncodeError> {
		self.inner.encode(&(self.from)(value))
	}

	fn decode(&self, input: &Value) -> DecodeResult<U> {
		Ok(self.inner.decode(input)?.map(&self.to))
	}
}

/// Codec produced by [`CodecExt::flat_xmap`].
pub struct FlatXMap<C, F, G> {
	inner: C,
	to: F,
	from: G,
}

impl<C, F, G, U> Codec for FlatXMap<C, F, G>
where
	C: Codec,
	F: Fn(C::Target) -> Result<U, String> + Send + Sync,
	G: Fn(&U) -> Result<C::Target, String> + Send + Sync,
{
	type Target = U;

	fn encode(&self, value: &U) -> Result<Value, EncodeError> {
		let raw = (self.from)(value).map_err(EncodeError::new)?;
		self.inner.encode(&raw)
	}

	fn decode(&self, input: &Value) -> DecodeResult<U> {
		let decoded = self.inner.decode(input)?;
		let failures = decoded.failures;
		let value = (self.to)(decoded.value).map_err(DecodeError::new)?;
		Ok(crate::Decoded::partial(value, failures))
	}
}

/// Encodes then decodes `value`, producing an independent copy.
///
/// Fails if the codec cannot reproduce the value without skipping anything.
pub fn copy_via<C: Codec>(codec: &C, value: &C::Target) -> Result<C::Target, DecodeError> {
	let encoded = codec
		.encode(value)
		.map_err(|e| DecodeError::new(format!("encode failed during copy: {e}")))?;
	codec.decode(&encoded)?.strict()
}
