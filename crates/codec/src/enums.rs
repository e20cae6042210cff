//! Codecs for closed sets of unit variants.

use strum::VariantArray;

use crate::{Codec, DecodeError, DecodeResult, Decoded, EncodeError, Value};

/// Fixed integer width used by [`IntEnumCodec`].
///
/// Derived from the variant count alone, so both ends of a channel agree on
/// it without exchanging anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumWidth {
	Byte,
	Short,
	Int,
}

impl EnumWidth {
	/// Smallest width whose signed range holds every index below `count`.
	pub fn for_count(count: usize) -> Self {
		if count <= i8::MAX as usize {
			EnumWidth::Byte
		} else if count <= i16::MAX as usize {
			EnumWidth::Short
		} else {
			EnumWidth::Int
		}
	}

	pub fn bytes(self) -> usize {
		match self {
			EnumWidth::Byte => 1,
			EnumWidth::Short => 2,
			EnumWidth::Int => 4,
		}
	}

	fn write(self, index: usize) -> Result<Value, EncodeError> {
		let out_of_range = || EncodeError::new(format!("index {index} exceeds {self:?} width"));
		Ok(match self {
			EnumWidth::Byte => Value::Byte(i8::try_from(index).map_err(|_| out_of_range())?),
			EnumWidth::Short => Value::Short(i16::try_from(index).map_err(|_| out_of_range())?),
			EnumWidth::Int => Value::Int(i32::try_from(index).map_err(|_| out_of_range())?),
		})
	}

	/// Reads an index written at this width. `Long` is accepted as the
	/// untyped number produced by text formats.
	fn read(self, input: &Value) -> Result<i64, DecodeError> {
		match (self, input) {
			(EnumWidth::Byte, Value::Byte(v)) => Ok(i64::from(*v)),
			(EnumWidth::Short, Value::Short(v)) => Ok(i64::from(*v)),
			(EnumWidth::Int, Value::Int(v)) => Ok(i64::from(*v)),
			(_, Value::Long(v)) => Ok(*v),
			(width, other) => Err(DecodeError::new(format!(
				"expected {} enum index, found {}",
				width.name(),
				other.kind()
			))),
		}
	}

	fn name(self) -> &'static str {
		match self {
			EnumWidth::Byte => "byte",
			EnumWidth::Short => "short",
			EnumWidth::Int => "int",
		}
	}
}

/// Variant <-> case-sensitive name.
pub struct StringEnumCodec<E: 'static> {
	variants: &'static [E],
}

impl<E> Codec for StringEnumCodec<E>
where
	E: AsRef<str> + Clone + Send + Sync + 'static,
{
	type Target = E;

	fn encode(&self, value: &E) -> Result<Value, EncodeError> {
		Ok(Value::String(value.as_ref().to_string()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<E> {
		let name = input.as_str().ok_or_else(|| DecodeError::expected("enum name", input))?;
		self.variants
			.iter()
			.find(|v| v.as_ref() == name)
			.cloned()
			.map(Decoded::complete)
			.ok_or_else(|| DecodeError::new(format!("unknown variant {name:?}")))
	}
}

/// Variant <-> zero-based declaration index at a fixed [`EnumWidth`].
pub struct IntEnumCodec<E: 'static> {
	variants: &'static [E],
	width: EnumWidth,
}

impl<E: 'static> IntEnumCodec<E> {
	pub fn width(&self) -> EnumWidth {
		self.width
	}
}

impl<E> Codec for IntEnumCodec<E>
where
	E: PartialEq + Clone + Send + Sync + 'static,
{
	type Target = E;

	fn encode(&self, value: &E) -> Result<Value, EncodeError> {
		let index = self
			.variants
			.iter()
			.position(|v| v == value)
			.ok_or_else(|| EncodeError::new("value is not a declared variant"))?;
		self.width.write(index)
	}

	fn decode(&self, input: &Value) -> DecodeResult<E> {
		let index = self.width.read(input)?;
		usize::try_from(index)
			.ok()
			.and_then(|i| self.variants.get(i))
			.cloned()
			.map(Decoded::complete)
			.ok_or_else(|| DecodeError::new(format!("enum index {index} out of range 0..{}", self.variants.len())))
	}
}

/// Codec mapping each variant of `E` to its name.
pub fn string_enum<E>() -> StringEnumCodec<E>
where
	E: VariantArray + AsRef<str> + Clone + Send + Sync + 'static,
{
	string_enum_of(E::VARIANTS)
}

pub fn string_enum_of<E>(variants: &'static [E]) -> StringEnumCodec<E>
where
	E: AsRef<str> + Clone + Send + Sync + 'static,
{
	StringEnumCodec { variants }
}

/// Codec mapping each variant of `E` to its declaration index.
pub fn int_enum<E>() -> IntEnumCodec<E>
where
	E: VariantArray + PartialEq + Clone + Send + Sync + 'static,
{
	int_enum_of(E::VARIANTS)
}

/// Index codec over an explicit variant table.
pub fn int_enum_of<E>(variants: &'static [E]) -> IntEnumCodec<E>
where
	E: PartialEq + Clone + Send + Sync + 'static,
{
	IntEnumCodec {
		variants,
		width: EnumWidth::for_count(variants.len()),
	}
}
