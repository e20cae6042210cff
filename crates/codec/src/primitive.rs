//! Leaf codecs for scalars, identifiers and serde types.

use std::marker::PhantomData;

use codeclib_primitives::Identifier;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Codec, DecodeError, DecodeResult, Decoded, EncodeError, Value};

pub struct BoolCodec;

impl Codec for BoolCodec {
	type Target = bool;

	fn encode(&self, value: &bool) -> Result<Value, EncodeError> {
		Ok(Value::Bool(*value))
	}

	fn decode(&self, input: &Value) -> DecodeResult<bool> {
		input
			.as_bool()
			.map(Decoded::complete)
			.ok_or_else(|| DecodeError::expected("bool", input))
	}
}

/// 32-bit integers. Accepts any integer variant whose value fits.
pub struct IntCodec;

impl Codec for IntCodec {
	type Target = i32;

	fn encode(&self, value: &i32) -> Result<Value, EncodeError> {
		Ok(Value::Int(*value))
	}

	fn decode(&self, input: &Value) -> DecodeResult<i32> {
		let wide = input.as_i64().ok_or_else(|| DecodeError::expected("integer", input))?;
		i32::try_from(wide)
			.map(Decoded::complete)
			.map_err(|_| DecodeError::new(format!("{wide} does not fit in an int")))
	}
}

pub struct LongCodec;

impl Codec for LongCodec {
	type Target = i64;

	fn encode(&self, value: &i64) -> Result<Value, EncodeError> {
		Ok(Value::Long(*value))
	}

	fn decode(&self, input: &Value) -> DecodeResult<i64> {
		input
			.as_i64()
			.map(Decoded::complete)
			.ok_or_else(|| DecodeError::expected("integer", input))
	}
}

pub struct DoubleCodec;

impl Codec for DoubleCodec {
	type Target = f64;

	fn encode(&self, value: &f64) -> Result<Value, EncodeError> {
		Ok(Value::Double(*value))
	}

	fn decode(&self, input: &Value) -> DecodeResult<f64> {
		input
			.as_f64()
			.map(Decoded::complete)
			.ok_or_else(|| DecodeError::expected("number", input))
	}
}

pub struct StringCodec;

impl Codec for StringCodec {
	type Target = String;

	fn encode(&self, value: &String) -> Result<Value, EncodeError> {
		Ok(Value::String(value.clone()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<String> {
		input
			.as_str()
			.map(|s| Decoded::complete(s.to_string()))
			.ok_or_else(|| DecodeError::expected("string", input))
	}
}

/// Identifiers in their `namespace:path` string form.
pub struct IdentifierCodec;

impl Codec for IdentifierCodec {
	type Target = Identifier;

	fn encode(&self, value: &Identifier) -> Result<Value, EncodeError> {
		Ok(Value::String(value.to_string()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<Identifier> {
		let raw = input.as_str().ok_or_else(|| DecodeError::expected("identifier string", input))?;
		Identifier::parse(raw)
			.map(Decoded::complete)
			.map_err(|e| DecodeError::new(e.to_string()))
	}
}

/// Identity codec: the value tree itself.
pub struct Passthrough;

impl Codec for Passthrough {
	type Target = Value;

	fn encode(&self, value: &Value) -> Result<Value, EncodeError> {
		Ok(value.clone())
	}

	fn decode(&self, input: &Value) -> DecodeResult<Value> {
		Ok(Decoded::complete(input.clone()))
	}
}

/// Bridges any serde type through its JSON representation.
pub struct SerdeCodec<T>(PhantomData<fn() -> T>);

impl<T> Codec for SerdeCodec<T>
where
	T: Serialize + DeserializeOwned,
{
	type Target = T;

	fn encode(&self, value: &T) -> Result<Value, EncodeError> {
		serde_json::to_value(value)
			.map(Value::from)
			.map_err(|e| EncodeError::new(e.to_string()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<T> {
		serde_json::from_value(input.to_json())
			.map(Decoded::complete)
			.map_err(|e| DecodeError::new(e.to_string()))
	}
}

pub fn bool() -> BoolCodec {
	BoolCodec
}

pub fn int() -> IntCodec {
	IntCodec
}

pub fn long() -> LongCodec {
	LongCodec
}

pub fn double() -> DoubleCodec {
	DoubleCodec
}

pub fn string() -> StringCodec {
	StringCodec
}

pub fn identifier() -> IdentifierCodec {
	IdentifierCodec
}

pub fn passthrough() -> Passthrough {
	Passthrough
}

/// Codec for any `serde` type. Integer widths are not preserved.
pub fn from_serde<T: Serialize + DeserializeOwned>() -> SerdeCodec<T> {
	SerdeCodec(PhantomData)
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};

	use super::*;

	#[test]
	fn int_rejects_out_of_range_long() {
		let err = int().decode(&Value::Long(i64::from(i32::MAX) + 1)).unwrap_err();
		assert!(err.reason.contains("does not fit"));
		assert_eq!(int().decode(&Value::Byte(7)).unwrap().value, 7);
	}

	#[test]
	fn shape_mismatch_names_both_kinds() {
		let err = string().decode(&Value::Bool(true)).unwrap_err();
		assert_eq!(err.reason, "expected string, found bool");
	}

	#[test]
	fn identifier_codec_validates() {
		let id = identifier().decode(&Value::from("arcane:bolt")).unwrap().value;
		assert_eq!(id.path(), "bolt");
		assert!(identifier().decode(&Value::from("Not Valid")).is_err());
	}

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Spell {
		name: String,
		cost: u32,
	}

	#[test]
	fn serde_codec_round_trips_structs() {
		let codec = from_serde::<Spell>();
		let spell = Spell {
			name: "blink".into(),
			cost: 3,
		};
		let encoded = codec.encode(&spell).unwrap();
		assert_eq!(encoded.as_map().unwrap()["cost"], Value::Long(3));
		assert_eq!(codec.decode(&encoded).unwrap().value, spell);
		assert!(codec.decode(&Value::from("nope")).is_err());
	}
}
