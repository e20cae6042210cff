//! Tagged unions: untagged alternatives and discriminator-keyed dispatch.

use crate::{BoxCodec, Codec, DecodeError, DecodeResult, EncodeError, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
	Left(L),
	Right(R),
}

/// Codec produced by [`either`].
pub struct EitherCodec<L, R> {
	left: L,
	right: R,
}

impl<L: Codec, R: Codec> Codec for EitherCodec<L, R> {
	type Target = Either<L::Target, R::Target>;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		match value {
			Either::Left(v) => self.left.encode(v),
			Either::Right(v) => self.right.encode(v),
		}
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		let left_err = match self.left.decode(input) {
			Ok(decoded) => return Ok(decoded.map(Either::Left)),
			Err(e) => e,
		};
		match self.right.decode(input) {
			Ok(decoded) => Ok(decoded.map(Either::Right)),
			Err(right_err) => Err(DecodeError {
				path: left_err.path,
				reason: format!("neither alternative matched: {}; {}", left_err.reason, right_err.reason),
			}),
		}
	}
}

/// Tries `left`, then `right`.
pub fn either<L: Codec, R: Codec>(left: L, right: R) -> EitherCodec<L, R> {
	EitherCodec { left, right }
}

type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Case<T> {
	name: &'static str,
	codec: BoxCodec<T>,
	matches: Matcher<T>,
}

/// Map-shaped union selected by a string discriminator field.
///
/// The discriminator is stripped before the case codec sees the map and
/// added back after it encodes.
pub struct Dispatch<T> {
	type_key: &'static str,
	cases: Vec<Case<T>>,
}

impl<T> Dispatch<T> {
	/// Adds a case. `matches` picks the case when encoding.
	pub fn case(
		mut self,
		name: &'static str,
		codec: BoxCodec<T>,
		matches: impl Fn(&T) -> bool + Send + Sync + 'static,
	) -> Self {
		self.cases.push(Case {
			name,
			codec,
			matches: Box::new(matches),
		});
		self
	}
}

impl<T> Codec for Dispatch<T> {
	type Target = T;

	fn encode(&self, value: &T) -> Result<Value, EncodeError> {
		let case = self
			.cases
			.iter()
			.find(|c| (c.matches)(value))
			.ok_or_else(|| EncodeError::new("no dispatch case matches value"))?;
		match case.codec.encode(value)? {
			Value::Map(mut fields) => {
				fields.insert(self.type_key.to_string(), Value::String(case.name.to_string()));
				Ok(Value::Map(fields))
			}
			other => Err(EncodeError::new(format!("case {} encoded to {}, expected map", case.name, other.kind()))),
		}
	}

	fn decode(&self, input: &Value) -> DecodeResult<T> {
		let fields = input.as_map().ok_or_else(|| DecodeError::expected("map", input))?;
		let tag = fields
			.get(self.type_key)
			.and_then(Value::as_str)
			.ok_or_else(|| DecodeError::new(format!("missing string field {:?}", self.type_key)))?;
		let case = self
			.cases
			.iter()
			.find(|c| c.name == tag)
			.ok_or_else(|| DecodeError::new(format!("unknown type {tag:?}")).at_key(self.type_key))?;
		let mut rest = fields.clone();
		rest.remove(self.type_key);
		case.codec.decode(&Value::Map(rest))
	}
}

/// Starts a dispatch codec keyed on `type_key`.
pub fn dispatch<T>(type_key: &'static str) -> Dispatch<T> {
	Dispatch {
		type_key,
		cases: Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};

	use super::*;
	use crate::{CodecExt, from_serde, int, string};

	#[test]
	fn either_prefers_left() {
		let codec = either(int(), string());
		assert_eq!(codec.decode(&Value::Int(4)).unwrap().value, Either::Left(4));
		assert_eq!(codec.decode(&Value::from("x")).unwrap().value, Either::Right("x".to_string()));
		let err = codec.decode(&Value::Bool(false)).unwrap_err();
		assert!(err.reason.starts_with("neither alternative matched"));
	}

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Projectile {
		speed: i32,
	}

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Aura {
		radius: i32,
	}

	#[derive(Debug, Clone, PartialEq)]
	enum Effect {
		Projectile(Projectile),
		Aura(Aura),
	}

	fn effect_codec() -> Dispatch<Effect> {
		let projectile = from_serde::<Projectile>()
			.flat_xmap(
				|p| Ok(Effect::Projectile(p)),
				|e: &Effect| match e {
					Effect::Projectile(p) => Ok(p.clone()),
					_ => Err("not a projectile".into()),
				},
			)
			.boxed();
		let aura = from_serde::<Aura>()
			.flat_xmap(
				|a| Ok(Effect::Aura(a)),
				|e: &Effect| match e {
					Effect::Aura(a) => Ok(a.clone()),
					_ => Err("not an aura".into()),
				},
			)
			.boxed();
		dispatch("type")
			.case("projectile", projectile, |e| matches!(e, Effect::Projectile(_)))
			.case("aura", aura, |e| matches!(e, Effect::Aura(_)))
	}

	#[test]
	fn dispatch_round_trips_by_discriminator() {
		let codec = effect_codec();
		let aura = Effect::Aura(Aura { radius: 5 });
		let encoded = codec.encode(&aura).unwrap();
		assert_eq!(encoded.as_map().unwrap()["type"], Value::from("aura"));
		assert_eq!(codec.decode(&encoded).unwrap().value, aura);
	}

	#[test]
	fn dispatch_rejects_unknown_type() {
		let input = Value::from(serde_json::json!({ "type": "beam", "speed": 1 }));
		let err = effect_codec().decode(&input).unwrap_err();
		assert_eq!(err.path, "$.type");
	}
}
