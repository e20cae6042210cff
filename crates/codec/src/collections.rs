//! List, set and map combinators.
//!
//! [`SetOf`] and [`MapOf`] decode leniently: an element that fails is left out
//! of the result and recorded in [`Decoded::failures`] together with its raw
//! input, so one bad entry never sinks the whole collection. [`ListOf`] is
//! strict because positions are meaningful.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use crate::error::nest_failures_at_index;
use crate::{Codec, DecodeError, DecodeResult, Decoded, EncodeError, Failure, Value};

/// Strict list codec.
pub struct ListOf<C> {
	element: C,
}

impl<C> ListOf<C> {
	pub fn new(element: C) -> Self {
		Self { element }
	}
}

impl<C: Codec> Codec for ListOf<C> {
	type Target = Vec<C::Target>;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		value
			.iter()
			.enumerate()
			.map(|(i, item)| self.element.encode(item).map_err(|e| e.at_index(i)))
			.collect::<Result<Vec<_>, _>>()
			.map(Value::List)
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		let items = input.as_list().ok_or_else(|| DecodeError::expected("list", input))?;
		let mut out = Vec::with_capacity(items.len());
		let mut failures = Vec::new();
		for (i, item) in items.iter().enumerate() {
			let decoded = self.element.decode(item).map_err(|e| e.at_index(i))?;
			failures.extend(nest_failures_at_index(decoded.failures, i));
			out.push(decoded.value);
		}
		Ok(Decoded::partial(out, failures))
	}
}

/// Lenient set codec; see [`set_of`].
pub struct SetOf<C> {
	element: C,
}

impl<C> SetOf<C> {
	pub fn new(element: C) -> Self {
		Self { element }
	}
}

impl<C> Codec for SetOf<C>
where
	C: Codec,
	C::Target: Eq + Hash,
{
	type Target = HashSet<C::Target>;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		value
			.iter()
			.enumerate()
			.map(|(i, item)| self.element.encode(item).map_err(|e| e.at_index(i)))
			.collect::<Result<Vec<_>, _>>()
			.map(Value::List)
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		let items = input.as_list().ok_or_else(|| DecodeError::expected("list", input))?;
		let (read, failed) = items.iter().enumerate().fold(
			(HashSet::with_capacity(items.len()), Vec::new()),
			|(mut read, mut failed), (i, item)| {
				match self.element.decode(item) {
					Ok(decoded) => {
						failed.extend(nest_failures_at_index(decoded.failures, i));
						read.insert(decoded.value);
					}
					Err(error) => failed.push(Failure {
						input: item.clone(),
						error: error.at_index(i),
					}),
				}
				(read, failed)
			},
		);
		Ok(Decoded::partial(read, failed))
	}
}

/// Lenient map codec; see [`map_of`].
pub struct MapOf<K, V> {
	key: K,
	value: V,
}

impl<K, V> MapOf<K, V> {
	pub fn new(key: K, value: V) -> Self {
		Self { key, value }
	}
}

enum Slot<'a> {
	Key(&'a str),
	Index(usize),
}

impl Slot<'_> {
	fn nest(&self, error: DecodeError) -> DecodeError {
		match self {
			Slot::Key(k) => error.at_key(k),
			Slot::Index(i) => error.at_index(*i),
		}
	}
}

impl<K, V> MapOf<K, V>
where
	K: Codec,
	V: Codec,
	K::Target: Eq + Hash,
{
	fn decode_entry(
		&self,
		slot: &Slot<'_>,
		key: &Value,
		value: &Value,
		out: &mut HashMap<K::Target, V::Target>,
		failed: &mut Vec<Failure>,
		raw: impl Fn() -> Value,
	) {
		let key = match self.key.decode(key).and_then(Decoded::strict) {
			Ok(key) => key,
			Err(error) => {
				failed.push(Failure {
					input: raw(),
					error: slot.nest(DecodeError::new(format!("invalid key: {}", error.reason))),
				});
				return;
			}
		};
		let decoded = match self.value.decode(value) {
			Ok(decoded) => decoded,
			Err(error) => {
				failed.push(Failure {
					input: raw(),
					error: slot.nest(error),
				});
				return;
			}
		};
		failed.extend(decoded.failures.into_iter().map(|f| Failure {
			input: f.input,
			error: slot.nest(f.error),
		}));
		if out.contains_key(&key) {
			failed.push(Failure {
				input: raw(),
				error: slot.nest(DecodeError::new("duplicate key")),
			});
			return;
		}
		out.insert(key, decoded.value);
	}
}

impl<K, V> Codec for MapOf<K, V>
where
	K: Codec,
	V: Codec,
	K::Target: Eq + Hash,
{
	type Target = HashMap<K::Target, V::Target>;

	fn encode(&self, value: &Self::Target) -> Result<Value, EncodeError> {
		let mut pairs = Vec::with_capacity(value.len());
		for (i, (k, v)) in value.iter().enumerate() {
			let key = self.key.encode(k).map_err(|e| e.at_index(i))?;
			let val = self.value.encode(v).map_err(|e| e.at_index(i))?;
			pairs.push((key, val));
		}

		if pairs.iter().all(|(k, _)| matches!(k, Value::String(_))) {
			let mut map = BTreeMap::new();
			for (k, v) in pairs {
				if let Value::String(k) = k {
					map.insert(k, v);
				}
			}
			return Ok(Value::Map(map));
		}

		Ok(Value::List(pairs.into_iter().map(|(k, v)| Value::List(vec![k, v])).collect()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<Self::Target> {
		let mut out = HashMap::new();
		let mut failed = Vec::new();
		match input {
			Value::Map(entries) => {
				out.reserve(entries.len());
				for (k, v) in entries {
					let key = Value::String(k.clone());
					self.decode_entry(&Slot::Key(k), &key, v, &mut out, &mut failed, || v.clone());
				}
			}
			Value::List(items) => {
				out.reserve(items.len());
				for (i, item) in items.iter().enumerate() {
					match item.as_list() {
						Some([k, v]) => self.decode_entry(&Slot::Index(i), k, v, &mut out, &mut failed, || item.clone()),
						_ => failed.push(Failure {
							input: item.clone(),
							error: DecodeError::expected("[key, value] pair", item).at_index(i),
						}),
					}
				}
			}
			other => return Err(DecodeError::expected("map or list of pairs", other)),
		}
		Ok(Decoded::partial(out, failed))
	}
}

/// Strict list of `element`.
pub fn list_of<C: Codec>(element: C) -> ListOf<C> {
	ListOf::new(element)
}

/// Set of `element`, decoded from a list.
///
/// Elements that fail are excluded and reported; the decode itself only
/// fails when the input is not a list. Encoding follows set iteration order.
pub fn set_of<C>(element: C) -> SetOf<C>
where
	C: Codec,
	C::Target: Eq + Hash,
{
	SetOf::new(element)
}

/// Map decoded from a `Map` (string keys run through `key`) or from a list
/// of `[key, value]` pairs.
///
/// Entries that fail are excluded and reported. When a key repeats, the
/// first occurrence is kept and each later one is reported as a
/// `duplicate key` failure.
pub fn map_of<K, V>(key: K, value: V) -> MapOf<K, V>
where
	K: Codec,
	V: Codec,
	K::Target: Eq + Hash,
{
	MapOf::new(key, value)
}
