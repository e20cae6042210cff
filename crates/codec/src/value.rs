//! Untyped value tree shared by documents on disk and payloads on the wire.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Deepest list/map nesting accepted when deserializing a [`Value`].
pub const MAX_DEPTH: usize = 128;

/// Tree-shaped untyped data.
///
/// Integers keep their width so a codec can choose a compact representation
/// and have it survive a trip through the wire format. Text formats only
/// produce [`Value::Long`] and [`Value::Double`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Double(f64),
	String(String),
	List(Vec<Value>),
	Map(BTreeMap<String, Value>),
}

/// Shape of a [`Value`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	Null,
	Bool,
	Byte,
	Short,
	Int,
	Long,
	Double,
	String,
	List,
	Map,
}

impl ValueKind {
	pub fn name(self) -> &'static str {
		match self {
			ValueKind::Null => "null",
			ValueKind::Bool => "bool",
			ValueKind::Byte => "byte",
			ValueKind::Short => "short",
			ValueKind::Int => "int",
			ValueKind::Long => "long",
			ValueKind::Double => "double",
			ValueKind::String => "string",
			ValueKind::List => "list",
			ValueKind::Map => "map",
		}
	}
}

impl std::fmt::Display for ValueKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

impl Value {
	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Null => ValueKind::Null,
			Value::Bool(_) => ValueKind::Bool,
			Value::Byte(_) => ValueKind::Byte,
			Value::Short(_) => ValueKind::Short,
			Value::Int(_) => ValueKind::Int,
			Value::Long(_) => ValueKind::Long,
			Value::Double(_) => ValueKind::Double,
			Value::String(_) => ValueKind::String,
			Value::List(_) => ValueKind::List,
			Value::Map(_) => ValueKind::Map,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns any integer variant widened to `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Byte(v) => Some(i64::from(*v)),
			Value::Short(v) => Some(i64::from(*v)),
			Value::Int(v) => Some(i64::from(*v)),
			Value::Long(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns any numeric variant as `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Double(v) => Some(*v),
			other => other.as_i64().map(|v| v as f64),
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
		match self {
			Value::Map(v) => Some(v),
			_ => None,
		}
	}

	/// Converts to JSON. Non-finite doubles become `null`.
	pub fn to_json(&self) -> serde_json::Value {
		use serde_json::Value as Json;
		match self {
			Value::Null => Json::Null,
			Value::Bool(v) => Json::Bool(*v),
			Value::Byte(v) => Json::from(*v),
			Value::Short(v) => Json::from(*v),
			Value::Int(v) => Json::from(*v),
			Value::Long(v) => Json::from(*v),
			Value::Double(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
			Value::String(v) => Json::String(v.clone()),
			Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
			Value::Map(entries) => Json::Object(entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
		}
	}
}

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		use serde_json::Value as Json;
		match json {
			Json::Null => Value::Null,
			Json::Bool(v) => Value::Bool(v),
			Json::Number(n) => match n.as_i64() {
				Some(v) => Value::Long(v),
				None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
			},
			Json::String(v) => Value::String(v),
			Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
			Json::Object(entries) => Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
		}
	}
}

impl From<&serde_json::Value> for Value {
	fn from(json: &serde_json::Value) -> Self {
		Value::from(json.clone())
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Long(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Double(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::String(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::String(v.to_string())
	}
}

impl From<Vec<Value>> for Value {
	fn from(v: Vec<Value>) -> Self {
		Value::List(v)
	}
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Nested { depth: 0 }.deserialize(deserializer)
	}
}

const VARIANTS: &[&str] = &["Null", "Bool", "Byte", "Short", "Int", "Long", "Double", "String", "List", "Map"];

#[derive(Deserialize)]
#[serde(variant_identifier)]
enum Tag {
	Null,
	Bool,
	Byte,
	Short,
	Int,
	Long,
	Double,
	String,
	List,
	Map,
}

/// Reads one [`Value`] found inside `depth` enclosing lists or maps.
///
/// Lists and maps past [`MAX_DEPTH`] are an error rather than another level
/// of recursion.
#[derive(Clone, Copy)]
struct Nested {
	depth: usize,
}

impl<'de> DeserializeSeed<'de> for Nested {
	type Value = Value;

	fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
		deserializer.deserialize_enum("Value", VARIANTS, self)
	}
}

impl<'de> Visitor<'de> for Nested {
	type Value = Value;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a value tree")
	}

	fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
		let (tag, variant) = data.variant::<Tag>()?;
		let inner = Nested { depth: self.depth + 1 };
		if matches!(tag, Tag::List | Tag::Map) && inner.depth > MAX_DEPTH {
			return Err(de::Error::custom(format_args!("value nested deeper than {MAX_DEPTH} levels")));
		}
		Ok(match tag {
			Tag::Null => {
				variant.unit_variant()?;
				Value::Null
			}
			Tag::Bool => Value::Bool(variant.newtype_variant()?),
			Tag::Byte => Value::Byte(variant.newtype_variant()?),
			Tag::Short => Value::Short(variant.newtype_variant()?),
			Tag::Int => Value::Int(variant.newtype_variant()?),
			Tag::Long => Value::Long(variant.newtype_variant()?),
			Tag::Double => Value::Double(variant.newtype_variant()?),
			Tag::String => Value::String(variant.newtype_variant()?),
			Tag::List => Value::List(variant.newtype_variant_seed(ListSeed(inner))?),
			Tag::Map => Value::Map(variant.newtype_variant_seed(MapSeed(inner))?),
		})
	}
}

struct ListSeed(Nested);

impl<'de> DeserializeSeed<'de> for ListSeed {
	type Value = Vec<Value>;

	fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Value>, D::Error> {
		deserializer.deserialize_seq(self)
	}
}

impl<'de> Visitor<'de> for ListSeed {
	type Value = Vec<Value>;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a list of values")
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Value>, A::Error> {
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
		while let Some(item) = seq.next_element_seed(self.0)? {
			items.push(item);
		}
		Ok(items)
	}
}

struct MapSeed(Nested);

impl<'de> DeserializeSeed<'de> for MapSeed {
	type Value = BTreeMap<String, Value>;

	fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<BTreeMap<String, Value>, D::Error> {
		deserializer.deserialize_map(self)
	}
}

impl<'de> Visitor<'de> for MapSeed {
	type Value = BTreeMap<String, Value>;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a map of values")
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BTreeMap<String, Value>, A::Error> {
		let mut entries = BTreeMap::new();
		while let Some(key) = map.next_key::<String>()? {
			let value = map.next_value_seed(self.0)?;
			entries.insert(key, value);
		}
		Ok(entries)
	}
}
