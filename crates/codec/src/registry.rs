//! Codecs that resolve values through an external registry.
//!
//! The registry is bound late: a codec can be built while the registry it
//! refers to does not exist yet, and only has to be bound before the first
//! encode or decode.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use codeclib_primitives::Identifier;

use crate::{Codec, DecodeError, DecodeResult, Decoded, EncodeError, Value};

/// Two-way lookup between registered values and their identifiers.
pub trait RegistryLookup<T>: Send + Sync {
	fn get(&self, id: &Identifier) -> Option<T>;

	fn key_of(&self, value: &T) -> Option<Identifier>;
}

/// In-memory bidirectional registry.
#[derive(Debug, Clone)]
pub struct MapRegistry<T> {
	by_id: HashMap<Identifier, T>,
	by_value: HashMap<T, Identifier>,
}

impl<T> Default for MapRegistry<T> {
	fn default() -> Self {
		Self {
			by_id: HashMap::new(),
			by_value: HashMap::new(),
		}
	}
}

impl<T> MapRegistry<T>
where
	T: Clone + Eq + Hash,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `value` under `id`, replacing any previous mapping of either side.
	pub fn register(&mut self, id: Identifier, value: T) {
		if let Some(old) = self.by_id.insert(id.clone(), value.clone()) {
			self.by_value.remove(&old);
		}
		if let Some(old_id) = self.by_value.insert(value, id.clone())
			&& old_id != id
		{
			self.by_id.remove(&old_id);
		}
	}

	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}

impl<T> RegistryLookup<T> for MapRegistry<T>
where
	T: Clone + Eq + Hash + Send + Sync,
{
	fn get(&self, id: &Identifier) -> Option<T> {
		self.by_id.get(id).cloned()
	}

	fn key_of(&self, value: &T) -> Option<Identifier> {
		self.by_value.get(value).cloned()
	}
}

/// A registry slot that is filled once, after codecs referring to it exist.
pub struct LazyRegistry<T> {
	label: &'static str,
	slot: OnceLock<Arc<dyn RegistryLookup<T>>>,
}

impl<T> LazyRegistry<T> {
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			slot: OnceLock::new(),
		}
	}

	/// Binds the registry. Returns the rejected registry if already bound.
	pub fn bind(&self, registry: Arc<dyn RegistryLookup<T>>) -> Result<(), Arc<dyn RegistryLookup<T>>> {
		self.slot.set(registry)
	}

	pub fn is_bound(&self) -> bool {
		self.slot.get().is_some()
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	fn get(&self) -> Option<&Arc<dyn RegistryLookup<T>>> {
		self.slot.get()
	}
}

/// Codec produced by [`for_registry`].
pub struct RegistryCodec<T> {
	registry: Arc<LazyRegistry<T>>,
}

impl<T> RegistryCodec<T> {
	fn lookup(&self) -> Result<&Arc<dyn RegistryLookup<T>>, String> {
		self.registry
			.get()
			.ok_or_else(|| format!("registry {} is not bound", self.registry.label))
	}

	fn resolve(&self, raw: &str) -> Result<T, DecodeError> {
		let id = Identifier::parse(raw).map_err(|e| DecodeError::new(e.to_string()))?;
		let registry = self.lookup().map_err(DecodeError::new)?;
		registry
			.get(&id)
			.ok_or_else(|| DecodeError::new(format!("unknown {} entry {id}", self.registry.label)))
	}

	fn key(&self, value: &T) -> Result<Identifier, EncodeError> {
		let registry = self.lookup().map_err(EncodeError::new)?;
		registry
			.key_of(value)
			.ok_or_else(|| EncodeError::new(format!("value is not registered in {}", self.registry.label)))
	}
}

impl<T: Send + Sync> Codec for RegistryCodec<T> {
	type Target = T;

	fn encode(&self, value: &T) -> Result<Value, EncodeError> {
		Ok(Value::String(self.key(value)?.to_string()))
	}

	fn decode(&self, input: &Value) -> DecodeResult<T> {
		let raw = input.as_str().ok_or_else(|| DecodeError::expected("registry identifier", input))?;
		self.resolve(raw).map(Decoded::complete)
	}
}

/// Codec mapping a registered value to and from its identifier.
pub fn for_registry<T>(registry: Arc<LazyRegistry<T>>) -> RegistryCodec<T> {
	RegistryCodec { registry }
}

/// A single registered value, or a reference to a named group of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceOrTag<T> {
	Instance(T),
	Tag(Identifier),
}

/// Codec produced by [`instance_or_tag`].
pub struct InstanceOrTagCodec<T> {
	inner: RegistryCodec<T>,
}

impl<T: Send + Sync> Codec for InstanceOrTagCodec<T> {
	type Target = InstanceOrTag<T>;

	fn encode(&self, value: &InstanceOrTag<T>) -> Result<Value, EncodeError> {
		match value {
			InstanceOrTag::Instance(v) => self.inner.encode(v),
			InstanceOrTag::Tag(tag) => Ok(Value::String(format!("#{tag}"))),
		}
	}

	fn decode(&self, input: &Value) -> DecodeResult<InstanceOrTag<T>> {
		let raw = input.as_str().ok_or_else(|| DecodeError::expected("identifier or #tag", input))?;
		let value = match raw.strip_prefix('#') {
			Some(tag) => Identifier::parse(tag)
				.map(InstanceOrTag::Tag)
				.map_err(|e| DecodeError::new(e.to_string()))?,
			None => InstanceOrTag::Instance(self.inner.resolve(raw)?),
		};
		Ok(Decoded::complete(value))
	}
}

/// `"#ns:path"` decodes to a tag reference, anything else to a registry entry.
pub fn instance_or_tag<T>(registry: Arc<LazyRegistry<T>>) -> InstanceOrTagCodec<T> {
	InstanceOrTagCodec {
		inner: for_registry(registry),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, PartialEq, Eq, Hash)]
	enum Block {
		Stone,
		Dirt,
	}

	fn id(s: &str) -> Identifier {
		Identifier::parse(s).unwrap()
	}

	fn blocks() -> Arc<dyn RegistryLookup<Block>> {
		let mut registry = MapRegistry::new();
		registry.register(id("stone"), Block::Stone);
		registry.register(id("dirt"), Block::Dirt);
		Arc::new(registry)
	}

	#[test]
	fn codec_is_usable_only_after_binding() {
		let lazy = Arc::new(LazyRegistry::new("block"));
		let codec = for_registry(Arc::clone(&lazy));

		let err = codec.decode(&Value::from("minecraft:stone")).unwrap_err();
		assert!(err.reason.contains("not bound"));
		assert!(codec.encode(&Block::Dirt).is_err());

		assert!(lazy.bind(blocks()).is_ok());
		assert!(lazy.bind(blocks()).is_err());

		assert_eq!(codec.decode(&Value::from("stone")).unwrap().value, Block::Stone);
		assert_eq!(codec.encode(&Block::Dirt).unwrap(), Value::from("minecraft:dirt"));
		assert!(codec.decode(&Value::from("minecraft:glass")).is_err());
	}

	#[test]
	fn instance_or_tag_splits_on_hash() {
		let lazy = Arc::new(LazyRegistry::new("block"));
		assert!(lazy.bind(blocks()).is_ok());
		let codec = instance_or_tag(lazy);

		assert_eq!(
			codec.decode(&Value::from("#minecraft:mineable")).unwrap().value,
			InstanceOrTag::Tag(id("minecraft:mineable"))
		);
		assert_eq!(codec.decode(&Value::from("dirt")).unwrap().value, InstanceOrTag::Instance(Block::Dirt));
		assert_eq!(
			codec.encode(&InstanceOrTag::Tag(id("logs"))).unwrap(),
			Value::from("#minecraft:logs")
		);
	}

	#[test]
	fn re_registering_a_value_moves_its_key() {
		let mut registry = MapRegistry::new();
		registry.register(id("a"), 1);
		registry.register(id("b"), 1);
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.key_of(&1), Some(id("b")));
		assert_eq!(registry.get(&id("a")), None);
	}
}
