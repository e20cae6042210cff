//! End-to-end replication between an authoritative store set and a replica.

use std::sync::Arc;

use codeclib_codec::{CodecExt, Value, from_serde, int_enum, map_of, string, string_enum};
use codeclib_primitives::Identifier;
use codeclib_store::{DataStore, Documents, Replaced};
use codeclib_sync::{
	LoopbackChannel, Replica, StoreRegistry, SyncChannel, SyncEnvelope, SyncError, SyncSource, SyncTarget,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum_macros::{AsRefStr, VariantArray};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Spell {
	name: String,
	cost: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, VariantArray)]
#[strum(serialize_all = "snake_case")]
enum School {
	Fire,
	Frost,
	Storm,
}

fn id(s: &str) -> Identifier {
	Identifier::parse(s).unwrap()
}

fn spells() -> Arc<DataStore<Spell>> {
	Arc::new(DataStore::builder(id("arcana:spells"), "spells", from_serde::<Spell>().boxed()).build())
}

/// Loaded from JSON as strings, synced as compact integer indices.
fn schools() -> Arc<DataStore<std::collections::HashMap<String, School>>> {
	let load = map_of(string(), string_enum::<School>()).boxed();
	let network = map_of(string(), int_enum::<School>()).boxed();
	Arc::new(
		DataStore::builder(id("arcana:schools"), "schools", load)
			.network_codec(network)
			.build(),
	)
}

fn spell_docs() -> Documents {
	[
		(id("arcana:bolt"), json!({"name": "Bolt", "cost": 3})),
		(id("arcana:nova"), json!({"name": "Nova", "cost": 9})),
	]
	.into_iter()
	.collect()
}

struct Node {
	spells: Arc<DataStore<Spell>>,
	schools: Arc<DataStore<std::collections::HashMap<String, School>>>,
	registry: StoreRegistry,
}

fn node() -> Node {
	let spells = spells();
	let schools = schools();
	let registry = StoreRegistry::new();
	registry.register(spells.clone()).unwrap();
	registry.register(schools.clone()).unwrap();
	Node {
		spells,
		schools,
		registry,
	}
}

#[test]
fn full_sync_reproduces_every_store() {
	let server = node();
	server.spells.apply(spell_docs());
	server
		.schools
		.apply([(id("arcana:bolt"), json!({"bolt": "storm", "nova": "fire"}))].into_iter().collect());

	let client = node();
	let channel = Arc::new(LoopbackChannel::new());
	let (_, mut inbox) = channel.connect();
	let source = SyncSource::new(server.registry.clone(), channel.clone());
	assert_eq!(source.on_reload_complete(SyncTarget::All).sent, 2);

	let replica = Replica::new(client.registry.clone());
	while let Some(payload) = inbox.try_recv() {
		assert!(matches!(replica.receive(&payload).unwrap(), Replaced::Replaced { .. }));
	}

	assert_eq!(client.spells.keys(), server.spells.keys());
	for key in server.spells.keys() {
		assert_eq!(client.spells.get(&key), server.spells.get(&key));
	}
	let schools = client.schools.get(&id("arcana:bolt")).unwrap();
	assert_eq!(schools.get("bolt"), Some(&School::Storm));
	assert_eq!(schools.get("nova"), Some(&School::Fire));
}

#[test]
fn network_codec_shapes_the_payload() {
	let server = node();
	server
		.schools
		.apply([(id("arcana:bolt"), json!({"bolt": "frost"}))].into_iter().collect());

	let channel = Arc::new(LoopbackChannel::new());
	let (_, mut inbox) = channel.connect();
	let source = SyncSource::new(server.registry.clone(), channel.clone());
	assert!(source.sync_store(&id("arcana:schools"), SyncTarget::All).unwrap());

	let envelope = SyncEnvelope::from_bytes(&inbox.try_recv().unwrap()).unwrap();
	assert_eq!(envelope.store, id("arcana:schools"));
	let Value::Map(entry) = &envelope.entries[0].1 else {
		panic!("expected map entry, got {:?}", envelope.entries[0].1);
	};
	assert_eq!(entry.get("bolt"), Some(&Value::Byte(1)));
}

#[test]
fn unloaded_stores_are_skipped() {
	let server = node();
	server.spells.apply(spell_docs());
	let channel = Arc::new(LoopbackChannel::new());
	let (peer, mut inbox) = channel.connect();
	let source = SyncSource::new(server.registry.clone(), channel.clone());

	assert_eq!(source.on_reload_complete(SyncTarget::Peer(peer)).sent, 1);
	assert!(inbox.try_recv().is_some());
	assert!(inbox.try_recv().is_none());
}

#[test]
fn malformed_payload_keeps_previous_generation() {
	let server = node();
	server.spells.apply(spell_docs());
	let client = node();
	let replica = Replica::new(client.registry.clone());

	let exported = server.registry.get(&id("arcana:spells")).unwrap().export().unwrap().unwrap();
	let good = SyncEnvelope::new(id("arcana:spells"), exported).to_bytes().unwrap();
	replica.receive(&good).unwrap();
	let before = client.spells.snapshot().unwrap();

	assert!(matches!(replica.receive(&good[..good.len() / 2]), Err(SyncError::MalformedEnvelope(_))));

	let bad_entry = SyncEnvelope::new(
		id("arcana:spells"),
		vec![(id("arcana:bolt"), Value::Map([("name".to_string(), Value::Int(1))].into()))],
	)
	.to_bytes()
	.unwrap();
	assert!(matches!(replica.receive(&bad_entry), Err(SyncError::MalformedEnvelope(_))));

	assert!(Arc::ptr_eq(&before, &client.spells.snapshot().unwrap()));
}

#[test]
fn deeply_nested_payload_is_malformed() {
	let client = node();
	let replica = Replica::new(client.registry.clone());
	let mut payload = SyncEnvelope::new(id("arcana:spells"), vec![(id("arcana:bolt"), Value::Null)])
		.to_bytes()
		.unwrap()
		.to_vec();
	// Replace the trailing `Null` tag with a long chain of one-element lists.
	payload.pop();
	for _ in 0..200_000 {
		payload.extend_from_slice(&[8, 1]);
	}
	payload.push(0);

	assert!(matches!(replica.receive(&payload), Err(SyncError::MalformedEnvelope(_))));
	assert!(!client.spells.is_loaded());
}

#[test]
fn unknown_store_is_reported() {
	let client = node();
	let replica = Replica::new(client.registry.clone());
	let payload = SyncEnvelope::new(id("arcana:relics"), Vec::new()).to_bytes().unwrap();
	assert!(matches!(replica.receive(&payload), Err(SyncError::UnknownStore(store)) if store == id("arcana:relics")));
}

#[tokio::test]
async fn replica_pump_drains_until_disconnect() {
	let server = node();
	server.spells.apply(spell_docs());
	server
		.schools
		.apply([(id("arcana:bolt"), json!({"bolt": "storm"}))].into_iter().collect());

	let client = node();
	let channel = Arc::new(LoopbackChannel::new());
	let (peer, inbox) = channel.connect();
	let source = SyncSource::new(server.registry.clone(), channel.clone());
	assert!(source.on_reload_complete(SyncTarget::All).is_complete());
	channel.send_to(peer, bytes_of_garbage()).unwrap();
	channel.disconnect(peer);

	let replica = Replica::new(client.registry.clone());
	assert_eq!(replica.run(inbox).await, 2);
	assert_eq!(client.spells.len(), 2);
	assert!(client.schools.is_loaded());
}

fn bytes_of_garbage() -> bytes::Bytes {
	bytes::Bytes::from_static(&[0xff, 0xff, 0xff, 0xff])
}
