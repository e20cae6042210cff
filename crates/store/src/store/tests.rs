use std::io::Write;
use std::sync::Arc;

use codeclib_codec::{CodecExt, from_serde};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::*;
use crate::{DirectorySupplier, MemorySupplier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Spell {
	name: String,
	cost: i32,
}

fn id(s: &str) -> Identifier {
	Identifier::parse(s).unwrap()
}

fn spell_store() -> DataStoreBuilder<Spell> {
	DataStore::builder(id("arcana:spells"), "spells", from_serde::<Spell>().boxed())
}

fn documents(entries: &[(&str, serde_json::Value)]) -> Documents {
	entries.iter().map(|(k, v)| (id(k), v.clone())).collect()
}

fn three_valid_one_broken() -> Documents {
	documents(&[
		("arcana:bolt", json!({"name": "Bolt", "cost": 3})),
		("arcana:nova", json!({"name": "Nova", "cost": 9})),
		("arcana:ward", json!({"name": "Ward", "cost": 1})),
		("arcana:broken", json!({"name": 5})),
	])
}

fn reject_everything(_: Candidate<Spell>) -> Result<Candidate<Spell>, ValidationError> {
	Err(ValidationError::new("nothing passes"))
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

impl Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl LogBuffer {
	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

/// Runs `f` with logs captured into a buffer.
fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
	let buffer = LogBuffer::default();
	let writer = buffer.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::DEBUG)
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();
	let result = tracing::subscriber::with_default(subscriber, f);
	(result, buffer.contents())
}

/// Three valid documents and one malformed one publish exactly three
/// entries and log the failure.
#[test]
fn malformed_document_is_skipped_and_logged() {
	let store = spell_store().build();
	let (report, logs) = capture_logs(|| store.apply(three_valid_one_broken()));

	assert_eq!(report.loaded, 3);
	assert_eq!(report.failures.len(), 1);
	assert_eq!(report.failures[0].0, id("arcana:broken"));
	assert_eq!(report.outcome, ReloadOutcome::Published { revision: 1 });
	assert_eq!(store.keys(), vec![id("arcana:bolt"), id("arcana:nova"), id("arcana:ward")]);
	assert!(!store.contains_key(&id("arcana:broken")));

	assert_eq!(logs.matches("failed to parse data entry").count(), 1);
	assert!(logs.contains("arcana:broken"));
	assert!(logs.contains("beginning data load"));
	assert!(logs.contains("validation finished"));
}

/// Files that never parse count as failures next to documents that fail to
/// decode.
#[test]
fn unparsable_files_are_reported() {
	let dir = tempfile::tempdir().unwrap();
	let spells = dir.path().join("data/arcana/spells");
	std::fs::create_dir_all(&spells).unwrap();
	for name in ["bolt", "nova", "ward"] {
		let doc = json!({"name": name, "cost": 1}).to_string();
		std::fs::write(spells.join(format!("{name}.json")), doc).unwrap();
	}
	std::fs::write(spells.join("bad.json"), "{ nope").unwrap();

	let store = spell_store().build();
	let (report, logs) = capture_logs(|| store.reload(&DirectorySupplier::new(dir.path())).unwrap());

	assert_eq!(report.loaded, 3);
	assert_eq!(report.failures.len(), 1);
	assert_eq!(report.failures[0].0, id("arcana:bad"));
	assert!(report.failures[0].1.reason.starts_with("invalid JSON"));
	assert!(report.is_published());
	assert_eq!(store.keys(), vec![id("arcana:bolt"), id("arcana:nova"), id("arcana:ward")]);
	assert!(logs.contains("failed to parse data file"));
	assert!(logs.contains("failed=1"));
}

/// A rejecting validator leaves the previous generation published.
#[test]
fn rejected_reload_keeps_previous_generation() {
	let store = spell_store().validator(reject_everything).build();
	assert!(matches!(store.apply(three_valid_one_broken()).outcome, ReloadOutcome::Rejected(_)));
	assert!(!store.is_loaded());

	let gate = Arc::new(std::sync::atomic::AtomicBool::new(true));
	let open = Arc::clone(&gate);
	let gated = spell_store()
		.validator(move |c: Candidate<Spell>| {
			if open.load(Ordering::SeqCst) {
				Ok(c)
			} else {
				Err(ValidationError::new("gate closed"))
			}
		})
		.build();
	gated.apply(documents(&[("arcana:bolt", json!({"name": "Bolt", "cost": 3}))]));
	let first = gated.snapshot().unwrap();
	gate.store(false, Ordering::SeqCst);

	let (report, logs) = capture_logs(|| gated.apply(three_valid_one_broken()));
	assert_eq!(report.outcome, ReloadOutcome::Rejected(ValidationError::new("gate closed")));
	assert!(Arc::ptr_eq(&first, &gated.snapshot().unwrap()));
	assert_eq!(gated.keys(), vec![id("arcana:bolt")]);
	assert!(logs.contains("validation failed"));
}

/// `PublishAnyway` publishes the decoded documents despite the rejection.
#[test]
fn publish_anyway_publishes_on_rejection() {
	let store = spell_store()
		.validator(reject_everything)
		.config(StoreConfig::new("spells").with_rejection(RejectionPolicy::PublishAnyway))
		.build();
	let report = store.apply(three_valid_one_broken());
	assert!(!report.is_published());
	assert_eq!(store.len(), 3);
}

/// Validators may prune entries instead of rejecting.
#[test]
fn validator_can_prune_candidate() {
	let store = spell_store()
		.validator(|mut c: Candidate<Spell>| {
			c.retain(|_, spell| spell.cost < 5);
			Ok(c)
		})
		.build();
	store.apply(three_valid_one_broken());
	assert_eq!(store.keys(), vec![id("arcana:bolt"), id("arcana:ward")]);
}

/// Lookups distinguish an unloaded store from a missing key.
#[test]
fn lookups_before_and_after_load() {
	let store = spell_store().build();
	assert_eq!(store.state(), StoreState::Unloaded);
	assert!(store.get(&id("arcana:bolt")).is_none());
	assert!(matches!(store.get_or_err(&id("arcana:bolt")), Err(StoreError::NotLoaded { .. })));
	assert!(store.is_empty());

	store.apply(three_valid_one_broken());
	assert_eq!(store.state(), StoreState::Loaded { revision: 1 });
	assert_eq!(store.get_or_err(&id("arcana:bolt")).unwrap().cost, 3);
	assert!(matches!(
		store.get_or_err(&id("arcana:zap")),
		Err(StoreError::NotFound { key, .. }) if key == id("arcana:zap")
	));

	let fallback = Arc::new(Spell {
		name: "Fizzle".into(),
		cost: 0,
	});
	assert_eq!(store.get_or_else(&id("arcana:zap"), || Arc::clone(&fallback)).name, "Fizzle");
	assert_eq!(store.values().len(), 3);
}

#[test]
fn panicking_validator_clears_loading_state() {
	let store = spell_store()
		.validator(|_: Candidate<Spell>| -> Result<Candidate<Spell>, ValidationError> { panic!("validator exploded") })
		.build();
	let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.apply(three_valid_one_broken())));
	assert!(result.is_err());
	assert_eq!(store.state(), StoreState::Unloaded);
}

/// Readers holding a snapshot are unaffected by later reloads.
#[test]
fn snapshots_outlive_reloads() {
	let store = spell_store().build();
	store.apply(three_valid_one_broken());
	let old = store.snapshot().unwrap();

	store.apply(documents(&[("arcana:zap", json!({"name": "Zap", "cost": 2}))]));
	assert_eq!(old.len(), 3);
	assert_eq!(store.keys(), vec![id("arcana:zap")]);
	assert_eq!(store.snapshot().unwrap().revision(), 2);
}

#[test]
fn reload_reads_configured_folder() {
	let supplier = MemorySupplier::new()
		.with("spells", id("arcana:bolt"), json!({"name": "Bolt", "cost": 3}))
		.with("runes", id("arcana:kenaz"), json!({"name": "Kenaz", "cost": 1}));
	let store = spell_store().build();
	let report = store.reload(&supplier).unwrap();
	assert_eq!(report.loaded, 1);
	assert!(store.contains_key(&id("arcana:bolt")));
}

#[test]
fn replace_synced_is_idempotent_for_same_generation() {
	let store = spell_store().build();
	let generation = store.generation_from_entries([(
		id("arcana:bolt"),
		Spell {
			name: "Bolt".into(),
			cost: 3,
		},
	)]);

	assert!(matches!(store.replace_synced(Arc::clone(&generation)), Replaced::Replaced { .. }));
	assert_eq!(store.replace_synced(Arc::clone(&generation)), Replaced::Unchanged);
	assert_eq!(store.get(&id("arcana:bolt")).unwrap().name, "Bolt");
}

#[test]
fn concurrent_readers_see_whole_generations() {
	let store = Arc::new(spell_store().build());
	let even = documents(&[
		("arcana:a", json!({"name": "A", "cost": 0})),
		("arcana:b", json!({"name": "B", "cost": 0})),
	]);
	let odd = documents(&[
		("arcana:c", json!({"name": "C", "cost": 1})),
		("arcana:d", json!({"name": "D", "cost": 1})),
		("arcana:e", json!({"name": "E", "cost": 1})),
	]);
	store.apply(even.clone());

	std::thread::scope(|scope| {
		let writer = Arc::clone(&store);
		scope.spawn(move || {
			for round in 0..50 {
				writer.apply(if round % 2 == 0 { odd.clone() } else { even.clone() });
			}
		});
		for _ in 0..4 {
			let reader = Arc::clone(&store);
			scope.spawn(move || {
				for _ in 0..200 {
					let snapshot = reader.snapshot().unwrap();
					let costs: Vec<_> = snapshot.values().map(|s| s.cost).collect();
					let whole = (costs.len() == 2 && costs.iter().all(|c| *c == 0))
						|| (costs.len() == 3 && costs.iter().all(|c| *c == 1));
					assert!(whole, "torn generation: {costs:?}");
				}
			});
		}
	});
}
