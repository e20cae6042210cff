//! `codeclib` command line tool.
//!
//! Loads one resource folder into an untyped store and reports what
//! decoded, or replicates it through an in-process sync channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use codeclib_codec::{CodecExt, Value, passthrough};
use codeclib_primitives::Identifier;
use codeclib_store::{DataStore, DirectorySupplier, ReloadOutcome, ReloadReport, StoreConfig};
use codeclib_sync::{LoopbackChannel, Replica, StoreRegistry, SyncSource, SyncTarget};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "codeclib")]
#[command(about = "Load, validate and replicate codec-backed data folders")]
struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Load a folder and print the reload report
	Inspect(LoadArgs),
	/// Load a folder, sync it to an in-process replica and compare
	Replicate(LoadArgs),
}

#[derive(Args, Debug)]
struct LoadArgs {
	/// Data root containing `data/<namespace>/<folder>`
	#[arg(value_name = "ROOT")]
	root: PathBuf,

	/// Resource folder to load
	#[arg(short, long, required_unless_present = "config")]
	folder: Option<String>,

	/// Store config (TOML); its folder is used unless --folder is given
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Store identity
	#[arg(long, default_value = "codeclib:inspect")]
	store: Identifier,

	/// Print every loaded key
	#[arg(long)]
	keys: bool,
}

impl LoadArgs {
	fn store_config(&self) -> anyhow::Result<StoreConfig> {
		let mut config = match &self.config {
			Some(path) => StoreConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
			None => StoreConfig::new(String::new()),
		};
		if let Some(folder) = &self.folder {
			config.folder = folder.clone();
		}
		if config.folder.is_empty() {
			bail!("no folder given");
		}
		Ok(config)
	}

	fn build_store(&self) -> anyhow::Result<DataStore<Value>> {
		let config = self.store_config()?;
		Ok(DataStore::builder(self.store.clone(), config.folder.clone(), passthrough().boxed())
			.config(config)
			.build())
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if cli.verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	match cli.command {
		Command::Inspect(args) => inspect(&args),
		Command::Replicate(args) => replicate(&args).await,
	}
}

fn load(args: &LoadArgs) -> anyhow::Result<(Arc<DataStore<Value>>, ReloadReport)> {
	let store = Arc::new(args.build_store()?);
	let supplier = DirectorySupplier::new(&args.root);
	let report = store
		.reload(&supplier)
		.with_context(|| format!("reading {}", args.root.display()))?;
	Ok((store, report))
}

fn print_report(store: &DataStore<Value>, report: &ReloadReport, show_keys: bool) {
	println!("store    {}", store.id());
	println!("folder   {}", store.config().folder);
	println!("loaded   {}", report.loaded);
	println!("failed   {}", report.failures.len());
	for (key, error) in &report.failures {
		println!("  {key}: {error}");
	}
	match &report.outcome {
		ReloadOutcome::Published { revision } => println!("outcome  published (revision {revision})"),
		ReloadOutcome::Rejected(error) => println!("outcome  rejected: {error}"),
	}
	if show_keys {
		for key in store.keys() {
			println!("  {key}");
		}
	}
}

fn inspect(args: &LoadArgs) -> anyhow::Result<()> {
	let (store, report) = load(args)?;
	print_report(&store, &report, args.keys);
	if !report.failures.is_empty() {
		bail!("{} document(s) failed to decode", report.failures.len());
	}
	Ok(())
}

async fn replicate(args: &LoadArgs) -> anyhow::Result<()> {
	let (store, report) = load(args)?;
	print_report(&store, &report, args.keys);

	let source_registry = StoreRegistry::new();
	source_registry.register(store.clone())?;

	let replica_store = Arc::new(args.build_store()?);
	let replica_registry = StoreRegistry::new();
	replica_registry.register(replica_store.clone())?;

	let channel = Arc::new(LoopbackChannel::new());
	let (peer, inbox) = channel.connect();
	let source = SyncSource::new(source_registry, channel.clone());
	let summary = source.on_reload_complete(SyncTarget::Peer(peer));
	channel.disconnect(peer);

	let applied = Replica::new(replica_registry).run(inbox).await;
	info!(sent = summary.sent, applied, "replication finished");
	if let Some((store, error)) = summary.failed.first() {
		bail!("failed to send store {store}: {error}");
	}

	if store.keys() != replica_store.keys() {
		bail!("replica keys differ from source");
	}
	for key in store.keys() {
		if store.get(&key) != replica_store.get(&key) {
			bail!("replica entry {key} differs from source");
		}
	}
	println!("replica  {} entries match", replica_store.len());
	Ok(())
}
