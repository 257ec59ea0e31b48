// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use tagsense::config::consts::DEFAULT_CONFIG_FILE;
use tagsense::config::{load_and_validate_config, Config, Runtime, RuntimeBuilder};
use tagsense::engine::{follow_job, lineage, Job, PipelineWorker};
use tagsense::observability::init_tracing;
use tagsense::store::{EntryFilter, Payload};

#[derive(Parser)]
#[command(name = "tagsense", version, about = "Content-addressed file ingestion and transformation pipeline")]
struct Cli {
    /// YAML config file (defaults to ./tagsense.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import files and run every installed process over them
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Install a process that requires explicit installation
    Install { uid: String },
    /// List registered processes and their installation state
    Processes,
    /// Run processes over the entries already in their input stores
    Run {
        /// Restrict the run to these processes (default: all installed)
        #[arg(short, long = "process")]
        processes: Vec<String>,
    },
    /// Print the entries of a store as JSON lines
    Entries {
        store: String,
        /// Only these entry keys
        #[arg(long)]
        only: Vec<String>,
        /// Never these entry keys
        #[arg(long)]
        exclude: Vec<String>,
        /// Print the number of entries instead
        #[arg(long)]
        count: bool,
    },
    /// Show how an entry was derived, back to its root
    Lineage { store: String, entry_key: String },
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_and_validate_config(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("loading config {}", DEFAULT_CONFIG_FILE))
        }
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let runtime = RuntimeBuilder::from_config(&config)
        .await
        .context("starting runtime")?;

    match cli.command {
        Command::Import { paths } => import(&runtime, paths).await,
        Command::Install { uid } => {
            runtime.registry().install_by_uid(&uid).await?;
            println!("Installed {}", uid);
            Ok(())
        }
        Command::Processes => list_processes(&runtime).await,
        Command::Run { processes } => run_job(&runtime, processes, Vec::new()).await,
        Command::Entries {
            store,
            only,
            exclude,
            count,
        } => list_entries(&runtime, &store, only, exclude, count).await,
        Command::Lineage { store, entry_key } => {
            for (depth, link) in lineage(runtime.stores(), &store, &entry_key)
                .await?
                .iter()
                .enumerate()
            {
                println!(
                    "{}{} / {} (by {})",
                    "  ".repeat(depth),
                    link.store_uid,
                    link.entry_key,
                    link.process_uid
                );
            }
            Ok(())
        }
    }
}

async fn import(runtime: &Runtime, paths: Vec<PathBuf>) -> Result<()> {
    let mut seeds = Vec::with_capacity(paths.len());
    for path in paths {
        let absolute = std::fs::canonicalize(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut data = Payload::new();
        data.insert(
            "file_path".into(),
            Value::String(absolute.to_string_lossy().into_owned()),
        );
        seeds.push(runtime.manual.submit(data).await?);
    }
    run_job(runtime, Vec::new(), seeds).await
}

/// Hand a run to the background worker and print its progress.
async fn run_job(runtime: &Runtime, process_uids: Vec<String>, seed_keys: Vec<String>) -> Result<()> {
    let worker = PipelineWorker::spawn(runtime.runner.clone());
    let mut events = worker.subscribe();
    let job_id = worker
        .submit(Job::Run {
            process_uids,
            seed_keys,
        })
        .await?;

    let failure = follow_job(&mut events, job_id, |report| println!("{}", report.message())).await?;
    worker.shutdown().await?;

    if let Some(error) = failure {
        bail!("run failed: {}", error);
    }
    Ok(())
}

async fn list_processes(runtime: &Runtime) -> Result<()> {
    let registry = runtime.registry();
    for process in registry.processes() {
        let descriptor = process.descriptor();
        let state = if registry.is_installed(process.as_ref()).await? {
            "installed"
        } else {
            "not installed"
        };
        println!(
            "{:<28} {} -> {}  [{}{}]",
            descriptor.uid(),
            descriptor.input().uid(),
            descriptor.output().uid(),
            state,
            if descriptor.is_repeatable() { ", repeatable" } else { "" }
        );
        if !descriptor.summary().is_empty() {
            println!("    {}", descriptor.summary());
        }
    }
    Ok(())
}

async fn list_entries(
    runtime: &Runtime,
    store_uid: &str,
    only: Vec<String>,
    exclude: Vec<String>,
    count: bool,
) -> Result<()> {
    let store = runtime.stores().require(store_uid)?;
    if count {
        println!("{}", store.count().await?);
        return Ok(());
    }

    let mut filter = EntryFilter::new().exclude(exclude);
    if !only.is_empty() {
        filter = filter.only(only);
    }
    for entry in store.list_filtered(&filter).await? {
        println!("{}", Value::Object(entry.to_record()));
    }
    Ok(())
}
