use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use pv_store::{FileRunStore, RunStore, StoreConfig};
use pv_types::{Namespace, Payload, RunId};

use crate::cli::*;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli { command, dir, config, format, .. } = cli;
    let store = open_store(dir.as_deref(), config.as_deref())?;
    let mut out = std::io::stdout().lock();
    match command {
        Command::Save(args) => {
            let payload = read_payload(&args.file)?;
            cmd_save(&store, &args, payload, &format, &mut out)
        }
        Command::Show(args) => cmd_show(&store, &args, &format, &mut out),
        Command::Sources => cmd_sources(&store, &format, &mut out),
        Command::Runs(args) => cmd_runs(&store, &args, &format, &mut out),
    }
}

fn open_store(dir: Option<&Path>, config_path: Option<&Path>) -> anyhow::Result<FileRunStore> {
    let config = match config_path {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let store = FileRunStore::new(dir, &config.with_env_overrides());
    tracing::debug!(dir = %store.dir().display(), source = ?store.dir_source(), "using run directory");
    Ok(store)
}

fn read_payload(file: &str) -> anyhow::Result<Payload> {
    let mut input = String::new();
    if file == "-" {
        std::io::stdin().read_to_string(&mut input)?;
    } else {
        input = std::fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    }
    serde_json::from_str(&input).with_context(|| format!("{file} is not valid JSON"))
}

fn cmd_save(
    store: &dyn RunStore,
    args: &SaveArgs,
    payload: Payload,
    format: &OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let namespace = Namespace::new(args.namespace.as_str())?;
    let id = args.id.as_deref().map(RunId::new).transpose()?;
    let id = store.save(&payload, &namespace, id.as_ref())?;

    match format {
        OutputFormat::Text => writeln!(
            out,
            "{} Saved run {} in namespace {}",
            "✓".green().bold(),
            id.as_str().yellow(),
            namespace.as_str().bold()
        )?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({"id": id.as_str(), "namespace": namespace.as_str()})
        )?,
    }
    Ok(())
}

fn cmd_show(
    store: &dyn RunStore,
    args: &ShowArgs,
    format: &OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let namespace = Namespace::new(args.namespace.as_str())?;
    let id = RunId::new(args.id.as_str())?;
    let run = store.get(&id, &namespace)?;

    match format {
        OutputFormat::Text => {
            writeln!(out, "Run {} — {}", run.id.as_str().yellow().bold(), run.description)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&run.payload)?)?;
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&run)?)?,
    }
    Ok(())
}

fn cmd_sources(
    store: &dyn RunStore,
    format: &OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let groups = store.list_by_namespace()?;

    match format {
        OutputFormat::Text => {
            if groups.is_empty() {
                writeln!(out, "No runs stored.")?;
            }
            for group in &groups {
                let latest = group
                    .latest()
                    .map(|e| e.modified.format(TIME_FORMAT).to_string())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{}  {} runs, latest {}",
                    group.namespace.as_str().bold(),
                    group.len(),
                    latest.dimmed()
                )?;
            }
        }
        OutputFormat::Json => {
            let sources: Vec<_> = groups
                .iter()
                .map(|g| {
                    json!({
                        "namespace": g.namespace.as_str(),
                        "runs": g.len(),
                        "latest": g.latest().map(|e| e.modified),
                    })
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&sources)?)?;
        }
    }
    Ok(())
}

fn cmd_runs(
    store: &dyn RunStore,
    args: &RunsArgs,
    format: &OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let runs = match &args.namespace {
        Some(name) => store.list_runs_for(&Namespace::new(name.as_str())?)?,
        None => store.list_runs()?,
    };

    match format {
        OutputFormat::Text => {
            if runs.is_empty() {
                writeln!(out, "No runs found.")?;
            }
            for entry in &runs {
                let file = entry
                    .path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{}  {}  {}  {}",
                    entry.modified.format(TIME_FORMAT).to_string().dimmed(),
                    entry.id.as_str().yellow(),
                    entry.namespace.as_str().bold(),
                    file
                )?;
            }
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&runs)?)?,
    }
    Ok(())
}
