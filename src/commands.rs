//! CLI command implementations

use anyhow::Context as _;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use terragraph_core::{DependencyGraph, Direction, GraphExport, Hops};
use terragraph_indexer::{Session, apply_modifications, config};
use terragraph_server::{ServerConfig, TerragraphServer};

/// Export file layout: the interchange graph plus provenance.
#[derive(Debug, Serialize)]
pub struct ExportEnvelope {
    pub version: String,
    pub root: String,
    pub exported_at: String,
    #[serde(flatten)]
    pub graph: GraphExport,
}

pub fn open_session(root: &Path, config_path: Option<&PathBuf>, parallel: bool) -> anyhow::Result<Session> {
    let mut config = config::resolve(root, config_path)?;
    if parallel {
        config.parallel = true;
    }
    Ok(Session::new(root, config))
}

fn scan(session: &mut Session) -> anyhow::Result<DependencyGraph> {
    let (graph, report) = session.scan()?;
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    Ok(graph)
}

pub fn index(mut session: Session) -> anyhow::Result<()> {
    let (graph, report) = session.scan()?;
    println!(
        "Indexed {} files under {}: {} nodes, {} edges, {} parse failures, {} skipped",
        report.files,
        session.root().display(),
        graph.node_count(),
        graph.edge_count(),
        report.parse_failures,
        report.warnings.len()
    );
    Ok(())
}

pub fn summary(mut session: Session) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    println!("{}", serde_json::to_string_pretty(&graph.summary())?);
    Ok(())
}

pub fn neighbors(mut session: Session, path: &str, direction: Direction) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    for neighbor in graph.neighbors(path, direction)? {
        println!("{neighbor}");
    }
    Ok(())
}

pub fn expand(
    mut session: Session,
    seeds: &[String],
    hops: Option<usize>,
    direction: Direction,
) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    for path in graph.expand_directed(seeds, Hops::from(hops), direction)? {
        println!("{path}");
    }
    Ok(())
}

pub fn export(mut session: Session, output: Option<PathBuf>) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    let envelope = ExportEnvelope {
        version: env!("CARGO_PKG_VERSION").to_string(),
        root: session.root().display().to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        graph: graph.interchange(),
    };
    let json = serde_json::to_string_pretty(&envelope)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Graph exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn context(mut session: Session, paths: &[String]) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    print!("{}", graph.prompt_context(paths)?);
    Ok(())
}

pub fn describable(mut session: Session, max_chars: Option<usize>) -> anyhow::Result<()> {
    let graph = scan(&mut session)?;
    let max_chars = max_chars.unwrap_or(session.config().description_chars);
    println!("{}", serde_json::to_string_pretty(&graph.describable_files(max_chars))?);
    Ok(())
}

pub fn apply(session: Session, changes: &Path, dry_run: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(changes).with_context(|| format!("reading {}", changes.display()))?;
    let changes: BTreeMap<String, String> =
        serde_json::from_str(&text).context("changes must be a JSON object of path to content")?;

    let written = apply_modifications(session.root(), &changes, dry_run)?;
    let verb = if dry_run { "Would write" } else { "Wrote" };
    for path in written {
        println!("{verb} {path}");
    }
    Ok(())
}

pub async fn serve(mut session: Session, host: String, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting terragraph server on {}:{}", host, port);

    let graph = scan(&mut session)?;
    tracing::info!("Indexed {} nodes, {} edges", graph.node_count(), graph.edge_count());

    let server = TerragraphServer::new(graph, session, ServerConfig { host, port });
    server.start().await
}
