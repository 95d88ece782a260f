//! Subcommand implementations for the `docbench` binary.
//!
//! `main` only parses arguments and sets up logging; everything else lives
//! here so it can be driven from tests.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use docbench_core::client::{MemoryClient, QueryParams};
use docbench_core::config::Config;
use docbench_core::docs::DocSet;
use docbench_core::runner::{IndexSummary, Runner, SearchSummary};
use docbench_core::stats::{Groupings, Report, StatsLog};

use crate::catalog;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the catalog document set and persist it.
    Generate(GenerateArgs),
    /// Index a persisted document set and time searches against it.
    Bench(BenchArgs),
    /// Compile a report from a saved statistics log.
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Directory the document set is written to.
    #[arg(long)]
    pub out: PathBuf,
    /// Document set id; names the files in `out`.
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides `generate.num_docs`.
    #[arg(long)]
    pub docs: Option<usize>,
    /// Overrides `generate.seed`.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Directory holding the persisted document set.
    #[arg(long)]
    pub dir: PathBuf,
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Where the statistics log snapshot is saved.
    #[arg(long)]
    pub log: PathBuf,
    /// Run id recorded in the log. Defaults to the document set id.
    #[arg(long)]
    pub test_id: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub log: PathBuf,
    /// Aggregate labels: `NAME=label1,label2`. Repeatable.
    #[arg(long = "group", value_parser = parse_group)]
    pub groups: Vec<Group>,
}

/// One `--group` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub labels: BTreeSet<String>,
}

pub fn parse_group(s: &str) -> Result<Group, String> {
    let (name, labels) = s.split_once('=').ok_or_else(|| format!("expected NAME=label1,label2, got {s:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("group in {s:?} has no name"));
    }
    let labels: BTreeSet<String> =
        labels.split(',').map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
    if labels.is_empty() {
        return Err(format!("group `{name}` lists no labels"));
    }
    Ok(Group { name: name.to_string(), labels })
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Returns the number of documents written.
pub fn generate(args: &GenerateArgs) -> anyhow::Result<usize> {
    let mut cfg = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(n) = args.docs {
        cfg.generate.num_docs = n;
    }
    if let Some(seed) = args.seed {
        cfg.generate.seed = seed;
    }
    cfg.validate()?;

    let schema = catalog::configure(&cfg.generate).context("configuring the catalog schema")?;
    let mut set = DocSet::from_schema(args.id.as_str(), schema, Some(args.out.clone()))
        .with_context(|| format!("opening document set `{}` in {}", args.id, args.out.display()))?;
    let mut written = 0usize;
    for doc in set.docs()? {
        doc?;
        written += 1;
    }
    tracing::info!(id = %args.id, dir = ?args.out, written, "generate done");
    Ok(written)
}

pub fn bench(args: &BenchArgs) -> anyhow::Result<(IndexSummary, SearchSummary)> {
    let cfg = Config::load(args.config.as_deref()).context("loading configuration")?;
    let mut set = DocSet::from_disk(args.id.as_str(), args.dir.clone())
        .with_context(|| format!("restoring document set `{}` from {}", args.id, args.dir.display()))?;

    let test_id = args.test_id.clone().unwrap_or_else(|| args.id.clone());
    let log = StatsLog::new(cfg.metadata.to_metadata(test_id));
    let mut runner = Runner::new(MemoryClient::new(), log, cfg.runner_config());

    runner.clear_index()?;
    let indexed = runner.index_docs(set.docs()?, &cfg.index.options())?;

    let mut terms: Vec<&str> = Vec::with_capacity(set.search_terms().len() + 1);
    if cfg.search.include_match_all {
        terms.push("");
    }
    terms.extend(set.search_terms().iter());
    let searched = runner.run_searches(
        &terms,
        &cfg.search.label,
        cfg.search.rep_n,
        cfg.search.ignore_n,
        &QueryParams::new(),
    )?;
    runner.finish()?;

    let (_, log) = runner.into_parts();
    log.save(&args.log).with_context(|| format!("saving statistics log to {}", args.log.display()))?;
    tracing::info!(log = ?args.log, records = log.records().len(), "statistics log saved");
    Ok((indexed, searched))
}

pub fn report(args: &ReportArgs) -> anyhow::Result<Report> {
    let log = StatsLog::load(&args.log).with_context(|| format!("loading statistics log {}", args.log.display()))?;
    let groupings: Groupings = args.groups.iter().map(|g| (g.name.clone(), g.labels.clone())).collect();
    Ok(log.compile_report(&groupings))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
