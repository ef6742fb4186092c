// Copyright 2025 Cowboy AI, LLC.

//! Cloud Service Tree Synthesis CLI
//!
//! Loads a topology document, runs it through the schema gate and the
//! synthesis engine, and prints the partitioned stack plan. With
//! `--dry-run` the plan is additionally walked against the in-memory
//! backend so reference wiring can be inspected end to end.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use cim_cloudtree::backend::{apply_plan, MemoryBackend};
use cim_cloudtree::loader::load_document;
use cim_cloudtree::source::FsFileSource;
use cim_cloudtree::stack::StackPlan;
use cim_cloudtree::synth::zones::StaticZoneCatalog;
use cim_cloudtree::synth::{synthesize, SynthesisContext};

/// Synthesize a cloud service tree into a deployable stack plan
#[derive(Parser)]
#[command(name = "cloudtree-synth", version, about)]
struct Args {
    /// Path to the topology document (YAML)
    topology: PathBuf,

    /// Directory that policy and boot-script references resolve against
    /// (defaults to the document's directory)
    #[arg(long)]
    files_root: Option<PathBuf>,

    /// Availability-zone suffixes assumed per region
    #[arg(long, value_delimiter = ',', default_value = "a,b,c")]
    zone_suffixes: Vec<String>,

    /// Output format for the plan
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    /// Walk the plan against the in-memory backend and print the
    /// resolved resources
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

/// Plan output envelope
#[derive(Serialize)]
struct PlanEnvelope {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    plan: StackPlan,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let document = load_document(&args.topology)
        .with_context(|| format!("loading {}", args.topology.display()))?;

    let files_root = args.files_root.clone().unwrap_or_else(|| {
        args.topology
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let files = FsFileSource::new(files_root);
    let zones = StaticZoneCatalog::new(args.zone_suffixes.clone());

    let plan = synthesize(&document, &SynthesisContext::new(&files, &zones))
        .context("synthesis failed")?;
    info!(units = plan.units.len(), declarations = plan.len(), "synthesis complete");

    let envelope = PlanEnvelope {
        run_id: Uuid::now_v7(),
        generated_at: Utc::now(),
        plan,
    };

    match args.format {
        Format::Yaml => print!("{}", serde_yaml::to_string(&envelope)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
    }

    if args.dry_run {
        let report = apply_plan(&envelope.plan, &mut MemoryBackend::new())
            .context("dry-run apply failed")?;

        match args.format {
            Format::Yaml => print!("{}", serde_yaml::to_string(&report)?),
            Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
    }

    Ok(())
}
