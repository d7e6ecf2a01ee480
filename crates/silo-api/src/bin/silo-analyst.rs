//! One-shot analyst run from the command line.
//!
//! Exit codes: 0 verified, 1 error (unknown tenant, stage failure, bad
//! configuration), 2 unverified, 3 cancelled by timeout.

use anyhow::Context;
use clap::Parser;
use silo_api::config::Settings;
use silo_core::{CancelSignal, PipelineRequest, RequestContext, Terminal, DEFAULT_MAX_REVISIONS};
use silo_stages::{REFERENCE_DOCUMENT, REFERENCE_QUERY};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "silo-analyst", version, about = "Run one tenant-scoped analysis")]
struct Cli {
    /// Tenant to activate
    #[arg(long)]
    tenant: String,

    #[arg(long, default_value = REFERENCE_QUERY)]
    query: String,

    #[arg(long, default_value_t = DEFAULT_MAX_REVISIONS)]
    max_revisions: u32,

    /// Subject entity; detected from the query when omitted
    #[arg(long)]
    subject: Option<String>,

    /// Document reference for fact extraction
    #[arg(long, default_value = REFERENCE_DOCUMENT)]
    document: String,

    /// Tenant registry YAML (defaults to the bundled reference tenants)
    #[arg(long)]
    tenants: Option<PathBuf>,

    /// Audit profile YAML (defaults to strict)
    #[arg(long)]
    profile: Option<PathBuf>,

    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings {
        tenants_path: cli.tenants.clone(),
        audit_profile_path: cli.profile.clone(),
        max_revisions: cli.max_revisions,
        run_timeout: Duration::from_millis(cli.timeout_ms),
        ..Settings::default()
    };

    let registry = settings.load_registry().context("loading tenant registry")?;
    let engine = silo_stages::reference_engine(
        Arc::new(silo_stages::reference_graph()?),
        Arc::new(silo_stages::reference_documents()?),
        Arc::new(settings.load_auditor().context("loading audit profile")?),
    );

    let mut ctx = RequestContext::new().with_document(cli.document);
    if let Some(subject) = cli.subject {
        ctx = ctx.with_subject(subject);
    }

    let scope = registry.activate(&cli.tenant)?;
    let cancel = CancelSignal::new();
    let _deadline = cancel.cancel_after(settings.run_timeout);

    let run = scope
        .run(engine.run(PipelineRequest::new(cli.query, cli.max_revisions), &ctx, &cancel))
        .await?
        .map_err(|failure| {
            for entry in &failure.audit_log {
                eprintln!(" - {entry}");
            }
            anyhow::Error::new(failure)
        })?;

    let terminal = run.terminal;
    let response = run.into_response();

    println!("{}", response.answer);
    println!();
    println!("Audit log (trace {}):", response.trace_id);
    for entry in &response.audit_log {
        println!(" - {entry}");
    }

    Ok(match terminal {
        Terminal::Verified => ExitCode::SUCCESS,
        Terminal::Unverified => {
            eprintln!("answer is unverified after {} revisions", response.revision_count);
            ExitCode::from(2)
        }
        Terminal::Cancelled(stage) => {
            eprintln!("run cancelled during {stage}");
            ExitCode::from(3)
        }
    })
}
