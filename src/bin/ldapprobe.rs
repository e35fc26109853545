//! Run the LDAP conformance catalog, iterations, mutations or a load test against a server.
//!
//! Usage:
//!   ldapprobe --host 10.0.0.5 --suites 1.1.1,2.1.3
//!   ldapprobe --host 10.0.0.5 --mode iteration --iterations 5
//!   ldapprobe --host 10.0.0.5 --mode mutation --mutations 200 --mutation-kind targeted --seed 7
//!   ldapprobe --host 10.0.0.5 --mode load --duration 60 --output load.json
//!   ldapprobe --host 10.0.0.5 --preflight --suites 1
//!
//! Logging follows `RUST_LOG`; `-v` raises the default level to debug.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ldapprobe::config::{self, Mode, RunConfig, TransportKind};
use ldapprobe::engine::{self, Engine, RunStatus};
use ldapprobe::mutate::MutationEngine;
use ldapprobe::report::{self, Report};
use ldapprobe::TcpTransport;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, info_span};

#[derive(Parser, Debug)]
#[command(name = "ldapprobe", about = "LDAP/BER protocol-conformance tester")]
struct Args {
    /// Target host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Target port
    #[arg(long, default_value_t = 389)]
    port: u16,

    /// Per-operation timeout in seconds
    #[arg(long, default_value_t = 5.0)]
    timeout: f64,

    /// Delay between cases in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// `all`, a section number (1 or 2), or comma-separated suite ids
    #[arg(long, default_value = "all")]
    suites: String,

    /// single, iteration, mutation or load
    #[arg(long, default_value = "single")]
    mode: String,

    /// Repetitions per case in iteration mode
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Number of mutations in mutation mode
    #[arg(long, default_value_t = 100)]
    mutations: usize,

    /// random or targeted
    #[arg(long, default_value = "random")]
    mutation_kind: String,

    /// Seed for random mutations
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Load test duration in seconds
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Check that the target answers binds and searches before testing
    #[arg(long, default_value_t = false)]
    preflight: bool,

    /// Skip the health probe after connection loss
    #[arg(long, default_value_t = false)]
    no_health_check: bool,

    /// stream or raw
    #[arg(long, default_value = "stream")]
    transport: String,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = 65536)]
    max_response: usize,

    /// Write the JSON report here
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn run_config(args: &Args) -> Result<RunConfig> {
    let mode = match args.mode.trim().to_ascii_lowercase().as_str() {
        "single" => Mode::Single,
        "iteration" => Mode::Iteration { iterations: args.iterations },
        "mutation" => Mode::Mutation {
            count: args.mutations,
            kind: config::parse_mutation_kind(&args.mutation_kind)?,
            seed: args.seed,
        },
        "load" => Mode::Load { duration: Duration::from_secs(args.duration) },
        other => return Err(config::ConfigError::UnknownMode(other.to_string()).into()),
    };
    let timeout = Duration::try_from_secs_f64(args.timeout).context("invalid --timeout")?;
    let cfg = RunConfig {
        host: args.host.clone(),
        port: args.port,
        timeout,
        delay: Duration::from_millis(args.delay_ms),
        catalog: config::parse_suites(&args.suites)?,
        mode,
        health_check: !args.no_health_check,
        transport: args.transport.parse::<TransportKind>()?,
        max_response_size: args.max_response,
        output: args.output.clone(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "ldapprobe=debug" } else { "ldapprobe=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let cfg = run_config(&args)?;
    let span = info_span!("run", target = %cfg.target(), mode = cfg.mode.name());
    let mut engine = Engine::new(TcpTransport::new(), cfg.engine_config(), span);

    if args.preflight {
        let checks = engine.preflight();
        let passed = checks.iter().filter(|c| c.passed).count();
        for check in &checks {
            eprintln!("[{}] {}: {}", if check.passed { "PASS" } else { "FAIL" }, check.name, check.note);
        }
        if !engine::preflight_ready(&checks) {
            bail!("target {} failed preflight ({}/{} checks passed)", cfg.target(), passed, checks.len());
        }
        info!(passed, total = checks.len(), "preflight done");
    }

    let status = match &cfg.mode {
        Mode::Single => engine.run_catalog(&cfg.catalog).status,
        Mode::Iteration { iterations } => engine.run_iterations(&cfg.catalog.cases(), *iterations).status,
        Mode::Mutation { count, kind, seed } => {
            let mutations = MutationEngine::new(*seed).generate(*kind, &cfg.catalog.cases(), *count);
            info!(generated = mutations.len(), kind = %kind, seed, "mutations ready");
            engine.run_mutations(mutations).status
        }
        Mode::Load { duration } => {
            let load = engine.run_load(&cfg.catalog.cases(), *duration);
            info!(
                requests = load.requests,
                rate = load.requests_per_sec,
                mean_response_secs = load.mean_response_secs,
                "load summary"
            );
            load.status
        }
    };

    let summary = report::Summary::from_results(engine.results());
    info!(total = summary.total, statuses = ?summary.status_counts, status = %status, "run finished");

    if let Some(path) = &cfg.output {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let doc = Report::new(cfg.target(), cfg.mode.name(), &status, engine.results());
        report::write_json(&doc, BufWriter::new(file)).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if let RunStatus::Aborted { after } = &status {
        eprintln!("Run aborted after {}: target stopped responding", after);
    }
    Ok(())
}
