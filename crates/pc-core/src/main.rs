//! probcalc - discrete distribution calculator
//!
//! The entry point handles:
//! - One-shot evaluation from the command line
//! - Serving the JSON API over HTTP
//! - Inspecting the resolved configuration

use clap::{Args, Parser, Subcommand};
use pc_common::{format_error_human, Error, OutputFormat, StructuredError};
use pc_core::api::{check_limits, parse_request};
use pc_core::config::{load_config, ConfigOptions, ResolvedConfig};
use pc_core::engine::evaluate;
use pc_core::exit_codes::ExitCode;
use pc_core::logging::{generate_request_id, init_logging, LogConfig, LogFormat, LogLevel};
use pc_core::output::render;
use pc_core::server::ApiServer;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::{debug, info};

/// probcalc - PMFs, moments and tail probabilities for discrete distributions
#[derive(Parser)]
#[command(name = "probcalc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (overrides PROBCALC_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (overrides PROBCALC_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one distribution query
    Compute(ComputeArgs),

    /// Serve the JSON API over HTTP
    Serve(ServeArgs),

    /// Print the resolved configuration
    Config,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    /// Distribution family: binomial, negbin, geometric, poisson
    #[arg(long, short = 'd')]
    distribution: String,

    /// Number of trials (binomial)
    #[arg(long)]
    n: Option<f64>,

    /// Success probability (binomial, negbin, geometric)
    #[arg(long)]
    p: Option<f64>,

    /// Required successes (negbin)
    #[arg(long)]
    r: Option<f64>,

    /// Rate (poisson)
    #[arg(long)]
    lam: Option<f64>,

    /// Comparator: exact, <=, >=
    #[arg(long, short = 'c')]
    comparator: String,

    /// Outcome the comparator is applied to
    #[arg(long, short = 't', allow_negative_numbers = true)]
    target: i64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (overrides config and PROBCALC_BIND)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config and PROBCALC_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    log_config.level = log_config
        .level
        .adjusted(cli.global.verbose, cli.global.quiet);
    init_logging(&log_config);

    let result = match &cli.command {
        Commands::Compute(args) => run_compute(&cli.global, args),
        Commands::Serve(args) => run_serve(&cli.global, args),
        Commands::Config => run_config(&cli.global),
        Commands::Version => run_version(&cli.global),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            report_error(&cli.global, &err);
            ExitCode::from_error(&err)
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn report_error(global: &GlobalOpts, err: &Error) {
    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Md | OutputFormat::Summary => eprintln!("{}", format_error_human(err)),
    }
}

fn resolve(global: &GlobalOpts, serve: Option<&ServeArgs>) -> pc_common::Result<ResolvedConfig> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
        bind: serve.and_then(|s| s.bind.clone()),
        port: serve.and_then(|s| s.port),
        workers: serve.and_then(|s| s.workers),
    };
    let resolved = load_config(&options)?;
    debug!(source = %resolved.source, path = ?resolved.path, "configuration resolved");
    Ok(resolved)
}

fn run_compute(global: &GlobalOpts, args: &ComputeArgs) -> pc_common::Result<()> {
    let resolved = resolve(global, None)?;
    let request_id = generate_request_id();

    // Same validation path as an HTTP body.
    let mut body = Map::new();
    body.insert("distribution".into(), Value::from(args.distribution.clone()));
    body.insert("comparator".into(), Value::from(args.comparator.clone()));
    body.insert("target".into(), Value::from(args.target));
    for (name, value) in [("n", args.n), ("p", args.p), ("r", args.r), ("lam", args.lam)] {
        if let Some(v) = value {
            body.insert(name.into(), json!(v));
        }
    }

    let query = parse_request(&Value::Object(body))?;
    check_limits(&query.distribution, &resolved.server.limits())?;
    let evaluation = evaluate(&query)?;
    debug!(
        request_id = %request_id,
        distribution = %query.distribution,
        probability = evaluation.probability,
        "compute finished"
    );

    println!("{}", render(&query, &evaluation, global.format)?);
    Ok(())
}

fn run_serve(global: &GlobalOpts, args: &ServeArgs) -> pc_common::Result<()> {
    let resolved = resolve(global, Some(args))?;
    let server = ApiServer::start(&resolved.server)?;
    info!(addr = %server.addr(), "listening; press Ctrl-C to stop");
    server.wait();
    Ok(())
}

fn run_config(global: &GlobalOpts) -> pc_common::Result<()> {
    let resolved = resolve(global, None)?;
    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Md | OutputFormat::Summary => {
            let server = &resolved.server;
            println!("source: {}", resolved.source);
            if let Some(path) = &resolved.path {
                println!("path: {}", path.display());
            }
            println!("bind: {}:{}", server.bind, server.port);
            println!("workers: {}", server.workers);
            println!("max_body_bytes: {}", server.max_body_bytes);
            println!("max_support_points: {}", server.max_support_points);
        }
    }
    Ok(())
}

fn run_version(global: &GlobalOpts) -> pc_common::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "name": "probcalc", "version": version }))?
        ),
        OutputFormat::Md | OutputFormat::Summary => println!("probcalc {}", version),
    }
    Ok(())
}
