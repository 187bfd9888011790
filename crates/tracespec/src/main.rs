mod client;
mod mcp;
mod output;
mod protocol;
mod query_server;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracespec_core::config::Config;
use tracespec_core::model::spec::TraceSpecification;
use tracespec_core::query::{CompareRequest, TraceRequest, TracesRequest};
use tracespec_core::time::parse_time_or_relative;
use tracespec_store::Store;
use tracespec_store::load::{Document, read_documents};

use crate::client::QueryClient;
use crate::mcp::McpServer;
use crate::output::{
    print_analysis_human, print_comparison_human, print_ingested_human, print_spec_defined_human,
    print_specs_human, print_status_human, print_trace_human, print_traces_human,
};
use crate::protocol::{ApiRequest, ApiResponse};
use crate::telemetry::{init_cli_tracing, init_serve_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "tracespec")]
#[command(about = "Validate traces against declarative trace specifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    uds: Option<PathBuf>,

    #[arg(long, global = true)]
    addr: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the query server with traces and specs loaded from disk")]
    Serve {
        #[arg(long)]
        trace_dir: Option<PathBuf>,
        #[arg(long)]
        spec_dir: Option<PathBuf>,
        #[arg(long)]
        query_tcp_addr: Option<String>,
        #[arg(long)]
        query_uds_path: Option<PathBuf>,
    },
    #[command(about = "Validate a trace file against a specification file offline")]
    Check {
        #[arg(long)]
        trace: PathBuf,
        #[arg(long)]
        spec: PathBuf,
        #[arg(long, help = "Trace to pick when the trace file holds several")]
        trace_id: Option<String>,
        #[arg(long, help = "Specification to pick when the spec file holds several")]
        spec_name: Option<String>,
        #[arg(long, help = "Exit with status 1 when the trace does not match")]
        fail_on_mismatch: bool,
    },
    #[command(about = "List stored traces")]
    Traces {
        #[arg(long)]
        service: Option<String>,
        #[arg(long, help = "RFC3339 time or lookback duration (e.g. 1h)")]
        since: Option<String>,
    },
    #[command(about = "Show a stored trace")]
    Trace { trace_id: String },
    #[command(about = "Summarize services, operations and timing of a stored trace")]
    Analyze { trace_id: String },
    #[command(about = "List registered specifications")]
    Specs,
    #[command(about = "Register a specification from a JSON file")]
    Define { file: PathBuf },
    #[command(about = "Store traces from a JSON file")]
    Ingest { file: PathBuf },
    #[command(about = "Compare a stored trace against a registered specification")]
    Compare {
        trace_id: String,
        spec_name: String,
        #[arg(long, help = "Exit with status 1 when the trace does not match")]
        fail_on_mismatch: bool,
    },
    Status,
    #[command(about = "Serve the trace tools over MCP stdio")]
    Mcp {
        #[arg(long)]
        trace_dir: Option<PathBuf>,
        #[arg(long)]
        spec_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            trace_dir,
            spec_dir,
            query_tcp_addr,
            query_uds_path,
        } => {
            init_serve_tracing();
            let mut cfg = Config::load().context("load config")?;
            if trace_dir.is_some() {
                cfg.trace_dir = trace_dir;
            }
            if spec_dir.is_some() {
                cfg.spec_dir = spec_dir;
            }
            if let Some(v) = query_tcp_addr {
                cfg.query_tcp_addr = v;
            }
            if let Some(v) = query_uds_path {
                cfg.uds_path = v;
            }
            run_server(cfg).await
        }
        Commands::Check {
            trace,
            spec,
            trace_id,
            spec_name,
            fail_on_mismatch,
        } => {
            init_cli_tracing();
            let matches = run_check(&trace, &spec, trace_id, spec_name, cli.json)?;
            exit_on_mismatch(fail_on_mismatch, matches);
            Ok(())
        }
        Commands::Traces { service, since } => {
            init_cli_tracing();
            let since = since.map(|v| parse_time_or_relative(&v)).transpose()?;
            let req = ApiRequest::Traces(TracesRequest {
                service_name: service,
                since,
            });
            send(cli.uds, cli.addr, req, cli.json).await.map(|_| ())
        }
        Commands::Trace { trace_id } => {
            init_cli_tracing();
            let req = ApiRequest::Trace(TraceRequest { trace_id });
            send(cli.uds, cli.addr, req, cli.json).await.map(|_| ())
        }
        Commands::Analyze { trace_id } => {
            init_cli_tracing();
            let req = ApiRequest::Analyze(TraceRequest { trace_id });
            send(cli.uds, cli.addr, req, cli.json).await.map(|_| ())
        }
        Commands::Specs => {
            init_cli_tracing();
            send(cli.uds, cli.addr, ApiRequest::Specs, cli.json)
                .await
                .map(|_| ())
        }
        Commands::Define { file } => {
            init_cli_tracing();
            let spec = read_spec_payload(&file)?;
            send(cli.uds, cli.addr, ApiRequest::DefineSpec(spec), cli.json)
                .await
                .map(|_| ())
        }
        Commands::Ingest { file } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            for doc in read_documents(&file)? {
                let Document::Trace(trace) = doc else {
                    anyhow::bail!(
                        "{} contains a specification; use `tracespec define`",
                        file.display()
                    );
                };
                let response = client.request(ApiRequest::IngestTrace(trace)).await?;
                print_response(response, cli.json)?;
            }
            Ok(())
        }
        Commands::Compare {
            trace_id,
            spec_name,
            fail_on_mismatch,
        } => {
            init_cli_tracing();
            let req = ApiRequest::Compare(CompareRequest {
                trace_id,
                spec_name,
            });
            let response = send(cli.uds, cli.addr, req, cli.json).await?;
            if let ApiResponse::Comparison(result) = &response {
                exit_on_mismatch(fail_on_mismatch, result.matches_specification);
            }
            Ok(())
        }
        Commands::Status => {
            init_cli_tracing();
            send(cli.uds, cli.addr, ApiRequest::Status, cli.json)
                .await
                .map(|_| ())
        }
        Commands::Mcp {
            trace_dir,
            spec_dir,
        } => {
            init_cli_tracing();
            let mut cfg = Config::load().context("load config")?;
            if trace_dir.is_some() {
                cfg.trace_dir = trace_dir;
            }
            if spec_dir.is_some() {
                cfg.spec_dir = spec_dir;
            }
            let store = open_store(&cfg)?;
            McpServer::new(store, cfg.default_lookback_hours())
                .run()
                .await
        }
    }
}

async fn send(
    uds: Option<PathBuf>,
    addr: Option<String>,
    req: ApiRequest,
    json: bool,
) -> anyhow::Result<ApiResponse> {
    let mut client = QueryClient::connect(uds, addr).await?;
    let response = client.request(req).await?;
    print_response(response.clone(), json)?;
    Ok(response)
}

fn exit_on_mismatch(fail_on_mismatch: bool, matches: bool) {
    if fail_on_mismatch && !matches {
        std::process::exit(1);
    }
}

fn open_store(cfg: &Config) -> anyhow::Result<Store> {
    let store = Store::in_memory();
    for dir in [&cfg.trace_dir, &cfg.spec_dir].into_iter().flatten() {
        store
            .load_dir(dir)
            .with_context(|| format!("load documents from {}", dir.display()))?;
    }
    Ok(store)
}

fn read_spec_payload(path: &Path) -> anyhow::Result<TraceSpecification> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read specification {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse specification {}", path.display()))
}

fn run_check(
    trace_path: &Path,
    spec_path: &Path,
    trace_id: Option<String>,
    spec_name: Option<String>,
    json: bool,
) -> anyhow::Result<bool> {
    let store = Store::in_memory();
    store
        .load_file(trace_path)
        .with_context(|| format!("load {}", trace_path.display()))?;
    store
        .load_file(spec_path)
        .with_context(|| format!("load {}", spec_path.display()))?;

    let trace_id = match trace_id {
        Some(id) => id,
        None => sole(
            store
                .list_traces(&TracesRequest::default())?
                .into_iter()
                .map(|t| t.trace_id),
            "trace",
        )?,
    };
    let spec_name = match spec_name {
        Some(name) => name,
        None => sole(store.list_specs().into_iter().map(|s| s.name), "specification")?,
    };

    let result = store.compare(&CompareRequest {
        trace_id,
        spec_name,
    })?;
    let matches = result.matches_specification;
    print_response(ApiResponse::Comparison(result), json)?;
    Ok(matches)
}

fn sole(mut names: impl Iterator<Item = String>, kind: &str) -> anyhow::Result<String> {
    match (names.next(), names.next()) {
        (Some(name), None) => Ok(name),
        (None, _) => anyhow::bail!("no {kind} found in the given files"),
        (Some(first), Some(second)) => anyhow::bail!(
            "several {kind}s found ({first}, {second}, ...); pick one explicitly"
        ),
    }
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    let store = open_store(&cfg)?;
    let status = store.status();

    eprintln!("tracespec serve");
    eprintln!("  traces: {}", status.traces_count);
    eprintln!("  specs: {}", status.specs_count);
    eprintln!("  query uds: {}", cfg.uds_path.display());
    eprintln!("  query tcp: {}", cfg.query_tcp_addr);

    let query_task = tokio::spawn(query_server::run_query_server(
        store,
        cfg.uds_path.clone(),
        cfg.query_tcp_addr
            .parse()
            .with_context(|| format!("parse query tcp addr {}", cfg.query_tcp_addr))?,
    ));

    tokio::select! {
        res = query_task => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    shutdown_tracing();
    Ok(())
}

fn print_response(response: ApiResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&response.payload()?)?);
        return Ok(());
    }

    match response {
        ApiResponse::Traces(v) => print_traces_human(&v),
        ApiResponse::Trace(v) => print_trace_human(&v),
        ApiResponse::Analysis(v) => print_analysis_human(&v),
        ApiResponse::Specs(v) => print_specs_human(&v),
        ApiResponse::SpecDefined(v) => print_spec_defined_human(&v),
        ApiResponse::TraceIngested(v) => print_ingested_human(&v),
        ApiResponse::Comparison(v) => print_comparison_human(&v),
        ApiResponse::Status(v) => print_status_human(&v),
        ApiResponse::Error(e) => eprintln!("error: {e}"),
    }
    Ok(())
}
