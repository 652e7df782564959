use crate::config::ServerOptions;
use crate::contract::{load_contract, ContractRouter, HttpMethod};
use crate::dispatcher::Dispatcher;
use crate::echo::echo_router;
use crate::request::RawRequest;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Command-line interface for contract-router
#[derive(Parser, Debug)]
#[command(name = "contract-router")]
#[command(about = "Inspect and exercise route contracts", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every route in a contract
    Routes {
        /// Path to the contract file (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,

        /// Print a JSON array instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load a contract, resolve it and compile its route table
    Check {
        /// Path to the contract file (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,
    },
    /// Run one request through the dispatch pipeline using echo handlers
    Call {
        /// Path to the contract file (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: HttpMethod,

        /// Request path, optionally with a query string
        path: String,

        /// Header as `name:value` (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,

        /// Options file (YAML, JSON or TOML); CONTRACT_* variables apply on top
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check echoed responses against the declared response schemas
        #[arg(long, default_value_t = false)]
        validate_responses: bool,

        /// Decode query values as JSON
        #[arg(long, default_value_t = false)]
        json_query: bool,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name:value`, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_ascii_lowercase(), value.trim().to_string()))
}

/// Execute a parsed command and return what it prints.
///
/// # Errors
///
/// Returns an error if the contract cannot be loaded or resolved, the options
/// file is invalid, or the request has no matching route.
pub async fn execute(command: &Commands) -> anyhow::Result<String> {
    match command {
        Commands::Routes { contract, json } => {
            let dispatcher = echo_dispatcher(contract, ServerOptions::default())?;
            if *json {
                let routes: Vec<serde_json::Value> = dispatcher
                    .routes()
                    .map(|entry| {
                        serde_json::json!({
                            "operation": entry.operation(),
                            "method": entry.route.method.as_str(),
                            "path": entry.route.path,
                            "summary": entry.route.summary,
                            "deprecated": entry.route.deprecated,
                        })
                    })
                    .collect();
                return Ok(serde_json::to_string_pretty(&routes)?);
            }
            let mut out = String::new();
            for entry in dispatcher.routes() {
                let deprecated = if entry.route.deprecated { " (deprecated)" } else { "" };
                writeln!(
                    out,
                    "{:<7} {:<32} {}{}",
                    entry.route.method.as_str(),
                    entry.route.path,
                    entry.operation(),
                    deprecated
                )?;
            }
            Ok(out)
        }
        Commands::Check { contract } => {
            let dispatcher = echo_dispatcher(contract, ServerOptions::default())?;
            Ok(format!(
                "{}: {} routes OK\n",
                contract.display(),
                dispatcher.routes().count()
            ))
        }
        Commands::Call {
            contract,
            method,
            path,
            headers,
            body,
            config,
            validate_responses,
            json_query,
        } => {
            let mut options = match config {
                Some(file) => ServerOptions::from_file(file)?.with_env_overrides(),
                None => ServerOptions::from_env(),
            };
            options.validate_responses |= *validate_responses;
            options.json_query |= *json_query;
            let dispatcher = echo_dispatcher(contract, options)?;

            let (path, query) = match path.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (path.as_str(), None),
            };
            let mut raw = RawRequest::new(*method, path);
            if let Some(query) = query {
                raw = raw.query_string(query);
            }
            for (name, value) in headers {
                raw = raw.header(name.clone(), value.clone());
            }
            if let Some(body) = body {
                let body = serde_json::from_str(body).context("--body is not valid JSON")?;
                raw = raw.body(body);
            }

            let outcome = dispatcher.handle(raw).await?;
            tracing::info!(
                method = %method,
                path,
                status = outcome.response.status_code,
                state = ?outcome.final_state,
                "Request dispatched"
            );
            Ok(serde_json::to_string_pretty(&outcome.response)?)
        }
    }
}

fn echo_dispatcher(contract: &Path, options: ServerOptions) -> anyhow::Result<Dispatcher> {
    let router: ContractRouter = load_contract(contract)?;
    Dispatcher::from_router(&router, &echo_router(&router), options)
        .with_context(|| format!("failed to build routes for {}", contract.display()))
}

/// Parse the command line, run the command and print its output.
///
/// # Errors
///
/// See [`execute`].
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let output = runtime.block_on(execute(&cli.command))?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
