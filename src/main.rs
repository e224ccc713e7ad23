//! Teller command line entry point
//!
//! `teller run` feeds a batch of queries through the bank assistant,
//! `teller ask` routes a single query and `teller config` validates the
//! configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use teller::batch::{BatchRunner, DEFAULT_QUERIES};
use teller::config::TellerConfig;
use teller::context::BankContext;
use teller::llm::{OpenAiConfig, OpenAiProvider, ProviderCompletionClient};
use teller::observability::init_default_logging;
use teller::routing::Router;
use teller::TellerError;
use tracing::{error, info, warn};

/// Guardrail-gated bank assistant
#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "Guardrail-gated multi-agent bank assistant")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "TELLER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of queries (the demo queries unless --query is given)
    Run {
        /// Query to run; repeat for several
        #[arg(short, long = "query", value_name = "QUERY")]
        queries: Vec<String>,

        /// Give every query its own fresh account instead of sharing one
        #[arg(long)]
        isolated: bool,
    },
    /// Route a single query
    Ask {
        query: String,

        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Also check the completion endpoint is reachable with the configured key
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { queries, isolated } => run_batch(&config, queries, isolated).await,
        Commands::Ask { query, json } => ask(&config, &query, json).await,
        Commands::Config { show, check } => handle_config_command(&config, show, check).await,
    };

    if let Err(e) = result {
        error!(fatal = e.is_fatal(), "Command failed: {}", e.user_message());
        process::exit(e.exit_code());
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<TellerConfig, TellerError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(TellerConfig::load_from_file(path)?)
        }
        None => {
            for path_str in ["teller.toml", "config/teller.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(TellerConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using defaults");
            Ok(TellerConfig::default())
        }
    }
}

fn build_client(config: &TellerConfig) -> Result<ProviderCompletionClient, TellerError> {
    let api_key = config.get_llm_api_key()?;
    let provider = OpenAiProvider::new(OpenAiConfig::from_section(&config.llm, api_key))?;
    Ok(ProviderCompletionClient::new(Arc::new(provider))
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens))
}

fn build_router(config: &TellerConfig) -> Result<Router, TellerError> {
    Router::from_config(config, Arc::new(build_client(config)?))
}

async fn run_batch(
    config: &TellerConfig,
    queries: Vec<String>,
    isolated: bool,
) -> Result<(), TellerError> {
    let router = build_router(config)?;
    let runner = BatchRunner::new(router, config.router.start_agent.clone());

    let queries: Vec<String> = if queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        queries
    };

    let opening = BankContext::new(config.bank.opening_balance);
    let entries = if isolated {
        runner.run_isolated(&queries, &opening).await
    } else {
        let mut context = opening;
        runner.run_sequential(&queries, &mut context).await
    };

    for entry in &entries {
        println!("{}\n", entry.render());
    }

    let failed = entries.iter().filter(|e| e.is_error()).count();
    if failed > 0 {
        warn!(failed, total = entries.len(), "Some queries did not complete");
    }
    Ok(())
}

async fn ask(config: &TellerConfig, query: &str, json: bool) -> Result<(), TellerError> {
    let router = build_router(config)?;
    let mut context = BankContext::new(config.bank.opening_balance);
    let result = router
        .route(&config.router.start_agent, query, &mut context)
        .await?;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| TellerError::invariant(format!("run result not serialisable: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{}", result.final_output);
    }
    Ok(())
}

async fn handle_config_command(
    config: &TellerConfig,
    show: bool,
    check: bool,
) -> Result<(), TellerError> {
    config.validate()?;
    Router::from_config(config, Arc::new(NoCompletion))?;

    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| TellerError::configuration(format!("cannot render configuration: {e}")))?;
        println!("{rendered}");
    }

    if check {
        build_client(config)?.health_check().await?;
        info!(base_url = %config.llm.base_url, "Completion endpoint reachable");
    } else if config.get_llm_api_key().is_err() {
        warn!(
            "{} is not set; `run` and `ask` will fail until it is",
            config.llm.api_key_env
        );
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Stand-in client for validating the agent graph without credentials
struct NoCompletion;

#[async_trait::async_trait]
impl teller::llm::CompletionClient for NoCompletion {
    async fn complete(
        &self,
        _call: teller::llm::CompletionCall,
    ) -> Result<String, teller::llm::LlmError> {
        Err(teller::llm::LlmError::NotConfigured(
            "configuration check only".to_string(),
        ))
    }
}
