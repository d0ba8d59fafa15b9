//! trpc - send a single RPC call to a Transmission daemon.
//!
//! ```text
//! trpc <method> [arguments-json]
//! trpc session-get
//! trpc torrent-get '{"fields":["id","name"]}'
//! ```
//!
//! The endpoint and credentials come from `ClientConfig::load()`
//! (config file, then `TRANSMISSION_RPC_*` environment variables).

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transmission_rpc::{Arguments, ClientConfig, RpcClient};

const USAGE: &str = "Usage: trpc <method> [arguments-json]

Environment:
  TRANSMISSION_RPC_URL           RPC endpoint (default http://127.0.0.1:9091/transmission/rpc)
  TRANSMISSION_RPC_USERNAME      Basic auth username
  TRANSMISSION_RPC_PASSWORD      Basic auth password
  TRANSMISSION_RPC_TOKEN         Bearer token (takes precedence over username)
  TRANSMISSION_RPC_TIMEOUT_SECS  Per-call timeout in seconds (default 30)";

/// Parsed command line.
#[derive(Debug)]
struct Invocation {
    method: String,
    arguments: Option<Arguments>,
}

fn parse_args(args: &[String]) -> Result<Option<Invocation>> {
    match args {
        [] => bail!("missing RPC method\n\n{}", USAGE),
        [flag, ..] if flag == "-h" || flag == "--help" => Ok(None),
        [method] => Ok(Some(Invocation {
            method: method.clone(),
            arguments: None,
        })),
        [method, raw] => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("Arguments must be valid JSON")?;
            let serde_json::Value::Object(arguments) = value else {
                bail!("Arguments must be a JSON object, got: {}", raw);
            };
            Ok(Some(Invocation {
                method: method.clone(),
                arguments: Some(arguments),
            }))
        }
        _ => bail!("too many arguments\n\n{}", USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "transmission_rpc=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(invocation) = parse_args(&args)? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = ClientConfig::load().context("Failed to load configuration")?;
    let client = RpcClient::from_config(config);
    tracing::info!("Calling {} at {}", invocation.method, client.url());
    let response = client
        .call(&invocation.method, invocation.arguments)
        .await
        .with_context(|| format!("RPC call '{}' failed", invocation.method))?;

    let output = serde_json::to_string_pretty(&response.arguments)?;
    println!("{}", output);

    Ok(())
}
