mod cli;
mod error;

use std::net::SocketAddr;

use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use opnsense_provider::{OpnsenseProvider, serve};

use crate::cli::{Cli, LogFormat, PROVIDER_ADDRESS};
use crate::error::PluginError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args(std::env::args_os());
    init_tracing(cli.debug, cli.log_format);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            1
        }
    };
    // A pending stdin read sits on a blocking thread that runtime
    // shutdown would wait for.
    std::process::exit(code);
}

/// Logs go to stderr; stdout belongs to the protocol.
fn init_tracing(debug: bool, format: LogFormat) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), PluginError> {
    let provider = OpnsenseProvider::new();

    let on_signal = provider.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.stop();
        }
    });

    if cli.debug {
        serve_debug(provider).await
    } else {
        info!(version = env!("CARGO_PKG_VERSION"), "serving on stdio");
        serve(provider, tokio::io::stdin(), tokio::io::stdout())
            .await
            .map_err(PluginError::Transport)
    }
}

async fn serve_debug(provider: OpnsenseProvider) -> Result<(), PluginError> {
    let bind = "127.0.0.1:0";
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|source| PluginError::Bind {
            addr: bind.into(),
            source,
        })?;
    let addr = listener.local_addr().map_err(|source| PluginError::Bind {
        addr: bind.into(),
        source,
    })?;

    println!(
        "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS environment variable with the following:\n"
    );
    println!("\tTF_REATTACH_PROVIDERS='{}'", reattach_config(addr));

    let cancel = provider.cancellation();
    let (stream, peer) = tokio::select! {
        () = cancel.cancelled() => return Ok(()),
        accepted = listener.accept() => accepted.map_err(PluginError::Accept)?,
    };
    info!(%peer, "host attached");

    let (reader, writer) = stream.into_split();
    serve(provider, reader, writer)
        .await
        .map_err(PluginError::Transport)
}

fn reattach_config(addr: SocketAddr) -> String {
    json!({
        PROVIDER_ADDRESS: {
            "Protocol": "ndjson",
            "Addr": { "Network": "tcp", "String": addr.to_string() }
        }
    })
    .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::normalize_args;

    #[test]
    fn reattach_config_matches_host_format() {
        let addr: SocketAddr = "127.0.0.1:41231".parse().unwrap();
        let config: serde_json::Value = serde_json::from_str(&reattach_config(addr)).unwrap();
        assert_eq!(
            config,
            json!({
                "registry.terraform.io/browningluke/opnsense": {
                    "Protocol": "ndjson",
                    "Addr": { "Network": "tcp", "String": "127.0.0.1:41231" }
                }
            })
        );
    }

    #[test]
    fn cli_defaults_to_text_logs_on_stdio() {
        let cli = Cli::try_parse_from(["terraform-provider-opnsense"]).unwrap();
        assert!(!cli.debug);
        assert_eq!(cli.log_format, LogFormat::Text);

        let cli =
            Cli::try_parse_from(["terraform-provider-opnsense", "--debug", "--log-format", "json"])
                .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn single_dash_debug_is_accepted() {
        let args = normalize_args(["terraform-provider-opnsense", "-debug"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.debug);

        let args = normalize_args(["terraform-provider-opnsense", "-debugx"]);
        assert!(Cli::try_parse_from(args).is_err());
    }
}
