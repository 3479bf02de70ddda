//! Startup and transport failures, rendered with miette.

use std::io;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PluginError {
    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(opnsense::bind_failed),
        help("Debug mode binds an ephemeral loopback port; check local firewall or sandbox rules.")
    )]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept the Terraform connection")]
    #[diagnostic(code(opnsense::accept_failed))]
    Accept(#[source] io::Error),

    #[error("Plugin transport failed")]
    #[diagnostic(
        code(opnsense::transport),
        help("The host closed or corrupted the connection. Re-run with RUST_LOG=debug for details.")
    )]
    Transport(#[source] io::Error),
}
