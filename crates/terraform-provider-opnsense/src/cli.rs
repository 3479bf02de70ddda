//! Clap derive structures for the provider plugin binary.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};

/// Registry address the host uses to match a reattached provider.
pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/browningluke/opnsense";

#[derive(Debug, Parser)]
#[command(
    name = "terraform-provider-opnsense",
    version,
    about = "Terraform provider plugin for OPNsense firewalls",
    long_about = "Terraform provider plugin for OPNsense firewalls.\n\n\
        Normally launched by Terraform, speaking newline-delimited JSON on\n\
        stdin/stdout. Use --debug to run it standalone and attach Terraform\n\
        through TF_REATTACH_PROVIDERS."
)]
pub struct Cli {
    /// Listen on a local TCP port and print reattach settings
    #[arg(long)]
    pub debug: bool,

    /// Log output format (logs always go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl Cli {
    /// Parse `args`, also accepting the single-dash `-debug` that plugin
    /// launch scripts use.
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(normalize_args(args))
    }
}

/// Rewrite single-dash long flags to their double-dash form.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if arg == "-debug" {
                OsString::from("--debug")
            } else {
                arg
            }
        })
        .collect()
}
