// ── Plugin protocol server ──
//
// Newline-delimited JSON over any byte stream. Each line in is one
// request `{"id", "method", "params"}`; each line out is the matching
// response `{"id", "schema"?, "state", "diagnostics"}`. Requests run
// concurrently, one task each, so responses may come back out of order.
// A single writer task owns the output stream.

use std::io;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::diag::Diagnostics;
use crate::handler::Outcome;
use crate::provider::{OpnsenseProvider, ProviderSchema};

// ── Messages ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum Method {
    GetProviderSchema,
    ConfigureProvider,
    ValidateResourceConfig,
    ValidateDataSourceConfig,
    ReadResource,
    CreateResource,
    UpdateResource,
    DeleteResource,
    ImportResourceState,
    ReadDataSource,
    StopProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ProviderSchema>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl Response {
    fn new(id: Value, outcome: Outcome) -> Self {
        Self {
            id,
            schema: None,
            state: outcome.state,
            diagnostics: outcome.diagnostics,
        }
    }

    fn error(id: Value, summary: &str, detail: impl Into<String>) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(summary, detail);
        Self::new(id, diagnostics.into())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigureParams {
    #[serde(default)]
    config: Value,
}

#[derive(Debug, Deserialize)]
struct ConfigParams {
    type_name: String,
    #[serde(default)]
    config: Value,
}

#[derive(Debug, Deserialize)]
struct StateParams {
    type_name: String,
    #[serde(default)]
    state: Value,
}

#[derive(Debug, Deserialize)]
struct PlanParams {
    type_name: String,
    #[serde(default)]
    plan: Value,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    type_name: String,
    #[serde(default)]
    plan: Value,
    #[serde(default)]
    prior_state: Value,
}

#[derive(Debug, Deserialize)]
struct ImportParams {
    type_name: String,
    id: String,
}

fn decode_params<T: DeserializeOwned>(method: Method, params: Value) -> Result<T, Diagnostics> {
    serde_json::from_value(params).map_err(|e| {
        let mut diags = Diagnostics::new();
        diags.add_error(
            "Invalid Request Parameters",
            format!("{method} parameters could not be decoded: {e}"),
        );
        diags
    })
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Handle one decoded request.
pub async fn handle(provider: &OpnsenseProvider, request: Request) -> Response {
    let Request { id, method, params } = request;
    let Ok(method) = method.parse::<Method>() else {
        warn!(%id, %method, "unknown method");
        return Response::error(
            id,
            "Unknown Method",
            format!("The provider does not implement the method \"{method}\""),
        );
    };
    debug!(%id, %method, "handling request");

    match method {
        Method::GetProviderSchema => Response {
            schema: Some(provider.schema()),
            ..Response::new(id, Outcome::default())
        },
        Method::StopProvider => {
            provider.stop();
            Response::new(id, Outcome::default())
        }
        _ => {
            let outcome = dispatch(provider, method, params)
                .await
                .unwrap_or_else(Outcome::from);
            Response::new(id, outcome)
        }
    }
}

async fn dispatch(
    provider: &OpnsenseProvider,
    method: Method,
    params: Value,
) -> Result<Outcome, Diagnostics> {
    let outcome = match method {
        Method::ConfigureProvider => {
            let p: ConfigureParams = decode_params(method, params)?;
            provider.configure(p.config).into()
        }
        Method::ValidateResourceConfig => {
            let p: ConfigParams = decode_params(method, params)?;
            provider.validate_resource(&p.type_name, p.config).into()
        }
        Method::ValidateDataSourceConfig => {
            let p: ConfigParams = decode_params(method, params)?;
            provider.validate_data_source(&p.type_name, p.config).into()
        }
        Method::ReadResource => {
            let p: StateParams = decode_params(method, params)?;
            provider.read_resource(&p.type_name, p.state).await
        }
        Method::CreateResource => {
            let p: PlanParams = decode_params(method, params)?;
            provider.create_resource(&p.type_name, p.plan).await
        }
        Method::UpdateResource => {
            let p: UpdateParams = decode_params(method, params)?;
            provider
                .update_resource(&p.type_name, p.plan, p.prior_state)
                .await
        }
        Method::DeleteResource => {
            let p: StateParams = decode_params(method, params)?;
            provider.delete_resource(&p.type_name, p.state).await.into()
        }
        Method::ImportResourceState => {
            let p: ImportParams = decode_params(method, params)?;
            provider.import_resource(&p.type_name, &p.id)
        }
        Method::ReadDataSource => {
            let p: ConfigParams = decode_params(method, params)?;
            provider.read_data_source(&p.type_name, p.config).await
        }
        Method::GetProviderSchema | Method::StopProvider => Outcome::default(),
    };
    Ok(outcome)
}

// ── Serve loop ──────────────────────────────────────────────────────

/// Serve requests from `reader` until EOF, a read error, or until the
/// provider is stopped, then drain in-flight requests and flush their
/// responses. Lines that are not a valid request, including invalid
/// UTF-8, are answered with a null-id error and serving continues.
pub async fn serve<R, W>(provider: OpnsenseProvider, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let cancel = provider.cancellation();
    let (tx, rx) = mpsc::unbounded_channel::<Response>();
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut tasks = JoinSet::new();

    let result = loop {
        line.clear();
        let read = tokio::select! {
            () = cancel.cancelled() => break Ok(()),
            read = reader.read_until(b'\n', &mut line) => read,
        };
        match read {
            Ok(0) => {
                debug!("input closed");
                break Ok(());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "reading requests failed");
                break Err(e);
            }
        }
        if line.trim_ascii().is_empty() {
            continue;
        }

        let request = match serde_json::from_slice::<Request>(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "undecodable request");
                let _ = tx.send(Response::error(
                    Value::Null,
                    "Invalid Request",
                    format!("The request could not be decoded: {e}"),
                ));
                continue;
            }
        };

        let provider = provider.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            let response = handle(&provider, request).await;
            // Only fails once the writer has gone away.
            let _ = tx.send(response);
        });
        while tasks.try_join_next().is_some() {}
    };

    // In-flight requests still get answered after a read failure.
    while tasks.join_next().await.is_some() {}
    drop(tx);
    info!("server stopped");
    let written = writer_task.await.map_err(io::Error::other)?;
    result.and(written)
}

async fn write_responses<W: AsyncWrite + Unpin>(
    writer: W,
    mut rx: mpsc::UnboundedReceiver<Response>,
) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response).map_err(io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
