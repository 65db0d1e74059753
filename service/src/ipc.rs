//! Unix domain socket IPC listener.
//!
//! Accepts connections, reads newline-delimited JSON-RPC-lite messages, and
//! dispatches them to the [`RetentionService`].

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::PROTOCOL_VERSION;
use crate::manager::{RetentionService, ServiceError};
use crate::protocol::*;

/// Start the IPC listener. Each connection is served on its own task.
pub async fn serve(service: Arc<RetentionService>, listener: UnixListener) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let svc = Arc::clone(&service);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(svc, stream).await {
                        tracing::warn!("connection error: {e}");
                    }
                });
            }
            Err(e) => {
                tracing::error!("accept error: {e}");
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    service: Arc<RetentionService>,
    stream: UnixStream,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = dispatch_message(&service, trimmed).await;
        let mut bytes = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse and dispatch a single message.
async fn dispatch_message(service: &RetentionService, raw: &str) -> serde_json::Value {
    let request: RpcRequest = match serde_json::from_str(raw) {
        Ok(req) => req,
        Err(e) => {
            return serde_json::to_value(RpcError {
                id: 0,
                error: RpcErrorBody {
                    code: ERR_INVALID_REQUEST,
                    message: format!("invalid request: {e}"),
                },
            })
            .unwrap_or_default();
        }
    };

    let id = request.id;
    match dispatch_method(service, &request.method, request.params).await {
        Ok(result) => serde_json::to_value(RpcResponse { id, result }).unwrap_or_default(),
        Err((code, message)) => serde_json::to_value(RpcError {
            id,
            error: RpcErrorBody { code, message },
        })
        .unwrap_or_default(),
    }
}

async fn dispatch_method(
    service: &RetentionService,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, (i64, String)> {
    match method {
        "hello" => handle_hello(params),
        "config.get" => to_value(service.get_config().map_err(store_err)?),
        "config.set" => {
            let params: ConfigSetParams = parse_params(params)?;
            service
                .set_config(params.config.clone())
                .await
                .map_err(store_err)?;
            to_value(params.config)
        }
        "metrics.catalog" => to_value(MetricCatalogResult {
            metrics: RetentionService::metric_catalog(),
        }),
        "ignore.get" => {
            let params: IgnoreGetParams = parse_params(params)?;
            to_value(IgnoreGetResult {
                ignored: service.get_ignore(&params.ids.into_vec()),
            })
        }
        "ignore.set" => {
            let params: IgnoreSetParams = parse_params(params)?;
            let ids = params.ids.into_vec();
            service
                .set_ignore(&ids, params.ignore)
                .map_err(store_err)?;
            to_value(IgnoreGetResult {
                ignored: service.get_ignore(&ids),
            })
        }
        "blacklist.run" => {
            let params: BlacklistParams = parse_params(params)?;
            let blacklisted = service
                .blacklist(&params.ids.into_vec())
                .await
                .map_err(store_err)?;
            to_value(BlacklistResult { blacklisted })
        }
        "pass.run" => to_value(service.run_pass().await.map_err(store_err)?),
        _ => Err((ERR_METHOD_NOT_FOUND, format!("unknown method: {method}"))),
    }
}

fn handle_hello(params: Option<serde_json::Value>) -> Result<serde_json::Value, (i64, String)> {
    let hello: HelloParams = parse_params(params)?;
    if hello.protocol_version != PROTOCOL_VERSION {
        return Err((
            ERR_INVALID_PARAMS,
            format!(
                "incompatible protocol version: client={}, service={PROTOCOL_VERSION}",
                hello.protocol_version
            ),
        ));
    }
    to_value(HelloResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: vec![
            "config.get".to_string(),
            "config.set".to_string(),
            "metrics.catalog".to_string(),
            "ignore.get".to_string(),
            "ignore.set".to_string(),
            "blacklist.run".to_string(),
            "pass.run".to_string(),
        ],
    })
}

fn parse_params<T: DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, (i64, String)> {
    params
        .ok_or_else(|| (ERR_INVALID_PARAMS, "missing params".to_string()))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| (ERR_INVALID_PARAMS, format!("invalid params: {e}")))
        })
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, (i64, String)> {
    serde_json::to_value(value).map_err(|e| (ERR_INFRA, format!("serialize error: {e}")))
}

fn store_err(e: ServiceError) -> (i64, String) {
    (ERR_STORE, e.to_string())
}
