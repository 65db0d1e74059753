//! JSON-RPC-lite protocol types for the operator surface.
//!
//! Newline-delimited JSON over a Unix domain socket. Every operation is
//! side-effect-free on failure: an error response means nothing was changed.

use seedcull_core::config::RetentionConfig;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error codes (JSON-RPC error.code)
// ─────────────────────────────────────────────────────────────────────────────

/// Standard JSON-RPC errors.
pub const ERR_INVALID_REQUEST: i64 = -32600;
pub const ERR_METHOD_NOT_FOUND: i64 = -32601;
pub const ERR_INVALID_PARAMS: i64 = -32602;

/// Service-specific error codes.
pub const ERR_STORE: i64 = 100;
pub const ERR_INFRA: i64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Envelopes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: i64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: i64,
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub id: i64,
    pub error: RpcErrorBody,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloParams {
    pub protocol_version: String,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResult {
    pub protocol_version: String,
    pub service_version: String,
    pub capabilities: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// One id or a batch; the wire accepts both shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    One(String),
    Many(Vec<String>),
}

impl IdList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            IdList::One(id) => vec![id],
            IdList::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSetParams {
    pub config: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreGetParams {
    pub ids: IdList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreGetResult {
    pub ignored: Vec<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreSetParams {
    pub ids: IdList,
    #[serde(default = "default_ignore")]
    pub ignore: bool,
}

fn default_ignore() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistParams {
    pub ids: IdList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistResult {
    pub blacklisted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInfo {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCatalogResult {
    pub metrics: Vec<MetricInfo>,
}
