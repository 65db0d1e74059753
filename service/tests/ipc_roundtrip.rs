//! Operator IPC round-trips over a real Unix socket.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use seedcull_core::engine::{CatalogSet, RetentionEngine};
use seedcull_core::inventory::{DiskProbe, Inventory, InventoryError};
use seedcull_core::snapshot::TorrentSnapshot;
use seedcull_service::manager::RetentionService;
use seedcull_service::persistence::{IgnoreLedger, StateStore};
use seedcull_service::{PROTOCOL_VERSION, ipc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

struct EmptyInventory;

#[async_trait]
impl Inventory for EmptyInventory {
    async fn list_ids(&self) -> Result<Vec<String>, InventoryError> {
        Ok(Vec::new())
    }

    async fn snapshot(&self, id: &str) -> Result<TorrentSnapshot, InventoryError> {
        Err(InventoryError::NotFound { id: id.to_string() })
    }

    async fn remove(&self, _id: &str, _delete_data: bool) -> Result<(), InventoryError> {
        Ok(())
    }

    async fn pause(&self, _id: &str) -> Result<(), InventoryError> {
        Ok(())
    }
}

struct NullDisk;

#[async_trait]
impl DiskProbe for NullDisk {
    async fn free_space_gib(&self) -> Option<f64> {
        None
    }
}

fn start_service() -> PathBuf {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();
    std::mem::forget(tmp);

    let store = Arc::new(StateStore::with_base_dir(dir.join("state")).unwrap());
    let ignore = Arc::new(IgnoreLedger::load(Arc::clone(&store)).unwrap());
    let engine = Arc::new(RetentionEngine::new(
        Arc::new(EmptyInventory),
        Arc::new(NullDisk),
        CatalogSet::new(),
        Arc::clone(&ignore) as _,
        false,
    ));
    let service = Arc::new(RetentionService::new(store, ignore, engine));

    let socket = dir.join("seedcull.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    tokio::spawn(ipc::serve(service, listener));
    socket
}

async fn connect(socket: &PathBuf) -> BufReader<UnixStream> {
    BufReader::new(UnixStream::connect(socket).await.unwrap())
}

async fn call(
    stream: &mut BufReader<UnixStream>,
    id: i64,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let request = serde_json::json!({ "id": id, "method": method, "params": params });
    let mut line = serde_json::to_string(&request).unwrap();
    line.push('\n');
    stream.get_mut().write_all(line.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_line(&mut response).await.unwrap();
    serde_json::from_str(response.trim()).unwrap()
}

#[tokio::test]
async fn hello_handshake_checks_the_protocol_version() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let ok = call(
        &mut stream,
        1,
        "hello",
        serde_json::json!({ "protocol_version": PROTOCOL_VERSION, "client_version": "test" }),
    )
    .await;
    assert_eq!(ok["result"]["protocol_version"], PROTOCOL_VERSION);
    assert!(ok["result"]["capabilities"].as_array().unwrap().len() >= 6);

    let bad = call(
        &mut stream,
        2,
        "hello",
        serde_json::json!({ "protocol_version": "0.0", "client_version": "test" }),
    )
    .await;
    assert_eq!(bad["error"]["code"], -32602);
}

#[tokio::test]
async fn config_round_trips_over_the_wire() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let get = call(&mut stream, 1, "config.get", serde_json::json!(null)).await;
    assert_eq!(get["result"]["max_seeds"], 0);

    let mut config = get["result"].clone();
    config["max_seeds"] = serde_json::json!(12);
    config["enabled"] = serde_json::json!(true);
    call(&mut stream, 2, "config.set", serde_json::json!({ "config": config })).await;

    let again = call(&mut stream, 3, "config.get", serde_json::json!(null)).await;
    assert_eq!(again["result"]["max_seeds"], 12);
    assert_eq!(again["result"]["enabled"], true);
}

#[tokio::test]
async fn ignore_accepts_single_ids_and_batches() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let set = call(
        &mut stream,
        1,
        "ignore.set",
        serde_json::json!({ "ids": "solo" }),
    )
    .await;
    assert_eq!(set["result"]["ignored"], serde_json::json!([true]));

    call(
        &mut stream,
        2,
        "ignore.set",
        serde_json::json!({ "ids": ["a", "b"], "ignore": true }),
    )
    .await;

    let get = call(
        &mut stream,
        3,
        "ignore.get",
        serde_json::json!({ "ids": ["solo", "a", "b", "missing"] }),
    )
    .await;
    assert_eq!(
        get["result"]["ignored"],
        serde_json::json!([true, true, true, false])
    );
}

#[tokio::test]
async fn metric_catalog_is_served() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let catalog = call(&mut stream, 1, "metrics.catalog", serde_json::json!(null)).await;
    let metrics = catalog["result"]["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 7);
    assert!(
        metrics
            .iter()
            .any(|m| m["name"] == "func_seed_time" && m["label"] == "Seed Time (h)")
    );
}

#[tokio::test]
async fn manual_pass_reports_over_the_wire() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let report = call(&mut stream, 1, "pass.run", serde_json::json!(null)).await;
    assert_eq!(report["result"]["pool_size"], 0);
    assert_eq!(report["result"]["removed"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let socket = start_service();
    let mut stream = connect(&socket).await;

    let response = call(&mut stream, 1, "bogus.method", serde_json::json!(null)).await;
    assert_eq!(response["error"]["code"], -32601);
}
