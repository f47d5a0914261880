//! # Integration Tests
//!
//! End-to-end tests for a running node replica: artifact loading over
//! a live server, hot table swap under traffic, and last-known-good
//! behavior on rejected artifacts.

use std::sync::Arc;

use tokio::net::TcpListener;

use chameleon_mutator::{Artifact, Method, NamespaceMutator, RouteTemplate};
use chameleon_node::{HandlerRegistry, NodePool, NodeRuntime};

fn templates() -> Vec<RouteTemplate> {
    vec![
        RouteTemplate::new(Method::Get, "/", "root"),
        RouteTemplate::new(Method::Get, "/admin/login", "admin_login"),
        RouteTemplate::new(Method::Get, "/api/balance", "api_balance"),
    ]
}

fn artifact(cycle_id: u64) -> Artifact {
    NamespaceMutator::new()
        .mutate(&templates(), cycle_id)
        .unwrap()
        .1
}

/// Spawns a node server on an ephemeral port and returns its base URL.
async fn spawn_node(node: Arc<NodeRuntime>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(node.serve_on(listener));
    format!("http://{addr}")
}

fn test_node() -> Arc<NodeRuntime> {
    Arc::new(NodeRuntime::new(
        0,
        "ALPHA",
        "127.0.0.1:0".parse().unwrap(),
        HandlerRegistry::builtin(),
    ))
}

// ============================================================================
// Live Server Tests
// ============================================================================

#[tokio::test]
async fn test_node_serves_loaded_public_paths() {
    let node = test_node();
    let art = artifact(1);
    node.load(&art).unwrap();
    let base = spawn_node(Arc::clone(&node)).await;

    let client = reqwest::Client::new();

    // Root stays addressable under its canonical path.
    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // Mutated routes answer only on their public paths.
    let public = &art.routes[2].public_path;
    let resp = client.get(format!("{base}{public}")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["currency"], "USD");
}

#[tokio::test]
async fn test_node_404s_canonical_and_stale_paths() {
    let node = test_node();
    node.load(&artifact(1)).unwrap();
    let base = spawn_node(Arc::clone(&node)).await;

    let client = reqwest::Client::new();

    // Canonical paths are not part of the node's surface.
    let resp = client
        .get(format!("{base}/api/balance"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/api/balance_stale0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_hot_swap_under_running_server() {
    // Threat: a reload that restarts the server would drop requests
    // and reopen the enumeration window. The swap must be invisible
    // apart from the path change.
    let node = test_node();
    let first = artifact(1);
    node.load(&first).unwrap();
    let base = spawn_node(Arc::clone(&node)).await;

    let client = reqwest::Client::new();
    let old_public = first.routes[1].public_path.clone();

    let resp = client
        .get(format!("{base}{old_public}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Swap to cycle 2 while the server keeps running.
    let second = artifact(2);
    node.load(&second).unwrap();

    // Old cycle's path is gone, new cycle's path answers.
    let resp = client
        .get(format!("{base}{old_public}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let new_public = &second.routes[1].public_path;
    let resp = client
        .get(format!("{base}{new_public}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_rejected_artifact_leaves_server_intact() {
    let node = test_node();
    let good = artifact(1);
    node.load(&good).unwrap();
    let base = spawn_node(Arc::clone(&node)).await;

    let mut bad = artifact(2);
    bad.routes[0].handler_id = "missing".to_string();
    assert!(node.load(&bad).is_err());

    // The previously loaded cycle keeps serving.
    let client = reqwest::Client::new();
    let public = &good.routes[1].public_path;
    let resp = client.get(format!("{base}{public}")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(node.loaded_cycle_id(), 1);
}

// ============================================================================
// Pool Rotation Scenarios
// ============================================================================

#[tokio::test]
async fn test_standby_loads_ahead_of_rotation() {
    let nodes: Vec<Arc<NodeRuntime>> = (0..2)
        .map(|i| {
            Arc::new(NodeRuntime::new(
                i,
                format!("NODE{i}"),
                "127.0.0.1:0".parse().unwrap(),
                HandlerRegistry::builtin(),
            ))
        })
        .collect();
    let pool = NodePool::new(nodes).unwrap();

    // Bootstrap: active node carries cycle 1.
    pool.active().load(&artifact(1)).unwrap();

    // Cycle 2 goes to the standby first, then rotation.
    pool.standby().load(&artifact(2)).unwrap();
    assert_eq!(pool.standby().loaded_cycle_id(), 2);
    assert_eq!(pool.active().loaded_cycle_id(), 1);

    let new_active = pool.rotate();
    assert_eq!(new_active.loaded_cycle_id(), 2);
    assert_eq!(pool.standby().loaded_cycle_id(), 1);
}
