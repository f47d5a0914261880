//! # Integration Tests
//!
//! Full-stack tests over live sockets: two backend replicas, the
//! bootstrap cycle, the gateway, and the mutation scheduler working
//! against each other the way the deployed engine wires them.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use chameleon_core::{
    bootstrap_cycle, router, AppState, ArtifactPublisher, DeceptionLayer, GatewayConfig,
    HandlerRegistry, Method, MutationScheduler, NamespaceMutator, NodePool, NodeRuntime,
    RouteTemplate, SchedulerConfig, SharedRouterState, StatePaths, TrapConfig,
};

/// Everything a test needs to talk to a running stack.
struct TestStack {
    gateway_url: String,
    shared: Arc<SharedRouterState>,
    pool: Arc<NodePool>,
    scheduler: Arc<MutationScheduler>,
    trap: Arc<DeceptionLayer>,
    _state_dir: TempDir,
}

fn default_templates() -> Vec<RouteTemplate> {
    vec![
        RouteTemplate::new(Method::Get, "/", "root"),
        RouteTemplate::new(Method::Get, "/admin/login", "admin_login"),
        RouteTemplate::new(Method::Get, "/api/balance", "api_balance"),
    ]
}

/// Spawns one node replica on an ephemeral port.
async fn spawn_replica(id: usize, registry: HandlerRegistry) -> Arc<NodeRuntime> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let node = Arc::new(NodeRuntime::new(id, format!("NODE{id}"), addr, registry));
    tokio::spawn(Arc::clone(&node).serve_on(listener));
    node
}

/// Boots nodes, bootstrap cycle, scheduler, and gateway.
async fn spawn_stack(registry: HandlerRegistry, templates: Vec<RouteTemplate>) -> TestStack {
    let state_dir = TempDir::new().unwrap();

    let alpha = spawn_replica(0, registry.clone()).await;
    let beta = spawn_replica(1, registry).await;
    let pool = Arc::new(NodePool::new(vec![alpha, beta]).unwrap());

    let mutator = NamespaceMutator::new();
    let publisher = ArtifactPublisher::new(StatePaths::in_dir(state_dir.path()));

    let snapshot = bootstrap_cycle(&mutator, &publisher, &pool, &templates).unwrap();
    let shared = Arc::new(SharedRouterState::new(snapshot));

    let scheduler = Arc::new(MutationScheduler::new(
        mutator,
        publisher,
        Arc::clone(&pool),
        Arc::clone(&shared),
        templates,
        &SchedulerConfig::default(),
        1,
    ));

    let trap = Arc::new(DeceptionLayer::new(
        TrapConfig::new().with_base_delay_ms(0).with_delay_step_ms(0),
    ));
    let gateway_config = GatewayConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        forward_timeout_ms: 2_000,
        forward_retries: 1,
    };
    let state = AppState::new(Arc::clone(&shared), Arc::clone(&trap), &gateway_config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_addr = listener.local_addr().unwrap();
    let app = router(state).into_make_service_with_connect_info::<std::net::SocketAddr>();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestStack {
        gateway_url: format!("http://{gateway_addr}"),
        shared,
        pool,
        scheduler,
        trap,
        _state_dir: state_dir,
    }
}

// ============================================================================
// Forwarding Path
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_canonical_path_forwards_to_backend() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/balance", stack.gateway_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["currency"], "USD");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_root_is_always_live() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        let resp = client
            .get(format!("{}/", stack.gateway_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        stack.scheduler.run_cycle().await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forwarding_survives_rotation() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    for expected_cycle in 2..=4 {
        stack.scheduler.run_cycle().await.unwrap();
        assert_eq!(stack.shared.snapshot().cycle_id(), expected_cycle);

        // The canonical address keeps working across every rotation.
        let resp = client
            .get(format!("{}/admin/login", stack.gateway_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["page"], "admin_login");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_active_node_always_matches_mapping_cycle() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;

    for _ in 0..3 {
        stack.scheduler.run_cycle().await.unwrap();
        let snapshot = stack.shared.snapshot();
        assert_eq!(
            stack.pool.active().loaded_cycle_id(),
            snapshot.cycle_id(),
            "gateway would forward mapping cycle {} to a stale node",
            snapshot.cycle_id()
        );
    }
}

// ============================================================================
// Deception Path
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_path_from_previous_cycle_hits_trap() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    let stale_public = stack
        .shared
        .snapshot()
        .mapping
        .public_path_of("/api/balance")
        .unwrap()
        .to_string();

    stack.scheduler.run_cycle().await.unwrap();

    // The address learned in cycle 1 is now bait.
    let resp = client
        .get(format!("{}{stale_public}", stack.gateway_url))
        .header("x-forwarded-for", "198.51.100.10")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(chameleon_core::is_trap_response(&body));
    assert_eq!(stack.trap.score_of("198.51.100.10"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_miss_never_reaches_a_backend() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    // A path no backend has ever served still gets the decoy, not a
    // forwarded 404.
    let resp = client
        .get(format!("{}/never/existed", stack.gateway_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(chameleon_core::is_trap_response(&body));
}

// ============================================================================
// Failure Containment
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_dead_backend_yields_generic_unavailable() {
    // Reserve a port, then free it so nothing listens there.
    let dead_addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let state_dir = TempDir::new().unwrap();
    let registry = HandlerRegistry::builtin();
    let nodes = vec![
        Arc::new(NodeRuntime::new(0, "DEAD0", dead_addr, registry.clone())),
        Arc::new(NodeRuntime::new(
            1,
            "DEAD1",
            "127.0.0.1:1".parse().unwrap(),
            registry,
        )),
    ];
    let pool = Arc::new(NodePool::new(nodes).unwrap());

    let mutator = NamespaceMutator::new();
    let publisher = ArtifactPublisher::new(StatePaths::in_dir(state_dir.path()));
    let snapshot = bootstrap_cycle(&mutator, &publisher, &pool, &default_templates()).unwrap();
    let shared = Arc::new(SharedRouterState::new(snapshot));

    let trap = Arc::new(DeceptionLayer::new(TrapConfig::new().with_base_delay_ms(0)));
    let gateway_config = GatewayConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        forward_timeout_ms: 500,
        forward_retries: 1,
    };
    let state = AppState::new(shared, Arc::clone(&trap), &gateway_config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{gateway_addr}/api/balance"))
        .header("x-forwarded-for", "198.51.100.77")
        .send()
        .await
        .unwrap();

    // An outage on a mapped path is a 503, never the decoy, and it
    // does not score the client.
    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Node Sync Error");
    assert!(!chameleon_core::is_trap_response(&body));
    assert_eq!(trap.score_of("198.51.100.77"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_method_is_rejected_without_scoring() {
    let stack = spawn_stack(HandlerRegistry::builtin(), default_templates()).await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(format!("{}/api/balance", stack.gateway_url))
        .header("x-forwarded-for", "198.51.100.50")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(stack.trap.score_of("198.51.100.50"), 0);
}
