//! End-to-end routing tests against mock pool members.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

mod common;
use common::{client, router_config, start_router, wait_for, MockMember, Reply};

#[tokio::test]
async fn test_routes_to_fastest_member() {
    let slow = MockMember::start("i-slow", Reply::ok(60), Reply::ok(0)).await;
    let fast = MockMember::start("i-fast", Reply::ok(5), Reply::ok(0)).await;
    let slowest = MockMember::start("i-slowest", Reply::ok(200), Reply::ok(0)).await;

    let router = start_router(router_config(
        &["cluster1"],
        vec![slow.instance("cluster1"), fast.instance("cluster1"), slowest.instance("cluster1")],
    ))
    .await;

    let pool = router.pools.get("cluster1").unwrap().clone();
    assert!(wait_for(Duration::from_secs(3), || pool.selected().is_some()).await);
    assert_eq!(pool.selected().unwrap().member.authority(), fast.addr.to_string());

    let res = client().get(router.url("/cluster1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Instance i-fast has received the request");

    router.stop().await;
}

#[tokio::test]
async fn test_unhealthy_member_is_excluded_but_still_probed() {
    let sick = MockMember::start("i-sick", Reply::status(500), Reply::ok(0)).await;
    let well = MockMember::start("i-well", Reply::ok(50), Reply::ok(0)).await;

    let router = start_router(router_config(
        &["cluster1"],
        vec![sick.instance("cluster1"), well.instance("cluster1")],
    ))
    .await;

    let pool = router.pools.get("cluster1").unwrap().clone();
    assert!(wait_for(Duration::from_secs(3), || pool.selected().is_some()).await);
    assert_eq!(pool.selected().unwrap().member.authority(), well.addr.to_string());

    // Excluded members keep being probed every cycle.
    let before = sick.probe_count();
    assert!(wait_for(Duration::from_secs(3), || sick.probe_count() >= before + 2).await);

    let body: Value = client()
        .get(router.url("/cluster1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Instance i-well has received the request");

    router.stop().await;
}

#[tokio::test]
async fn test_forward_failure_is_bad_gateway_without_retry() {
    let member = MockMember::start("i-1", Reply::ok(0), Reply::status(500)).await;

    let router = start_router(router_config(&["cluster1"], vec![member.instance("cluster1")])).await;
    let pool = router.pools.get("cluster1").unwrap().clone();
    assert!(wait_for(Duration::from_secs(3), || pool.selected().is_some()).await);

    let res = client().get(router.url("/cluster1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["pool"], "cluster1");
    assert_eq!(member.forwards.load(std::sync::atomic::Ordering::SeqCst), 1);

    // The failed forward does not demote the member; the next cycle decides.
    let probes = member.probe_count();
    assert!(wait_for(Duration::from_secs(3), || member.probe_count() > probes).await);
    assert!(pool.selected().is_some());

    router.stop().await;
}

#[tokio::test]
async fn test_no_healthy_member_is_unavailable() {
    let member = MockMember::start("i-1", Reply::status(503), Reply::ok(0)).await;

    let router = start_router(router_config(&["cluster1"], vec![member.instance("cluster1")])).await;
    let pool = router.pools.get("cluster1").unwrap().clone();
    assert!(wait_for(Duration::from_secs(3), || pool.last_cycle().is_some()).await);

    let res = client().get(router.url("/cluster1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(member.forwards.load(std::sync::atomic::Ordering::SeqCst), 0);

    router.stop().await;
}

#[tokio::test]
async fn test_pools_are_routed_independently() {
    let a = MockMember::start("i-a", Reply::ok(0), Reply::ok(0)).await;
    let b = MockMember::start("i-b", Reply::ok(0), Reply::ok(0)).await;

    let router = start_router(router_config(
        &["cluster1", "cluster2"],
        vec![a.instance("cluster1"), b.instance("cluster2")],
    ))
    .await;

    let pools = router.pools.clone();
    assert!(
        wait_for(Duration::from_secs(3), || {
            pools.all().iter().all(|p| p.selected().is_some())
        })
        .await
    );

    for (route, id) in [("/cluster1", "i-a"), ("/cluster2", "i-b")] {
        let body: Value = client().get(router.url(route)).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["message"], format!("Instance {} has received the request", id));
    }

    let res = client().get(router.url("/cluster3")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    router.stop().await;
}

#[tokio::test]
async fn test_empty_pool_is_unavailable() {
    let router = start_router(router_config(&["cluster1"], vec![])).await;

    let res = client().get(router.url("/cluster1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    router.stop().await;
}
