// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry lifecycle tests against the mock channel factory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use botfleet_agent::{BotRegistry, InboundHandler};
use botfleet_core::types::{InboundMessage, Tenant, TenantId};
use botfleet_core::{BotfleetError, ChannelAdapter};
use botfleet_test_utils::MockChannelFactory;

struct Ignore;

#[async_trait]
impl InboundHandler for Ignore {
    async fn handle(&self, _: TenantId, _: Arc<dyn ChannelAdapter>, _: InboundMessage) {}
}

fn tenant(id: i64, token: &str) -> Tenant {
    Tenant {
        id: TenantId(id),
        name: format!("tenant-{id}"),
        token: token.into(),
        base_prompt: String::new(),
        active: true,
        created_at: "2026-01-01T00:00:00.000Z".into(),
    }
}

fn registry() -> (BotRegistry, MockChannelFactory) {
    let factory = MockChannelFactory::new();
    (
        BotRegistry::new(Arc::new(factory.clone()), Arc::new(Ignore)),
        factory,
    )
}

#[tokio::test]
async fn test_double_start_keeps_one_listener() {
    let (registry, factory) = registry();
    let t = tenant(1, "1:a");

    registry.start(&t).await.unwrap();
    registry.start(&t).await.unwrap();

    assert_eq!(factory.build_count(t.id), 1);
    assert_eq!(factory.live_for_token("1:a"), 1);
    assert_eq!(registry.running().await, vec![t.id]);
}

#[tokio::test]
async fn test_duplicate_token_is_rejected() {
    let (registry, factory) = registry();
    registry.start(&tenant(1, "shared")).await.unwrap();

    let err = registry.start(&tenant(2, "shared")).await.unwrap_err();
    assert!(matches!(err, BotfleetError::Registry(_)));
    assert!(!registry.is_running(TenantId(2)).await);
    assert_eq!(factory.build_count(TenantId(2)), 0);
    assert_eq!(factory.live_for_token("shared"), 1);
}

#[tokio::test]
async fn test_restart_after_token_change_leaves_one_listener() {
    let (registry, factory) = registry();
    let mut t = tenant(1, "old");
    registry.start(&t).await.unwrap();

    t.token = "new".into();
    registry.restart(&t).await.unwrap();

    assert_eq!(factory.live_for_token("old"), 0);
    assert_eq!(factory.live_for_token("new"), 1);
    assert_eq!(factory.build_count(t.id), 2);
    assert_eq!(registry.running().await, vec![t.id]);

    // The released token can now be taken by another tenant.
    registry.start(&tenant(2, "old")).await.unwrap();
    assert_eq!(registry.running().await, vec![TenantId(1), TenantId(2)]);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (registry, factory) = registry();
    let t = tenant(1, "1:a");
    registry.start(&t).await.unwrap();
    let channel = factory.channel_for(t.id).unwrap();

    assert!(registry.stop(t.id).await);
    assert!(!registry.stop(t.id).await);
    assert!(!registry.stop(TenantId(99)).await);

    assert!(channel.is_shut_down());
    assert!(registry.running().await.is_empty());
    assert!(registry.channel(t.id).await.is_none());
}

#[tokio::test]
async fn test_failed_connect_leaves_tenant_absent() {
    let (registry, factory) = registry();
    factory.reject_token("bad");

    let err = registry.start(&tenant(1, "bad")).await.unwrap_err();
    assert!(matches!(err, BotfleetError::Channel { .. }));
    assert!(!registry.is_running(TenantId(1)).await);
}

#[tokio::test]
async fn test_start_all_skips_inactive_and_failed_tenants() {
    let (registry, factory) = registry();
    factory.reject_token("bad");
    let mut inactive = tenant(3, "3:c");
    inactive.active = false;

    let running = registry
        .start_all(&[tenant(1, "1:a"), tenant(2, "bad"), inactive])
        .await;

    assert_eq!(running, 1);
    assert_eq!(registry.running().await, vec![TenantId(1)]);
    assert_eq!(factory.build_count(TenantId(3)), 0);
}

#[tokio::test]
async fn test_shutdown_all_closes_every_channel() {
    let (registry, factory) = registry();
    registry
        .start_all(&[tenant(1, "1:a"), tenant(2, "2:b")])
        .await;

    registry.shutdown_all().await;

    assert!(registry.running().await.is_empty());
    assert_eq!(factory.live_for_token("1:a"), 0);
    assert_eq!(factory.live_for_token("2:b"), 0);
}

#[tokio::test]
async fn test_slow_connect_does_not_block_lookups() {
    let (registry, factory) = registry();
    registry.start(&tenant(1, "1:a")).await.unwrap();
    factory.slow_token("2:slow", Duration::from_millis(500));

    let registry = Arc::new(registry);
    let pending = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.start(&tenant(2, "2:slow")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let running = tokio::time::timeout(Duration::from_millis(100), registry.running())
        .await
        .expect("running() waited on a connect");
    assert_eq!(running, vec![TenantId(1)]);
    let channel = tokio::time::timeout(Duration::from_millis(100), registry.channel(TenantId(1)))
        .await
        .expect("channel() waited on a connect");
    assert!(channel.is_some());

    pending.await.unwrap().unwrap();
    assert_eq!(registry.running().await, vec![TenantId(1), TenantId(2)]);
}

#[tokio::test]
async fn test_token_is_reserved_while_connecting() {
    let (registry, factory) = registry();
    factory.slow_token("shared", Duration::from_millis(300));

    let registry = Arc::new(registry);
    let first = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.start(&tenant(1, "shared")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = registry.start(&tenant(2, "shared")).await.unwrap_err();
    assert!(matches!(err, BotfleetError::Registry(_)));

    first.await.unwrap().unwrap();
    assert_eq!(registry.running().await, vec![TenantId(1)]);
    assert_eq!(factory.live_for_token("shared"), 1);
}
