// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter and factory for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages. Clones share state, so a test can keep a
//! handle to the channel the registry is driving.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use botfleet_core::BotfleetError;
use botfleet_core::traits::{ChannelAdapter, ChannelFactory, PluginAdapter};
use botfleet_core::types::{
    AdapterType, HealthStatus, InboundMessage, MessageId, OutboundMessage, Tenant, TenantId,
};

/// Builds an inbound text message from `chat_id`.
pub fn inbound(chat_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id: chat_id.to_string(),
        sender_name: format!("user-{chat_id}"),
        sender_handle: None,
        text: text.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// A mock messaging channel for testing.
///
/// - **inbound**: messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured and retrievable via `sent_messages()`
#[derive(Clone)]
pub struct MockChannel {
    token: String,
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failing_chats: Arc<Mutex<HashSet<String>>>,
    notify: Arc<Notify>,
    cancel: CancellationToken,
    connected: Arc<AtomicBool>,
    reject_connect: bool,
    connect_delay: Option<Duration>,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self::for_token("mock-token")
    }

    /// Create a mock channel bound to `token`.
    pub fn for_token(token: &str) -> Self {
        Self {
            token: token.to_string(),
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            failing_chats: Arc::new(Mutex::new(HashSet::new())),
            notify: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
            connected: Arc::new(AtomicBool::new(false)),
            reject_connect: false,
            connect_delay: None,
        }
    }

    /// A channel whose `connect()` fails, as with an invalid token.
    pub fn rejecting(token: &str) -> Self {
        Self {
            reject_connect: true,
            ..Self::for_token(token)
        }
    }

    /// A channel whose `connect()` takes `delay`, as with a slow network.
    pub fn slow(token: &str, delay: Duration) -> Self {
        Self {
            connect_delay: Some(delay),
            ..Self::for_token(token)
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Make every `send()` to `chat_id` fail.
    pub async fn fail_sends_to(&self, chat_id: &str) {
        self.failing_chats.lock().await.insert(chat_id.to_string());
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat, in order.
    pub async fn sent_to(&self, chat_id: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// True between a successful `connect()` and `shutdown()`.
    pub fn is_live(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BotfleetError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BotfleetError> {
        self.cancel.cancel();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), BotfleetError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_connect {
            return Err(BotfleetError::Channel {
                message: format!("token rejected: {}", self.token),
                source: None,
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BotfleetError> {
        if self.failing_chats.lock().await.contains(&msg.chat_id) {
            return Err(BotfleetError::Channel {
                message: format!("send to {} failed", msg.chat_id),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, BotfleetError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = self.cancel.cancelled() => {
                    return Err(BotfleetError::Channel {
                        message: "mock channel closed".into(),
                        source: None,
                    });
                }
            }
        }
    }
}

/// Builds a fresh [`MockChannel`] per registry start and remembers it.
#[derive(Clone, Default)]
pub struct MockChannelFactory {
    built: Arc<std::sync::Mutex<HashMap<TenantId, Vec<MockChannel>>>>,
    rejected_tokens: Arc<std::sync::Mutex<HashSet<String>>>,
    slow_tokens: Arc<std::sync::Mutex<HashMap<String, Duration>>>,
}

impl MockChannelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels built for `token` will fail to connect.
    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string());
    }

    /// Channels built for `token` take `delay` to connect.
    pub fn slow_token(&self, token: &str, delay: Duration) {
        self.slow_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string(), delay);
    }

    /// The most recently built channel for a tenant.
    pub fn channel_for(&self, tenant_id: TenantId) -> Option<MockChannel> {
        self.built
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tenant_id)
            .and_then(|v| v.last().cloned())
    }

    /// How many channels were built for a tenant.
    pub fn build_count(&self, tenant_id: TenantId) -> usize {
        self.built
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tenant_id)
            .map_or(0, Vec::len)
    }

    /// Number of connected, not shut down channels holding `token`.
    pub fn live_for_token(&self, token: &str) -> usize {
        self.built
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flatten()
            .filter(|c| c.token() == token && c.is_live())
            .count()
    }
}

impl ChannelFactory for MockChannelFactory {
    fn build(&self, tenant: &Tenant) -> Result<Box<dyn ChannelAdapter>, BotfleetError> {
        let rejected = self
            .rejected_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tenant.token);
        let delay = self
            .slow_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tenant.token)
            .copied();
        let channel = match (rejected, delay) {
            (true, _) => MockChannel::rejecting(&tenant.token),
            (false, Some(delay)) => MockChannel::slow(&tenant.token, delay),
            (false, None) => MockChannel::for_token(&tenant.token),
        };
        self.built
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tenant.id)
            .or_default()
            .push(channel.clone());
        Ok(Box::new(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: i64, token: &str) -> Tenant {
        Tenant {
            id: TenantId(id),
            name: format!("t{id}"),
            token: token.into(),
            base_prompt: String::new(),
            active: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_messages_in_order() {
        let channel = MockChannel::new();
        channel.inject_message(inbound("1", "first")).await;
        channel.inject_message(inbound("1", "second")).await;

        assert_eq!(channel.receive().await.unwrap().text, "first");
        assert_eq!(channel.receive().await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let id = channel
            .send(OutboundMessage::plain("42", "response text"))
            .await
            .unwrap();
        assert!(id.0.starts_with("mock-msg-"));

        let sent = channel.sent_to("42").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "response text");
    }

    #[tokio::test]
    async fn failing_chat_rejects_send() {
        let channel = MockChannel::new();
        channel.fail_sends_to("13").await;
        assert!(channel.send(OutboundMessage::plain("13", "x")).await.is_err());
        assert!(channel.send(OutboundMessage::plain("14", "x")).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = MockChannel::new();
        let clone = channel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            clone.inject_message(inbound("1", "delayed")).await;
        });

        let received = tokio::time::timeout(tokio::time::Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received.text, "delayed");
    }

    #[tokio::test]
    async fn shutdown_unblocks_receive() {
        let channel = MockChannel::new();
        let clone = channel.clone();
        let waiter = tokio::spawn(async move { clone.receive().await });

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        channel.shutdown().await.unwrap();

        let result = tokio::time::timeout(tokio::time::Duration::from_secs(2), waiter)
            .await
            .expect("receive did not unblock")
            .unwrap();
        assert!(result.is_err());
        assert!(channel.is_shut_down());
    }

    #[tokio::test]
    async fn factory_tracks_live_channels_per_token() {
        let factory = MockChannelFactory::new();
        let mut first = factory.build(&tenant(1, "tok-a")).unwrap();
        first.connect().await.unwrap();
        assert_eq!(factory.live_for_token("tok-a"), 1);

        first.shutdown().await.unwrap();
        assert_eq!(factory.live_for_token("tok-a"), 0);
        assert_eq!(factory.build_count(TenantId(1)), 1);
    }

    #[tokio::test]
    async fn factory_rejects_configured_tokens() {
        let factory = MockChannelFactory::new();
        factory.reject_token("bad");
        let mut channel = factory.build(&tenant(2, "bad")).unwrap();
        assert!(channel.connect().await.is_err());
        assert_eq!(factory.live_for_token("bad"), 0);
    }
}
