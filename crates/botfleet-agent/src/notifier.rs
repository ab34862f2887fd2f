// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notifications through a dedicated control bot.

use std::sync::Arc;

use botfleet_core::ChannelAdapter;
use botfleet_core::types::OutboundMessage;
use tracing::{debug, warn};

/// Sends short status lines to the operator chat, if one is configured.
///
/// Delivery failures are logged and otherwise ignored.
#[derive(Clone, Default)]
pub struct OperatorNotifier {
    target: Option<(Arc<dyn ChannelAdapter>, String)>,
}

impl OperatorNotifier {
    /// Notify `chat_id` through `channel`.
    pub fn new(channel: Arc<dyn ChannelAdapter>, chat_id: impl Into<String>) -> Self {
        Self {
            target: Some((channel, chat_id.into())),
        }
    }

    /// A notifier that drops every notification.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    pub async fn notify(&self, text: &str) {
        let Some((channel, chat_id)) = &self.target else {
            debug!("operator notifications disabled");
            return;
        };
        if let Err(e) = channel.send(OutboundMessage::plain(chat_id.clone(), text)).await {
            warn!(error = %e, "failed to notify operator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botfleet_test_utils::MockChannel;

    #[tokio::test]
    async fn sends_to_configured_chat() {
        let channel = MockChannel::new();
        let notifier = OperatorNotifier::new(Arc::new(channel.clone()), "999");
        notifier.notify("status").await;

        let sent = channel.sent_to("999").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "status");
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let channel = MockChannel::new();
        channel.fail_sends_to("999").await;
        let notifier = OperatorNotifier::new(Arc::new(channel.clone()), "999");
        notifier.notify("status").await;
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn disabled_does_nothing() {
        let notifier = OperatorNotifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.notify("status").await;
    }
}
