// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter traits for messaging transports.

use async_trait::async_trait;

use crate::error::BotfleetError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage, Tenant};

/// Bidirectional messaging channel bound to a single tenant token.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Validates the credentials and starts listening.
    ///
    /// An error here means the tenant cannot be started.
    async fn connect(&mut self) -> Result<(), BotfleetError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BotfleetError>;

    /// Receives the next inbound message. Errors once the listener is closed.
    async fn receive(&self) -> Result<InboundMessage, BotfleetError>;
}

/// Builds an unconnected channel for a tenant.
pub trait ChannelFactory: Send + Sync + 'static {
    fn build(&self, tenant: &Tenant) -> Result<Box<dyn ChannelAdapter>, BotfleetError>;
}
