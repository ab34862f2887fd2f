// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Botfleet tenants.
//!
//! Each tenant gets its own [`TelegramChannel`] bound to the tenant's bot
//! token. The channel long-polls through teloxide, forwards text messages
//! to an internal queue read by [`ChannelAdapter::receive`], and sends
//! replies as HTML. A reply whose markup Telegram cannot parse is resent
//! once as plain text; any other send error is returned as is.

pub mod handler;

use async_trait::async_trait;
use botfleet_core::error::BotfleetError;
use botfleet_core::traits::{ChannelAdapter, ChannelFactory, PluginAdapter};
use botfleet_core::types::{
    AdapterType, HealthStatus, InboundMessage, MessageId, OutboundMessage, Tenant, TenantId,
    TextFormat,
};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, Recipient};
use teloxide::{ApiError, RequestError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the queue between the dispatcher and `receive`.
const INBOUND_BUFFER: usize = 100;

/// Telegram channel bound to one tenant token.
pub struct TelegramChannel {
    bot: Bot,
    tenant_id: Option<TenantId>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates an unconnected channel for `token`.
    pub fn new(token: &str) -> Result<Self, BotfleetError> {
        if token.trim().is_empty() {
            return Err(BotfleetError::Validation(
                "telegram bot token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        Ok(Self {
            bot: Bot::new(token),
            tenant_id: None,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            cancel: CancellationToken::new(),
            polling_handle: None,
        })
    }

    /// Creates a channel for a tenant record.
    pub fn for_tenant(tenant: &Tenant) -> Result<Self, BotfleetError> {
        let mut channel = Self::new(&tenant.token)?;
        channel.tenant_id = Some(tenant.id);
        Ok(channel)
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn send_with(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message, RequestError> {
        let request = self.bot.send_message(Recipient::Id(chat_id), text);
        match parse_mode {
            Some(mode) => request.parse_mode(mode).await,
            None => request.await,
        }
    }
}

/// True when Telegram refused a message because of its markup.
fn is_markup_rejection(e: &RequestError) -> bool {
    match e {
        RequestError::Api(ApiError::CantParseEntities(_)) => true,
        RequestError::Api(ApiError::Unknown(description)) => {
            description.contains("can't parse entities")
        }
        _ => false,
    }
}

/// Undoes reply HTML: drops bold tags, then unescapes `<`, `>` and `&`.
fn html_to_plain(html: &str) -> String {
    html.replace("<b>", "")
        .replace("</b>", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BotfleetError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), BotfleetError> {
        debug!(tenant_id = ?self.tenant_id, "Telegram channel shutting down");
        self.cancel.cancel();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), BotfleetError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        // An invalid token must fail here, not inside the spawned dispatcher.
        let me = self.bot.get_me().await.map_err(|e| BotfleetError::Channel {
            message: format!("token rejected by Telegram: {e}"),
            source: Some(Box::new(e)),
        })?;

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let cancel = self.cancel.clone();
        let tenant_id = self.tenant_id;

        info!(?tenant_id, bot = %me.username(), "starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!(?tenant_id, "inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(?tenant_id, msg_id = msg.id.0, "ignoring non-text message");
                        }
                    }
                    respond(())
                }
            });

            let mut dispatcher = Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build();

            tokio::select! {
                _ = dispatcher.dispatch() => {}
                _ = cancel.cancelled() => {
                    debug!(?tenant_id, "Telegram polling cancelled");
                }
            }
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BotfleetError> {
        let chat_id = parse_chat_id(&msg.chat_id)?;

        let sent = match msg.format {
            TextFormat::Html => match self
                .send_with(chat_id, &msg.content, Some(ParseMode::Html))
                .await
            {
                Err(e) if is_markup_rejection(&e) => {
                    warn!(error = %e, "Telegram rejected HTML, sending as plain text");
                    self.send_with(chat_id, &html_to_plain(&msg.content), None)
                        .await
                }
                other => other,
            },
            TextFormat::Plain => self.send_with(chat_id, &msg.content, None).await,
        }
        .map_err(|e| BotfleetError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, BotfleetError> {
        let mut rx = self.inbound_rx.lock().await;
        tokio::select! {
            msg = rx.recv() => msg.ok_or_else(|| BotfleetError::Channel {
                message: "Telegram inbound channel closed".into(),
                source: None,
            }),
            _ = self.cancel.cancelled() => Err(BotfleetError::Channel {
                message: "Telegram channel shut down".into(),
                source: None,
            }),
        }
    }
}

impl Drop for TelegramChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builds a [`TelegramChannel`] for each tenant the registry starts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelegramChannelFactory;

impl ChannelFactory for TelegramChannelFactory {
    fn build(&self, tenant: &Tenant) -> Result<Box<dyn ChannelAdapter>, BotfleetError> {
        Ok(Box::new(TelegramChannel::for_tenant(tenant)?))
    }
}

fn parse_chat_id(raw: &str) -> Result<ChatId, BotfleetError> {
    raw.parse::<i64>()
        .map(ChatId)
        .map_err(|e| BotfleetError::Channel {
            message: format!("invalid chat_id {raw:?}: {e}"),
            source: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(token: &str) -> Tenant {
        Tenant {
            id: TenantId(7),
            name: "main".into(),
            token: token.into(),
            base_prompt: String::new(),
            active: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn only_markup_errors_trigger_plain_fallback() {
        assert!(is_markup_rejection(&RequestError::Api(
            ApiError::CantParseEntities("Bad Request: can't parse entities".into())
        )));
        assert!(is_markup_rejection(&RequestError::Api(ApiError::Unknown(
            "Bad Request: can't parse entities: unsupported start tag".into()
        ))));
        assert!(!is_markup_rejection(&RequestError::Api(ApiError::BotBlocked)));
        assert!(!is_markup_rejection(&RequestError::Api(
            ApiError::MessageTextIsEmpty
        )));
    }

    #[test]
    fn plain_fallback_restores_reply_text() {
        assert_eq!(
            html_to_plain("<b>Plan</b>: a &lt; b &amp;&amp; c &gt; d"),
            "Plan: a < b && c > d"
        );
        // Escaped tag text from the user stays literal.
        assert_eq!(html_to_plain("&lt;b&gt;hi&lt;/b&gt;"), "<b>hi</b>");
        assert_eq!(html_to_plain("&amp;lt;"), "&lt;");
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new("").is_err());
        assert!(TelegramChannel::new("   ").is_err());
    }

    #[test]
    fn new_accepts_token() {
        let channel = TelegramChannel::new("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[test]
    fn factory_binds_tenant() {
        let channel = TelegramChannelFactory
            .build(&tenant("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))
            .unwrap();
        assert_eq!(channel.name(), "telegram");
        assert!(TelegramChannelFactory.build(&tenant("")).is_err());
    }

    #[test]
    fn parse_chat_id_accepts_negative_ids() {
        assert_eq!(parse_chat_id("-1001").unwrap(), ChatId(-1001));
        assert_eq!(parse_chat_id("42").unwrap(), ChatId(42));
        assert!(parse_chat_id("abc").is_err());
    }

    #[tokio::test]
    async fn receive_fails_after_shutdown() {
        let channel = TelegramChannel::new("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").unwrap();
        channel.shutdown().await.unwrap();
        assert!(channel.receive().await.is_err());
    }
}
