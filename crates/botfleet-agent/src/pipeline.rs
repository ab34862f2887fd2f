// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation pipeline run for every inbound message.
//!
//! A run registers the user, handles `/reset`, classifies the message
//! against the user's current command, answers under the new command,
//! records the exchange and sends the reply. Inference failures are
//! absorbed by fallbacks; storage and send failures end the run with the
//! generic error reply.
//!
//! [`ConversationPipeline::converse`] runs the same exchange for callers
//! that have no messaging channel and want the reply and session back.

use std::sync::Arc;

use async_trait::async_trait;
use botfleet_config::model::PipelineConfig;
use botfleet_core::types::{
    Exchange, InboundMessage, OutboundMessage, Session, TenantId, RESET_COMMAND,
};
use botfleet_core::{BotfleetError, ChannelAdapter, InferenceAdapter, StorageAdapter};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::classifier::IntentClassifier;
use crate::context::ContextAssembler;
use crate::control::reset_conversation;
use crate::format::to_html;
use crate::locks::SessionLocks;
use crate::notifier::OperatorNotifier;
use crate::registry::InboundHandler;
use crate::responder::ResponseGenerator;

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The conversation was reset and confirmed.
    Reset,
    /// A reply was recorded and sent.
    Replied { command: String, reply: String },
    /// The run failed; the user got the generic error reply.
    Failed(String),
}

/// Result of a channel-less exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub reply: String,
    /// The session as stored after the exchange.
    pub session: Session,
    pub tenant_id: TenantId,
}

/// Command and reply of one recorded exchange.
struct Turn {
    command: String,
    reply: String,
}

pub struct ConversationPipeline {
    storage: Arc<dyn StorageAdapter>,
    assembler: ContextAssembler,
    classifier: IntentClassifier,
    responder: ResponseGenerator,
    notifier: OperatorNotifier,
    locks: Option<SessionLocks>,
    config: PipelineConfig,
}

impl ConversationPipeline {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn InferenceAdapter>,
        notifier: OperatorNotifier,
        config: PipelineConfig,
    ) -> Self {
        let locks = config.serialize_sessions.then(SessionLocks::new);
        Self {
            assembler: ContextAssembler::new(Arc::clone(&storage)),
            classifier: IntentClassifier::new(Arc::clone(&provider)),
            responder: ResponseGenerator::new(provider, config.fallback_reply.clone()),
            storage,
            notifier,
            locks,
            config,
        }
    }

    /// Runs the pipeline for one message and sends the result on `channel`.
    pub async fn process(
        &self,
        tenant_id: TenantId,
        channel: &dyn ChannelAdapter,
        msg: &InboundMessage,
    ) -> PipelineOutcome {
        let user_id = msg.chat_id.as_str();
        debug!(%tenant_id, user_id, "inbound message");

        let guard = match &self.locks {
            Some(locks) => Some(locks.acquire((user_id.to_string(), tenant_id)).await),
            None => None,
        };

        let outcome = match self.run(tenant_id, channel, msg).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%tenant_id, user_id, error = %e, "pipeline run failed");
                self.notifier
                    .notify(&format!(
                        "Error for {} ({user_id}) on tenant {tenant_id}: {e}",
                        msg.sender_name
                    ))
                    .await;
                if let Err(send_err) = channel
                    .send(OutboundMessage::plain(user_id, self.config.error_reply.clone()))
                    .await
                {
                    warn!(%tenant_id, user_id, error = %send_err, "failed to send error reply");
                }
                PipelineOutcome::Failed(e.to_string())
            }
        };

        drop(guard);
        if let Some(locks) = &self.locks {
            locks.prune_idle();
        }
        outcome
    }

    async fn run(
        &self,
        tenant_id: TenantId,
        channel: &dyn ChannelAdapter,
        msg: &InboundMessage,
    ) -> Result<PipelineOutcome, BotfleetError> {
        let user_id = msg.chat_id.as_str();
        let text = msg.text.as_str();

        self.storage
            .ensure_user(user_id, &msg.sender_name, msg.sender_handle.as_deref())
            .await?;
        self.storage.touch_user(user_id).await?;

        if text == RESET_COMMAND {
            reset_conversation(self.storage.as_ref(), user_id, tenant_id).await?;
            channel
                .send(OutboundMessage::plain(user_id, self.config.reset_reply.clone()))
                .await?;
            self.notifier
                .notify(&format!(
                    "Session reset: {} ({user_id}) on tenant {tenant_id}",
                    msg.sender_name
                ))
                .await;
            return Ok(PipelineOutcome::Reset);
        }

        let Turn { command, reply } = self
            .exchange(tenant_id, user_id, &msg.sender_name, text)
            .await?;

        channel
            .send(OutboundMessage::html(user_id, to_html(&reply)))
            .await?;

        Ok(PipelineOutcome::Replied { command, reply })
    }

    /// Classifies, answers and records one message. Nothing is sent.
    async fn exchange(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        sender_name: &str,
        text: &str,
    ) -> Result<Turn, BotfleetError> {
        let session = self.storage.get_session(user_id, tenant_id).await?;
        let current = session.current_command().to_string();

        let classifier_prompt = self
            .assembler
            .classifier_prompt(tenant_id, &current)
            .await?;
        let command = self.classifier.classify(text, &classifier_prompt).await;
        info!(%tenant_id, user_id, from = %current, to = %command, "command classified");

        self.notifier
            .notify(&format!(
                "New message on tenant {tenant_id}\n{sender_name} ({user_id})\n\"{text}\"\n{current} -> {command}"
            ))
            .await;

        let prompt = self
            .assembler
            .assemble(tenant_id, &command, Some(user_id))
            .await?;
        let reply = self.responder.respond(text, &prompt, &session.history).await;

        self.storage
            .record_exchange(&Exchange {
                user_id: user_id.to_string(),
                tenant_id,
                new_command: command.clone(),
                prior_history: session.history,
                user_text: text.to_string(),
                reply: reply.clone(),
            })
            .await?;

        Ok(Turn { command, reply })
    }

    /// Runs one exchange without a messaging channel.
    ///
    /// Without `tenant_id` the active tenant with the lowest id answers.
    /// The user is not registered and `/reset` gets no special treatment.
    /// Errors are returned to the caller instead of being answered.
    pub async fn converse(
        &self,
        user_id: &str,
        text: &str,
        tenant_id: Option<TenantId>,
    ) -> Result<Conversation, BotfleetError> {
        if user_id.trim().is_empty() || text.trim().is_empty() {
            return Err(BotfleetError::Validation(
                "user id and message are required".into(),
            ));
        }
        let tenant_id = match tenant_id {
            Some(id) => {
                self.storage
                    .get_tenant(id)
                    .await?
                    .ok_or_else(|| BotfleetError::tenant_not_found(id))?
                    .id
            }
            None => self
                .storage
                .list_tenants()
                .await?
                .into_iter()
                .find(|t| t.active)
                .map(|t| t.id)
                .ok_or_else(|| BotfleetError::Validation("no active tenant".into()))?,
        };

        let guard = match &self.locks {
            Some(locks) => Some(locks.acquire((user_id.to_string(), tenant_id)).await),
            None => None,
        };
        let outcome = async {
            let turn = self.exchange(tenant_id, user_id, user_id, text).await?;
            let session = self.storage.get_session(user_id, tenant_id).await?;
            Ok::<_, BotfleetError>((turn.reply, session))
        }
        .await;
        drop(guard);
        if let Some(locks) = &self.locks {
            locks.prune_idle();
        }

        let (reply, session) = outcome?;
        Ok(Conversation {
            reply,
            session,
            tenant_id,
        })
    }
}

#[async_trait]
impl InboundHandler for ConversationPipeline {
    async fn handle(
        &self,
        tenant_id: TenantId,
        channel: Arc<dyn ChannelAdapter>,
        msg: InboundMessage,
    ) {
        self.process(tenant_id, channel.as_ref(), &msg).await;
    }
}
