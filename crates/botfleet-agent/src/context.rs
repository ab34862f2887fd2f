// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly from tenant base prompts, command contexts and user context.
//!
//! Every lookup falls back to the tenant's `/start` context when the
//! requested command has none. The assembled system prompt always reads
//! base prompt first and per-user context last.

use std::sync::Arc;

use botfleet_core::types::{CommandContext, TenantId, START_COMMAND};
use botfleet_core::{BotfleetError, StorageAdapter};
use tracing::debug;

/// Separator placed between prompt layers.
pub const PROMPT_SEPARATOR: &str = "\n---\n";

/// Heading placed before the per-user context.
pub const USER_CONTEXT_HEADING: &str = "User context:\n";

/// Concatenates the prompt layers in their fixed order.
///
/// The user layer is appended only when `user_context` is non-empty.
pub fn compose(base_prompt: &str, response_prompt: &str, user_context: Option<&str>) -> String {
    let mut prompt = format!("{base_prompt}{PROMPT_SEPARATOR}{response_prompt}");
    if let Some(ctx) = user_context.filter(|c| !c.is_empty()) {
        prompt.push_str(PROMPT_SEPARATOR);
        prompt.push_str(USER_CONTEXT_HEADING);
        prompt.push_str(ctx);
    }
    prompt
}

/// Builds classifier and responder prompts for a tenant.
pub struct ContextAssembler {
    storage: Arc<dyn StorageAdapter>,
}

impl ContextAssembler {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Looks up the context for `command`, falling back to `/start`.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<Option<CommandContext>, BotfleetError> {
        if let Some(ctx) = self.storage.get_context(tenant_id, command).await? {
            return Ok(Some(ctx));
        }
        if command != START_COMMAND {
            debug!(%tenant_id, command, "no context for command, using /start");
        }
        self.storage.get_context(tenant_id, START_COMMAND).await
    }

    /// The classifier prompt for the user's current command.
    pub async fn classifier_prompt(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<String, BotfleetError> {
        Ok(self
            .resolve(tenant_id, command)
            .await?
            .map(|ctx| ctx.classifier_prompt)
            .unwrap_or_default())
    }

    /// The full system prompt for answering under `command`.
    pub async fn assemble(
        &self,
        tenant_id: TenantId,
        command: &str,
        user_id: Option<&str>,
    ) -> Result<String, BotfleetError> {
        let base = self
            .storage
            .base_prompt(tenant_id)
            .await?
            .unwrap_or_default();
        let response = self
            .resolve(tenant_id, command)
            .await?
            .map(|ctx| ctx.response_prompt)
            .unwrap_or_default();

        let user_context = match user_id {
            Some(id) => self
                .storage
                .get_user(id)
                .await?
                .and_then(|user| user.user_context),
            None => None,
        };

        Ok(compose(&base, &response, user_context.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botfleet_core::UserStore;
    use botfleet_test_utils::TestHarness;

    #[test]
    fn compose_without_user_context() {
        assert_eq!(compose("B", "R", None), "B\n---\nR");
        assert_eq!(compose("B", "R", Some("")), "B\n---\nR");
    }

    #[test]
    fn compose_puts_user_context_last() {
        assert_eq!(
            compose("B", "R", Some("likes tea")),
            "B\n---\nR\n---\nUser context:\nlikes tea"
        );
    }

    #[test]
    fn compose_keeps_empty_layers() {
        assert_eq!(compose("", "", None), "\n---\n");
    }

    #[tokio::test]
    async fn unknown_command_assembles_like_start() {
        let harness = TestHarness::builder().build().await.unwrap();
        let tenant = harness.seed_tenant("alpha", "111:aaa", "BASE").await.unwrap();
        harness
            .seed_context(&tenant, "/start", "C-start", "R-start")
            .await
            .unwrap();
        let assembler = ContextAssembler::new(harness.storage.clone());

        let unknown = assembler.assemble(tenant.id, "/nope", None).await.unwrap();
        let start = assembler.assemble(tenant.id, "/start", None).await.unwrap();
        assert_eq!(unknown, start);
        assert_eq!(start, "BASE\n---\nR-start");

        assert_eq!(
            assembler.classifier_prompt(tenant.id, "/nope").await.unwrap(),
            "C-start"
        );
    }

    #[tokio::test]
    async fn specific_command_wins_over_start() {
        let harness = TestHarness::builder().build().await.unwrap();
        let tenant = harness.seed_tenant("alpha", "111:aaa", "BASE").await.unwrap();
        harness
            .seed_context(&tenant, "/start", "C-start", "R-start")
            .await
            .unwrap();
        harness
            .seed_context(&tenant, "/plan", "C-plan", "R-plan")
            .await
            .unwrap();
        let assembler = ContextAssembler::new(harness.storage.clone());

        assert_eq!(
            assembler.assemble(tenant.id, "/plan", None).await.unwrap(),
            "BASE\n---\nR-plan"
        );
        assert_eq!(
            assembler.classifier_prompt(tenant.id, "/plan").await.unwrap(),
            "C-plan"
        );
    }

    #[tokio::test]
    async fn missing_everything_yields_empty_layers() {
        let harness = TestHarness::builder().build().await.unwrap();
        let tenant = harness.seed_tenant("alpha", "111:aaa", "").await.unwrap();
        let assembler = ContextAssembler::new(harness.storage.clone());

        assert_eq!(
            assembler.classifier_prompt(tenant.id, "/plan").await.unwrap(),
            ""
        );
        assert_eq!(
            assembler.assemble(tenant.id, "/plan", Some("42")).await.unwrap(),
            "\n---\n"
        );
    }

    #[tokio::test]
    async fn user_context_is_appended_for_known_user() {
        let harness = TestHarness::builder().build().await.unwrap();
        let tenant = harness.seed_tenant("alpha", "111:aaa", "BASE").await.unwrap();
        harness
            .seed_context(&tenant, "/start", "C", "R")
            .await
            .unwrap();
        harness.storage.ensure_user("42", "Ann", None).await.unwrap();
        harness
            .storage
            .set_user_context("42", Some("VIP customer"))
            .await
            .unwrap();
        let assembler = ContextAssembler::new(harness.storage.clone());

        assert_eq!(
            assembler.assemble(tenant.id, "/start", Some("42")).await.unwrap(),
            "BASE\n---\nR\n---\nUser context:\nVIP customer"
        );
        // Without a user id the user layer is skipped.
        assert_eq!(
            assembler.assemble(tenant.id, "/start", None).await.unwrap(),
            "BASE\n---\nR"
        );
    }
}
