// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin operations over tenants, contexts and users.
//!
//! Tenant changes that touch the token or the active flag are applied to
//! the [`BotRegistry`] immediately. Contexts are exchanged in the
//! `{baseBrainContext, contexts: {cmd: {classifier, response, section}}}`
//! document shape, both for reading and for bulk import.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use botfleet_config::model::BootstrapConfig;
use botfleet_core::types::{
    BroadcastReport, CommandContext, Message, NewTenant, Tenant, TenantId, TenantSummary,
    TenantUpdate, User, DEFAULT_SECTION,
};
use botfleet_core::{BotfleetError, StorageAdapter};
use botfleet_security::mask_token;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::control::ControlOps;
use crate::locks::TenantLocks;
use crate::registry::BotRegistry;

/// One command context in document form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    #[serde(default)]
    pub classifier: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub section: Option<String>,
}

/// A tenant's base prompt and contexts keyed by command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextsDocument {
    #[serde(rename = "baseBrainContext", default)]
    pub base_prompt: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextEntry>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub base_prompt_updated: bool,
    pub contexts: usize,
}

fn require_non_empty(field: &str, value: &str) -> Result<(), BotfleetError> {
    if value.trim().is_empty() {
        return Err(BotfleetError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn section_or_default(section: Option<String>) -> String {
    section
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SECTION.to_string())
}

/// Masks the token of a tenant for display.
pub fn summarize(tenant: Tenant, running: bool) -> TenantSummary {
    TenantSummary {
        token: mask_token(&tenant.token),
        id: tenant.id,
        name: tenant.name,
        active: tenant.active,
        running,
        created_at: tenant.created_at,
    }
}

async fn require_tenant(
    storage: &dyn StorageAdapter,
    tenant_id: TenantId,
) -> Result<(), BotfleetError> {
    match storage.get_tenant(tenant_id).await? {
        Some(_) => Ok(()),
        None => Err(BotfleetError::tenant_not_found(tenant_id)),
    }
}

async fn upsert_entry(
    storage: &dyn StorageAdapter,
    tenant_id: TenantId,
    command: &str,
    entry: ContextEntry,
) -> Result<(), BotfleetError> {
    require_non_empty("command", command)?;
    storage
        .upsert_context(&CommandContext {
            tenant_id,
            command: command.to_string(),
            classifier_prompt: entry.classifier,
            response_prompt: entry.response,
            section: section_or_default(entry.section),
        })
        .await
}

/// Imports a contexts document into a stored tenant.
///
/// Listed commands are inserted or replaced; other commands are kept. An
/// empty or missing `baseBrainContext` leaves the base prompt unchanged.
pub async fn import_contexts(
    storage: &dyn StorageAdapter,
    tenant_id: TenantId,
    json: &str,
) -> Result<ImportSummary, BotfleetError> {
    let document: ContextsDocument = serde_json::from_str(json)
        .map_err(|e| BotfleetError::Validation(format!("invalid contexts document: {e}")))?;
    require_tenant(storage, tenant_id).await?;

    let mut summary = ImportSummary {
        base_prompt_updated: false,
        contexts: 0,
    };
    if let Some(base) = document.base_prompt.filter(|b| !b.is_empty()) {
        storage.set_base_prompt(tenant_id, &base).await?;
        summary.base_prompt_updated = true;
    }
    for (command, entry) in document.contexts {
        upsert_entry(storage, tenant_id, &command, entry).await?;
        summary.contexts += 1;
    }

    info!(
        %tenant_id,
        contexts = summary.contexts,
        base_prompt = summary.base_prompt_updated,
        "contexts imported"
    );
    Ok(summary)
}

/// Reads a contexts document from disk and imports it.
pub async fn import_contexts_file(
    storage: &dyn StorageAdapter,
    tenant_id: TenantId,
    path: &Path,
) -> Result<ImportSummary, BotfleetError> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        BotfleetError::Config(format!("cannot read contexts file {}: {e}", path.display()))
    })?;
    import_contexts(storage, tenant_id, &json).await
}

pub struct AdminService {
    storage: Arc<dyn StorageAdapter>,
    registry: Arc<BotRegistry>,
    control: ControlOps,
    /// Held across a tenant's store write and the matching registry change.
    edits: TenantLocks,
}

impl AdminService {
    pub fn new(storage: Arc<dyn StorageAdapter>, registry: Arc<BotRegistry>) -> Self {
        let control = ControlOps::new(Arc::clone(&storage), Arc::clone(&registry));
        Self {
            storage,
            registry,
            control,
            edits: TenantLocks::new(),
        }
    }

    pub fn control(&self) -> &ControlOps {
        &self.control
    }

    // --- Tenants ---

    /// Every tenant with its token masked and its running state.
    pub async fn list_tenants(&self) -> Result<Vec<TenantSummary>, BotfleetError> {
        let running = self.registry.running().await;
        let tenants = self.storage.list_tenants().await?;
        Ok(tenants
            .into_iter()
            .map(|t| {
                let is_running = running.contains(&t.id);
                summarize(t, is_running)
            })
            .collect())
    }

    /// Persists a tenant and starts it when active.
    ///
    /// A start failure is logged; the tenant stays stored and stopped.
    pub async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, BotfleetError> {
        require_non_empty("name", &tenant.name)?;
        require_non_empty("token", &tenant.token)?;

        let created = self.storage.create_tenant(&tenant).await?;
        info!(tenant_id = %created.id, tenant = %created.name, "tenant created");

        if created.active
            && let Err(e) = self.registry.start(&created).await
        {
            warn!(tenant_id = %created.id, error = %e, "new tenant failed to start");
        }
        Ok(created)
    }

    /// Applies a partial update and brings the listener in line with it.
    ///
    /// Deactivation stops the tenant. A token change or an explicit
    /// activation restarts it.
    pub async fn update_tenant(
        &self,
        id: TenantId,
        update: TenantUpdate,
    ) -> Result<Tenant, BotfleetError> {
        if let Some(name) = &update.name {
            require_non_empty("name", name)?;
        }
        if let Some(token) = &update.token {
            require_non_empty("token", token)?;
        }

        let edit = self.edits.acquire(id).await;
        let result = self.apply_update(id, &update).await;
        drop(edit);
        self.edits.prune_idle();
        result
    }

    /// Caller holds the tenant's edit lock.
    async fn apply_update(
        &self,
        id: TenantId,
        update: &TenantUpdate,
    ) -> Result<Tenant, BotfleetError> {
        let current = self
            .storage
            .get_tenant(id)
            .await?
            .ok_or_else(|| BotfleetError::tenant_not_found(id))?;
        let updated = self
            .storage
            .update_tenant(id, update)
            .await?
            .ok_or_else(|| BotfleetError::tenant_not_found(id))?;
        info!(tenant_id = %id, "tenant updated");

        if !updated.active {
            self.registry.stop(id).await;
        } else if update.affects_listener(&current) || update.active == Some(true) {
            if let Err(e) = self.registry.restart(&updated).await {
                warn!(tenant_id = %id, error = %e, "tenant failed to restart");
            }
        }
        Ok(updated)
    }

    /// Stops the tenant and deletes it with its contexts, sessions and messages.
    pub async fn delete_tenant(&self, id: TenantId) -> Result<(), BotfleetError> {
        let edit = self.edits.acquire(id).await;
        self.registry.stop(id).await;
        let deleted = self.storage.delete_tenant(id).await;
        drop(edit);
        self.edits.prune_idle();

        if !deleted? {
            return Err(BotfleetError::tenant_not_found(id));
        }
        info!(tenant_id = %id, "tenant deleted");
        Ok(())
    }

    // --- Contexts ---

    pub async fn load_contexts(&self, tenant_id: TenantId) -> Result<ContextsDocument, BotfleetError> {
        let base_prompt = self
            .storage
            .base_prompt(tenant_id)
            .await?
            .ok_or_else(|| BotfleetError::tenant_not_found(tenant_id))?;
        let contexts = self
            .storage
            .list_contexts(tenant_id)
            .await?
            .into_iter()
            .map(|ctx| {
                (
                    ctx.command,
                    ContextEntry {
                        classifier: ctx.classifier_prompt,
                        response: ctx.response_prompt,
                        section: Some(ctx.section),
                    },
                )
            })
            .collect();
        Ok(ContextsDocument {
            base_prompt: Some(base_prompt),
            contexts,
        })
    }

    /// Inserts or replaces one command context.
    pub async fn update_context(
        &self,
        tenant_id: TenantId,
        command: &str,
        entry: ContextEntry,
    ) -> Result<(), BotfleetError> {
        require_tenant(self.storage.as_ref(), tenant_id).await?;
        upsert_entry(self.storage.as_ref(), tenant_id, command, entry).await
    }

    /// Returns whether a context was deleted.
    pub async fn delete_context(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<bool, BotfleetError> {
        require_non_empty("command", command)?;
        self.storage.delete_context(tenant_id, command).await
    }

    pub async fn update_base_prompt(
        &self,
        tenant_id: TenantId,
        prompt: &str,
    ) -> Result<(), BotfleetError> {
        if !self.storage.set_base_prompt(tenant_id, prompt).await? {
            return Err(BotfleetError::tenant_not_found(tenant_id));
        }
        Ok(())
    }

    pub async fn import_contexts(
        &self,
        tenant_id: TenantId,
        json: &str,
    ) -> Result<ImportSummary, BotfleetError> {
        import_contexts(self.storage.as_ref(), tenant_id, json).await
    }

    pub async fn import_contexts_file(
        &self,
        tenant_id: TenantId,
        path: &Path,
    ) -> Result<ImportSummary, BotfleetError> {
        import_contexts_file(self.storage.as_ref(), tenant_id, path).await
    }

    // --- Users ---

    pub async fn list_users(&self) -> Result<Vec<User>, BotfleetError> {
        self.storage.list_users().await
    }

    pub async fn user_messages(
        &self,
        user_id: &str,
        tenant_id: Option<TenantId>,
    ) -> Result<Vec<Message>, BotfleetError> {
        self.storage.messages_for_user(user_id, tenant_id).await
    }

    /// Sets or clears the per-user context. An empty string clears it.
    pub async fn set_user_context(
        &self,
        user_id: &str,
        context: Option<&str>,
    ) -> Result<(), BotfleetError> {
        let context = context.filter(|c| !c.is_empty());
        if !self.storage.set_user_context(user_id, context).await? {
            return Err(BotfleetError::NotFound {
                entity: "user".into(),
                key: user_id.to_string(),
            });
        }
        Ok(())
    }

    pub async fn send_to_user(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        text: &str,
    ) -> Result<(), BotfleetError> {
        require_non_empty("message", text)?;
        self.control.send_to_user(tenant_id, user_id, text).await
    }

    pub async fn broadcast(
        &self,
        tenant_id: TenantId,
        text: &str,
    ) -> Result<BroadcastReport, BotfleetError> {
        require_non_empty("message", text)?;
        self.control.broadcast(tenant_id, text).await
    }

    // --- Bootstrap ---

    /// Seeds the default tenant when the database has none.
    ///
    /// Returns the created tenant, or `None` when nothing was seeded. The
    /// tenant is stored but not started.
    pub async fn bootstrap(
        &self,
        config: &BootstrapConfig,
    ) -> Result<Option<Tenant>, BotfleetError> {
        let Some(token) = config.default_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        if !self.storage.list_tenants().await?.is_empty() {
            return Ok(None);
        }

        let tenant = self
            .storage
            .create_tenant(&NewTenant {
                name: config.default_name.clone(),
                token: token.to_string(),
                base_prompt: String::new(),
                active: true,
            })
            .await?;
        info!(tenant_id = %tenant.id, tenant = %tenant.name, "default tenant created");

        if let Some(file) = &config.contexts_file {
            self.import_contexts_file(tenant.id, Path::new(file)).await?;
        }
        Ok(Some(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_parses_camel_case_base_prompt() {
        let doc: ContextsDocument = serde_json::from_str(
            r#"{
                "baseBrainContext": "You are helpful.",
                "contexts": {
                    "/start": {"classifier": "C", "response": "R", "section": "intro"},
                    "/plan": {"response": "only response"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(doc.base_prompt.as_deref(), Some("You are helpful."));
        assert_eq!(doc.contexts.len(), 2);
        assert_eq!(doc.contexts["/plan"].classifier, "");
        assert_eq!(doc.contexts["/plan"].section, None);
        assert_eq!(doc.contexts["/start"].section.as_deref(), Some("intro"));
    }

    #[test]
    fn document_fields_are_optional() {
        let doc: ContextsDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, ContextsDocument::default());
    }

    #[test]
    fn blank_section_becomes_default() {
        assert_eq!(section_or_default(None), DEFAULT_SECTION);
        assert_eq!(section_or_default(Some("  ".into())), DEFAULT_SECTION);
        assert_eq!(section_or_default(Some("billing".into())), "billing");
    }
}
