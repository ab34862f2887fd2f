// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of running tenant listeners.
//!
//! Each running tenant owns one channel built from its token and one
//! background task that receives messages sequentially and hands every
//! message to the [`InboundHandler`] on its own task.
//!
//! Start, stop and restart of one tenant are serialized by a per-tenant
//! lock. The shared listener map is only locked for lookups and inserts,
//! never across a channel connect or shutdown. A token stays reserved
//! while its channel connects or closes, so two listeners never hold the
//! same token.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use botfleet_core::types::{InboundMessage, Tenant, TenantId};
use botfleet_core::{BotfleetError, ChannelAdapter, ChannelFactory};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::locks::TenantLocks;

/// Receives every inbound message of every running tenant.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        tenant_id: TenantId,
        channel: Arc<dyn ChannelAdapter>,
        msg: InboundMessage,
    );
}

struct Listener {
    name: String,
    token: String,
    channel: Arc<dyn ChannelAdapter>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Listeners {
    running: HashMap<TenantId, Listener>,
    /// Tokens of tenants whose channel is connecting or closing.
    reserved: HashMap<TenantId, String>,
}

impl Listeners {
    fn token_holder(&self, token: &str) -> Option<TenantId> {
        self.running
            .iter()
            .find(|(_, l)| l.token == token)
            .map(|(id, _)| *id)
            .or_else(|| {
                self.reserved
                    .iter()
                    .find(|(_, t)| t.as_str() == token)
                    .map(|(id, _)| *id)
            })
    }
}

/// Owns the tenant id to listener map.
pub struct BotRegistry {
    factory: Arc<dyn ChannelFactory>,
    handler: Arc<dyn InboundHandler>,
    listeners: Mutex<Listeners>,
    transitions: TenantLocks,
}

impl BotRegistry {
    pub fn new(factory: Arc<dyn ChannelFactory>, handler: Arc<dyn InboundHandler>) -> Self {
        Self {
            factory,
            handler,
            listeners: Mutex::new(Listeners::default()),
            transitions: TenantLocks::new(),
        }
    }

    /// Starts a listener for `tenant`. A tenant that is already running is
    /// left untouched.
    pub async fn start(&self, tenant: &Tenant) -> Result<(), BotfleetError> {
        let transition = self.transitions.acquire(tenant.id).await;
        let result = self.start_exclusive(tenant).await;
        drop(transition);
        self.transitions.prune_idle();
        result
    }

    /// Stops the tenant's listener. Returns whether one was running.
    pub async fn stop(&self, tenant_id: TenantId) -> bool {
        let transition = self.transitions.acquire(tenant_id).await;
        let stopped = self.stop_exclusive(tenant_id).await;
        drop(transition);
        self.transitions.prune_idle();
        stopped
    }

    /// Stops then starts `tenant` as one transition of that tenant.
    ///
    /// An inactive tenant is only stopped.
    pub async fn restart(&self, tenant: &Tenant) -> Result<(), BotfleetError> {
        let transition = self.transitions.acquire(tenant.id).await;
        self.stop_exclusive(tenant.id).await;
        let result = if tenant.active {
            self.start_exclusive(tenant).await
        } else {
            debug!(tenant_id = %tenant.id, "tenant inactive, left stopped");
            Ok(())
        };
        drop(transition);
        self.transitions.prune_idle();
        result
    }

    /// Starts every active tenant. Returns how many are running afterwards.
    pub async fn start_all(&self, tenants: &[Tenant]) -> usize {
        for tenant in tenants.iter().filter(|t| t.active) {
            if let Err(e) = self.start(tenant).await {
                warn!(tenant_id = %tenant.id, tenant = %tenant.name, error = %e, "tenant failed to start");
            }
        }
        let running = self.listeners.lock().await.running.len();
        info!(running, "tenant listeners started");
        running
    }

    /// Stops every listener.
    pub async fn shutdown_all(&self) {
        let drained: Vec<(TenantId, Listener)> =
            self.listeners.lock().await.running.drain().collect();
        for (id, listener) in drained {
            close(id, listener).await;
        }
        info!("all tenant listeners stopped");
    }

    /// Outbound channel of a running tenant.
    pub async fn channel(&self, tenant_id: TenantId) -> Option<Arc<dyn ChannelAdapter>> {
        self.listeners
            .lock()
            .await
            .running
            .get(&tenant_id)
            .map(|l| Arc::clone(&l.channel))
    }

    pub async fn is_running(&self, tenant_id: TenantId) -> bool {
        self.listeners.lock().await.running.contains_key(&tenant_id)
    }

    /// Ids of running tenants, ascending.
    pub async fn running(&self) -> Vec<TenantId> {
        let mut ids: Vec<TenantId> = self
            .listeners
            .lock()
            .await
            .running
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Caller holds the tenant's transition lock.
    async fn start_exclusive(&self, tenant: &Tenant) -> Result<(), BotfleetError> {
        if !tenant.active {
            return Err(BotfleetError::Registry(format!(
                "tenant {} is inactive",
                tenant.id
            )));
        }
        {
            let mut listeners = self.listeners.lock().await;
            if listeners.running.contains_key(&tenant.id) {
                debug!(tenant_id = %tenant.id, "tenant already running");
                return Ok(());
            }
            if let Some(holder) = listeners.token_holder(&tenant.token) {
                return Err(BotfleetError::Registry(format!(
                    "token of tenant {} is already bound by tenant {holder}",
                    tenant.id
                )));
            }
            listeners
                .reserved
                .insert(tenant.id, tenant.token.clone());
        }

        let connected = self.connect(tenant).await;

        let mut listeners = self.listeners.lock().await;
        listeners.reserved.remove(&tenant.id);
        let channel = connected?;
        let task = tokio::spawn(listen(
            tenant.id,
            Arc::clone(&channel),
            Arc::clone(&self.handler),
        ));
        listeners.running.insert(
            tenant.id,
            Listener {
                name: tenant.name.clone(),
                token: tenant.token.clone(),
                channel,
                task,
            },
        );
        info!(tenant_id = %tenant.id, tenant = %tenant.name, "tenant listener started");
        Ok(())
    }

    async fn connect(&self, tenant: &Tenant) -> Result<Arc<dyn ChannelAdapter>, BotfleetError> {
        let mut channel = self.factory.build(tenant)?;
        if let Err(e) = channel.connect().await {
            warn!(tenant_id = %tenant.id, error = %e, "channel connect failed");
            return Err(e);
        }
        Ok(Arc::from(channel))
    }

    /// Caller holds the tenant's transition lock.
    async fn stop_exclusive(&self, tenant_id: TenantId) -> bool {
        let removed = {
            let mut listeners = self.listeners.lock().await;
            let removed = listeners.running.remove(&tenant_id);
            if let Some(listener) = &removed {
                listeners.reserved.insert(tenant_id, listener.token.clone());
            }
            removed
        };
        let Some(listener) = removed else {
            debug!(%tenant_id, "tenant not running, nothing to stop");
            return false;
        };
        close(tenant_id, listener).await;
        self.listeners.lock().await.reserved.remove(&tenant_id);
        true
    }
}

async fn close(tenant_id: TenantId, listener: Listener) {
    if let Err(e) = listener.channel.shutdown().await {
        warn!(%tenant_id, error = %e, "channel shutdown error");
    }
    listener.task.abort();
    info!(%tenant_id, tenant = %listener.name, "tenant listener stopped");
}

/// Receive loop of one tenant. Ends when the channel is closed.
async fn listen(
    tenant_id: TenantId,
    channel: Arc<dyn ChannelAdapter>,
    handler: Arc<dyn InboundHandler>,
) {
    loop {
        match channel.receive().await {
            Ok(msg) => {
                let handler = Arc::clone(&handler);
                let channel = Arc::clone(&channel);
                tokio::spawn(async move {
                    handler.handle(tenant_id, channel, msg).await;
                });
            }
            Err(e) => {
                debug!(%tenant_id, error = %e, "listener closed");
                break;
            }
        }
    }
}
