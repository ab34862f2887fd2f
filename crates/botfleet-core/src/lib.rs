// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Botfleet multi-tenant bot backend.
//!
//! This crate provides the trait definitions, error types, and common types
//! used throughout the Botfleet workspace. Stores, channels and the inference
//! collaborator all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BotfleetError;
pub use types::{
    AdapterType, BroadcastReport, HealthStatus, MessageId, RESET_COMMAND, START_COMMAND, TenantId,
};

pub use traits::{
    ChannelAdapter, ChannelFactory, ContextStore, InferenceAdapter, MessageLog, PluginAdapter,
    SessionStore, StorageAdapter, TenantStore, UserStore,
};
