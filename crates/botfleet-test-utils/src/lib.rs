// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Botfleet integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock inference collaborator with scripted replies
//! - [`MockChannel`] - Mock messaging channel with message injection and capture
//! - [`MockChannelFactory`] - Builds and tracks a [`MockChannel`] per tenant
//! - [`TestHarness`] - Temp SQLite storage wired to the mocks

pub mod harness;
pub mod mock_channel;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_channel::{MockChannel, MockChannelFactory, inbound};
pub use mock_provider::MockProvider;
