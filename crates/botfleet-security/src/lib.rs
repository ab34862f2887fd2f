// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret handling for the Botfleet backend.
//!
//! Tenant tokens and the inference key must never reach operators or log
//! output in full. This crate masks tokens for display and redacts known
//! secret shapes from everything written by the tracing subscriber.

pub mod redact;

pub use redact::{RedactingMakeWriter, RedactingWriter, SecretList, mask_token, redact};
