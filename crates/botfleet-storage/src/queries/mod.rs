// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per record family.

pub mod contexts;
pub mod messages;
pub mod sessions;
pub mod tenants;
pub mod users;
