// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for log output and operator-facing listings.
//!
//! Two complementary mechanisms:
//! 1. **Regex-based**: catches known secret formats (OpenRouter keys, Bearer
//!    headers, Telegram bot tokens).
//! 2. **Exact-match**: catches configured values registered at startup, such
//!    as tenant tokens that do not match any pattern.

use std::io::Write;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

/// Known secret patterns to redact from output.
static REDACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // OpenRouter keys: sk-or-v1-...
        r"sk-or-[a-zA-Z0-9_\-]{20,}",
        // Generic secret keys: sk-...
        r"sk-[a-zA-Z0-9]{20,}",
        // Bearer tokens in headers
        r"Bearer\s+[a-zA-Z0-9._\-]{10,}",
        // Telegram bot tokens: 123456789:ABCdefGHI-zyx57W2v1u123ew11
        r"\d{8,10}:[a-zA-Z0-9_\-]{35}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// The redaction placeholder.
const REDACTED: &str = "[REDACTED]";

/// Number of leading token characters an operator is allowed to see.
const MASK_VISIBLE: usize = 5;

/// Shared list of exact values to redact. Cloned into every writer.
pub type SecretList = Arc<RwLock<Vec<String>>>;

/// Show only the first five characters of a token followed by `...`.
///
/// Tokens shorter than that are fully hidden.
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= MASK_VISIBLE {
        return "...".to_string();
    }
    let visible: String = token.chars().take(MASK_VISIBLE).collect();
    format!("{visible}...")
}

/// Redact secrets from a string using regex patterns and exact-match values.
pub fn redact(input: &str, secrets: &[String]) -> String {
    let mut result = input.to_string();

    for pattern in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).to_string();
    }

    // Longest first so a secret that contains another is replaced whole.
    let mut sorted: Vec<&String> = secrets.iter().collect();
    sorted.sort_by_key(|v| std::cmp::Reverse(v.len()));
    for value in sorted {
        if !value.is_empty() {
            result = result.replace(value.as_str(), REDACTED);
        }
    }

    result
}

/// A writer wrapper that redacts secrets before forwarding to `inner`.
pub struct RedactingWriter<W> {
    inner: W,
    secrets: SecretList,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, secrets: SecretList) -> Self {
        Self { inner, secrets }
    }

    /// Add a value to the exact-match list, ignoring duplicates and empties.
    pub fn add_secret(secrets: &SecretList, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        if let Ok(mut values) = secrets.write()
            && !values.contains(&value)
        {
            values.push(value);
        }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        let secrets = self
            .secrets
            .read()
            .map(|v| v.clone())
            .unwrap_or_default();
        let redacted = redact(&input, &secrets);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` for the fmt subscriber: every event goes to stderr through
/// a [`RedactingWriter`].
#[derive(Clone)]
pub struct RedactingMakeWriter {
    secrets: SecretList,
}

impl RedactingMakeWriter {
    pub fn new(secrets: SecretList) -> Self {
        Self { secrets }
    }
}

impl<'a> MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter<std::io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(std::io::stderr(), Arc::clone(&self.secrets))
    }
}
