// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification: maps a user message to the next command token.

use std::sync::Arc;

use botfleet_core::InferenceAdapter;
use botfleet_core::types::{InferenceRequest, START_COMMAND};
use tracing::{debug, warn};

pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a user-intent classifier.";

const CLASSIFIER_INSTRUCTION: &str = "Analyze the user message and return ONLY the command (e.g. /start, /goLife, /plan) without explanation.";

/// Builds the user-role content sent to the classifier.
pub fn classifier_user_text(classifier_prompt: &str, user_message: &str) -> String {
    format!("{classifier_prompt}\n\n{CLASSIFIER_INSTRUCTION}\n\nUser message: \"{user_message}\"")
}

/// Asks the inference collaborator which command a message belongs to.
///
/// Never fails: provider errors and empty answers both yield `/start`.
/// The answer is otherwise used verbatim, without checking it against the
/// tenant's known contexts.
pub struct IntentClassifier {
    provider: Arc<dyn InferenceAdapter>,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn InferenceAdapter>) -> Self {
        Self { provider }
    }

    pub async fn classify(&self, user_message: &str, classifier_prompt: &str) -> String {
        let request = InferenceRequest {
            model: None,
            system_prompt: CLASSIFIER_SYSTEM_PROMPT.to_string(),
            turns: Vec::new(),
            user_text: classifier_user_text(classifier_prompt, user_message),
        };

        match self.provider.infer(request).await {
            Ok(answer) => {
                let command = answer.trim();
                if command.is_empty() {
                    debug!("classifier returned nothing, using /start");
                    START_COMMAND.to_string()
                } else {
                    command.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "intent classification failed, using /start");
                START_COMMAND.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botfleet_test_utils::MockProvider;
    use tracing_test::traced_test;

    #[test]
    fn user_text_layout() {
        assert_eq!(
            classifier_user_text("C", "hello"),
            "C\n\nAnalyze the user message and return ONLY the command (e.g. /start, /goLife, /plan) without explanation.\n\nUser message: \"hello\""
        );
    }

    #[tokio::test]
    async fn answer_is_trimmed_and_used_verbatim() {
        let provider = Arc::new(MockProvider::with_responses(vec!["  /goLife \n".into()]));
        let classifier = IntentClassifier::new(provider.clone());
        assert_eq!(classifier.classify("hi", "C").await, "/goLife");

        let requests = provider.requests().await;
        assert_eq!(requests[0].system_prompt, CLASSIFIER_SYSTEM_PROMPT);
        assert!(requests[0].turns.is_empty());
        assert!(requests[0].user_text.starts_with("C\n\n"));
    }

    #[tokio::test]
    async fn unknown_commands_are_not_validated() {
        let provider = Arc::new(MockProvider::with_responses(vec!["/whatever".into()]));
        let classifier = IntentClassifier::new(provider);
        assert_eq!(classifier.classify("hi", "C").await, "/whatever");
    }

    #[tokio::test]
    #[traced_test]
    async fn error_means_start() {
        let provider = Arc::new(MockProvider::new());
        provider.push_error("upstream down").await;
        let classifier = IntentClassifier::new(provider);
        assert_eq!(classifier.classify("hi", "C").await, START_COMMAND);
        assert!(logs_contain("intent classification failed"));
    }

    #[tokio::test]
    async fn blank_answer_means_start() {
        let provider = Arc::new(MockProvider::with_responses(vec!["   ".into()]));
        let classifier = IntentClassifier::new(provider);
        assert_eq!(classifier.classify("hi", "C").await, START_COMMAND);
    }
}
