//! Placeholder substitution for menu labels and copied values

use crate::command::CommandExecutor;
use crate::constants::template::{COMMAND_VALUE, COMMAND_VALUE_IN_LABEL};

/// Result of rendering a label
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedLabel {
    /// Final label text, truncated
    pub label_value: String,
    /// Output of the label's command, empty when the command was not run
    pub command_value: String,
}

pub struct TemplateEngine<'a> {
    executor: &'a CommandExecutor,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(executor: &'a CommandExecutor) -> Self {
        Self { executor }
    }

    /// Substitute `{{CommandValue}}` in `label`, then truncate to `max_len` characters.
    ///
    /// Without a command (or with an empty one) the token is left as-is.
    pub async fn render_label(
        &self,
        label: &str,
        command: Option<&str>,
        max_len: usize,
    ) -> RenderedLabel {
        match command.filter(|c| !c.is_empty()) {
            Some(command) if label.contains(COMMAND_VALUE) => {
                let command_value = self.executor.run(command).await;
                let substituted = label.replace(COMMAND_VALUE, &command_value);
                RenderedLabel {
                    label_value: truncate_chars(&substituted, max_len),
                    command_value,
                }
            }
            _ => RenderedLabel {
                label_value: truncate_chars(label, max_len),
                command_value: String::new(),
            },
        }
    }

    /// Resolve a copy-value template.
    ///
    /// `{{CommandValue}}` is resolved first (running the command again), then
    /// `{{CommandValueInLabel}}` with the value captured at label render time.
    pub async fn render_value(
        &self,
        template: &str,
        command: Option<&str>,
        command_value_from_label: &str,
    ) -> String {
        let mut value = template.to_string();
        if let Some(command) = command.filter(|c| !c.is_empty())
            && value.contains(COMMAND_VALUE)
        {
            let output = self.executor.run(command).await;
            value = value.replace(COMMAND_VALUE, &output);
        }
        if value.contains(COMMAND_VALUE_IN_LABEL) {
            value = value.replace(COMMAND_VALUE_IN_LABEL, command_value_from_label);
        }
        value
    }
}

/// First `max_len` characters of `text`
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> CommandExecutor {
        CommandExecutor::default()
    }

    #[tokio::test]
    async fn test_label_substitution() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine
            .render_label("X: {{CommandValue}}", Some("echo hi"), 50)
            .await;
        assert_eq!(rendered.label_value, "X: hi");
        assert_eq!(rendered.command_value, "hi");
    }

    #[tokio::test]
    async fn test_label_truncated_after_substitution() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine
            .render_label("Value: {{CommandValue}}", Some("echo abcdefghij"), 10)
            .await;
        assert_eq!(rendered.label_value, "Value: abc");
        assert_eq!(rendered.label_value.chars().count(), 10);
        assert_eq!(rendered.command_value, "abcdefghij");
    }

    #[tokio::test]
    async fn test_plain_label_truncated() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine
            .render_label("A rather long label", Some("echo unused"), 8)
            .await;
        assert_eq!(rendered.label_value, "A rather");
        assert_eq!(rendered.command_value, "");
    }

    #[tokio::test]
    async fn test_token_without_command_left_literal() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine.render_label("CPU {{CommandValue}}", None, 50).await;
        assert_eq!(rendered.label_value, "CPU {{CommandValue}}");
        assert_eq!(rendered.command_value, "");
    }

    #[tokio::test]
    async fn test_empty_command_counts_as_missing() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine.render_label("CPU {{CommandValue}}", Some(""), 50).await;
        assert_eq!(rendered.label_value, "CPU {{CommandValue}}");
        assert_eq!(rendered.command_value, "");

        let value = engine.render_value("{{CommandValue}}!", Some(""), "x").await;
        assert_eq!(value, "{{CommandValue}}!");
    }

    #[tokio::test]
    async fn test_failed_command_text_substituted() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let rendered = engine
            .render_label("{{CommandValue}}", Some("exit 7"), 50)
            .await;
        assert_eq!(rendered.label_value, "Command failed: exit 7");
        assert_eq!(rendered.command_value, "Command failed: exit 7");
    }

    #[tokio::test]
    async fn test_value_uses_label_capture() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let value = engine
            .render_value("code={{CommandValueInLabel}}", Some("echo fresh"), "captured")
            .await;
        assert_eq!(value, "code=captured");
    }

    #[tokio::test]
    async fn test_value_both_tokens_substituted_globally() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let value = engine
            .render_value(
                "{{CommandValue}}/{{CommandValueInLabel}}/{{CommandValue}}/{{CommandValueInLabel}}",
                Some("echo new"),
                "old",
            )
            .await;
        assert_eq!(value, "new/old/new/old");
    }

    #[tokio::test]
    async fn test_value_without_command_keeps_token() {
        let executor = executor();
        let engine = TemplateEngine::new(&executor);
        let value = engine.render_value("{{CommandValue}}", None, "x").await;
        assert_eq!(value, "{{CommandValue}}");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
