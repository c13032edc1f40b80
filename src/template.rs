//! Message templates with a single name placeholder.

use crate::error::ValidationError;

pub const DEFAULT_TOKEN: &str = "{NOME}";
pub const DEFAULT_PREVIEW_NAME: &str = "João Silva";
/// Used when no default message has been saved yet.
pub const FALLBACK_TEMPLATE: &str = "Olá {NOME}! Como posso ajudá-lo hoje?";

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    token: String,
    preview_name: String,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN, DEFAULT_PREVIEW_NAME)
    }
}

impl TemplateEngine {
    pub fn new(token: impl Into<String>, preview_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            preview_name: preview_name.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Replace every literal occurrence of the token with `name`.
    pub fn render(&self, template: &str, name: &str) -> String {
        if self.token.is_empty() {
            return template.to_string();
        }
        template.replace(&self.token, name)
    }

    /// Render with the example name. Nothing is persisted.
    pub fn preview(&self, template: &str) -> String {
        self.render(template, &self.preview_name)
    }

    /// The fallback template, with the default token swapped for the
    /// configured one.
    pub fn fallback(&self) -> String {
        FALLBACK_TEMPLATE.replace(DEFAULT_TOKEN, &self.token)
    }
}

/// Trim a message for saving; empty messages are rejected.
pub fn validate_message(message: &str) -> Result<String, ValidationError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        let engine = TemplateEngine::default();
        assert_eq!(engine.render("{NOME}, {NOME}!", "Ana"), "Ana, Ana!");
        assert_eq!(
            engine.render("Olá {NOME}! Como posso ajudá-lo hoje?", "João Silva"),
            "Olá João Silva! Como posso ajudá-lo hoje?"
        );
    }

    #[test]
    fn token_is_case_sensitive() {
        let engine = TemplateEngine::default();
        assert_eq!(engine.render("Oi {nome} {Nome}", "Ana"), "Oi {nome} {Nome}");
    }

    #[test]
    fn template_without_token_is_unchanged() {
        let engine = TemplateEngine::default();
        let template = "Olá! Como posso ajudá-lo?";
        let once = engine.render(template, "Ana");
        assert_eq!(once, template);
        assert_eq!(engine.render(&once, "Bob"), once);
    }

    #[test]
    fn name_containing_token_is_not_expanded_again() {
        let engine = TemplateEngine::default();
        assert_eq!(engine.render("Oi {NOME}", "{NOME}"), "Oi {NOME}");
    }

    #[test]
    fn preview_uses_example_name() {
        let engine = TemplateEngine::default();
        assert_eq!(engine.preview("Oi {NOME}"), "Oi João Silva");
    }

    #[test]
    fn custom_token() {
        let engine = TemplateEngine::new("{{name}}", "Maria");
        assert_eq!(engine.render("Hi {{name}} {NOME}", "Ana"), "Hi Ana {NOME}");
        assert_eq!(engine.fallback(), "Olá {{name}}! Como posso ajudá-lo hoje?");
        assert_eq!(engine.preview("{{name}}"), "Maria");
    }

    #[test]
    fn validate_message_trims() {
        assert_eq!(validate_message("  Oi {NOME}\n").unwrap(), "Oi {NOME}");
        assert_eq!(validate_message(" \t\n"), Err(ValidationError::EmptyMessage));
    }
}
