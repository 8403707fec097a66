//! Message templates: ordered typed components with `{{name}}` placeholders.
//!
//! Variables are derived by scanning text-bearing components, never stored.
//! `personalize` returns an independent copy; the input is never mutated, so
//! one template can be personalized for many recipients concurrently.

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Non-text header media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Image,
    Video,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderContent {
    Text { text: String },
    Media { format: MediaFormat, url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Button {
    QuickReply { text: String },
    Url { text: String, url: String },
    PhoneNumber { text: String, phone: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateComponent {
    Header(HeaderContent),
    Body { text: String },
    Footer { text: String },
    ButtonGroup { buttons: Vec<Button> },
}

impl TemplateComponent {
    fn discriminant(&self) -> &'static str {
        match self {
            TemplateComponent::Header(_) => "header",
            TemplateComponent::Body { .. } => "body",
            TemplateComponent::Footer { .. } => "footer",
            TemplateComponent::ButtonGroup { .. } => "button_group",
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            TemplateComponent::Header(HeaderContent::Text { text })
            | TemplateComponent::Body { text }
            | TemplateComponent::Footer { text } => Some(text),
            _ => None,
        }
    }
}

/// An ordered set of at most one Header/Body/Footer plus at most one
/// ButtonGroup. Body is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub name: String,
    pub components: Vec<TemplateComponent>,
}

impl MessageTemplate {
    pub fn new(
        name: impl Into<String>,
        components: Vec<TemplateComponent>,
    ) -> Result<Self, DomainError> {
        let mut seen: Vec<&'static str> = Vec::with_capacity(4);
        let mut has_body = false;
        for component in &components {
            let tag = component.discriminant();
            if seen.contains(&tag) {
                return Err(DomainError::Template(format!("duplicate {tag} component")));
            }
            seen.push(tag);
            match component {
                TemplateComponent::Body { .. } => has_body = true,
                TemplateComponent::ButtonGroup { buttons } if buttons.len() > 3 => {
                    return Err(DomainError::Template(format!(
                        "button group holds {} buttons (max 3)",
                        buttons.len()
                    )));
                }
                _ => {}
            }
        }
        if !has_body {
            return Err(DomainError::Template("body component is required".into()));
        }
        Ok(Self {
            name: name.into(),
            components,
        })
    }

    /// Convenience: body-only template.
    pub fn body_only(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: vec![TemplateComponent::Body { text: text.into() }],
        }
    }

    /// Body text; the constructor guarantees one exists.
    pub fn body_text(&self) -> &str {
        self.components
            .iter()
            .find_map(|c| match c {
                TemplateComponent::Body { text } => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Distinct `{{name}}` tokens across all text-bearing components, in
    /// first-seen order.
    pub fn extract_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for component in &self.components {
            if let Some(text) = component.text() {
                for name in variable_names(text) {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Deep copy with every resolvable `{{name}}` replaced. Unresolved names
    /// stay as the literal token so callers can detect incomplete
    /// personalization by re-running `extract_variables`.
    pub fn personalize(&self, values: &HashMap<String, String>) -> MessageTemplate {
        let components = self
            .components
            .iter()
            .map(|component| match component {
                TemplateComponent::Header(HeaderContent::Text { text }) => {
                    TemplateComponent::Header(HeaderContent::Text {
                        text: substitute(text, values),
                    })
                }
                TemplateComponent::Body { text } => TemplateComponent::Body {
                    text: substitute(text, values),
                },
                TemplateComponent::Footer { text } => TemplateComponent::Footer {
                    text: substitute(text, values),
                },
                other => other.clone(),
            })
            .collect();
        MessageTemplate {
            name: self.name.clone(),
            components,
        }
    }
}

/// Replace every `{{name}}` occurrence in `text` with `values[name]`.
/// Unknown names are left as-is. Same syntax as template personalization;
/// used directly for plain-text dispatch jobs.
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, name, after)) = next_placeholder(rest) {
        out.push_str(before);
        match values.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Placeholder names in `text`, in order of appearance (with duplicates).
fn variable_names(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some((_, name, after)) = next_placeholder(rest) {
        names.push(name);
        rest = after;
    }
    names
}

/// Scan for the next `{{identifier}}` token. Identifiers match
/// `[A-Za-z_][A-Za-z0-9_]*`; anything else after `{{` is not a placeholder.
/// Returns (text before the token, identifier, text after the token).
fn next_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("{{") {
        let open = search_from + rel;
        let inner = &text[open + 2..];
        if let Some((name, len)) = leading_identifier(inner) {
            if inner[len..].starts_with("}}") {
                let after = &text[open + 2 + len + 2..];
                return Some((&text[..open], name, after));
            }
        }
        // Advance one byte, not two: "{{{name}}" still holds a token at open+1.
        search_from = open + 1;
    }
    None
}

fn leading_identifier(s: &str) -> Option<(&str, usize)> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some((&s[..end], end))
}
