//! Prompt template mini-language.
//!
//! Supports scalar substitution (`$prompt`, `$sentiment`, and per-entry
//! `$emotion`, `$score`, `$topic`, `$redirection`) and two fixed levels of
//! repetition: an `emotion` block that may contain a `redirection` block:
//!
//! ```text
//! {foreach emotion}
//! - $emotion ($score) [Topic: $topic]
//! {foreach redirection}
//!   → $redirection
//! {/foreach redirection}
//! {/foreach emotion}
//! ```
//!
//! Templates are parsed once into an AST and rendered against a
//! [`PromptContext`]; rendering never re-scans text, and substituted
//! values are never re-expanded. Unknown placeholders are inert: they
//! render as their literal `$name` text. This is deliberately not a
//! general template language; two nesting levels are the entire contract.

use crate::error::{JournalError, Result};

/// Sentinel rendered for an emotion whose score is unknown.
const MISSING_SCORE: &str = "N/A";

/// Deepest block nesting the language accepts.
const MAX_LOOP_DEPTH: usize = 2;

// ── Render context ──────────────────────────────────────────────────────

/// The merged data one feedback-generation call feeds into expansion.
///
/// Built fresh per request and discarded when the call completes.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Effective system prompt text.
    pub prompt: String,
    /// Detected sentiment label.
    pub sentiment_label: String,
    /// One entry per emotion block, in display order, unique by label.
    pub emotions: Vec<EmotionItem>,
}

/// One emotion entry of a [`PromptContext`].
#[derive(Debug, Clone)]
pub struct EmotionItem {
    /// Emotion label.
    pub emotion: String,
    /// Score, if the caller supplied one. `None` renders as `"N/A"`.
    pub score: Option<f32>,
    /// Insight topic, or the fallback when no insight matched.
    pub topic: String,
    /// Insight redirections; empty collapses the inner block.
    pub redirection: Vec<String>,
}

// ── AST ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(String),
    Scalar(String),
    Loop { name: String, body: Vec<Node> },
}

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error on an unterminated or mismatched `{foreach}`
    /// block, or on nesting deeper than two levels.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            rest: source,
            depth: 0,
        };
        let nodes = parser.parse_block(None)?;
        Ok(Self { nodes })
    }

    /// Render the template against a context.
    ///
    /// Each block iteration is trimmed of surrounding whitespace and
    /// iterations are joined with single newlines. Rendering is
    /// infallible: unknown scalars stay inert and unknown blocks collapse
    /// to nothing.
    #[must_use]
    pub fn render(&self, context: &PromptContext) -> String {
        let scope = Scope {
            context,
            item: None,
            redirection: None,
        };
        render_nodes(&self.nodes, &scope)
    }
}

// ── Parser ──────────────────────────────────────────────────────────────

struct Parser<'a> {
    rest: &'a str,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Parse nodes until end of input (top level) or the closing tag of
    /// `enclosing`.
    fn parse_block(&mut self, enclosing: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut literal = String::new();

        loop {
            let Some(idx) = self.rest.find(['$', '{']) else {
                literal.push_str(self.rest);
                self.rest = "";
                break;
            };

            literal.push_str(&self.rest[..idx]);
            self.rest = &self.rest[idx..];

            if let Some(name) = self.rest.strip_prefix('$').map(leading_identifier) {
                if name.is_empty() {
                    // Bare '$' with no identifier: plain text.
                    literal.push('$');
                    self.rest = &self.rest[1..];
                } else {
                    flush_literal(&mut literal, &mut nodes);
                    nodes.push(Node::Scalar(name.to_owned()));
                    self.rest = &self.rest[1 + name.len()..];
                }
            } else if let Some((name, tag_len)) = parse_tag(self.rest, "{/foreach ") {
                if enclosing == Some(name) {
                    flush_literal(&mut literal, &mut nodes);
                    self.rest = &self.rest[tag_len..];
                    return Ok(nodes);
                }
                return Err(JournalError::Template(format!(
                    "unexpected closing block '{{/foreach {name}}}'"
                )));
            } else if let Some((name, tag_len)) = parse_tag(self.rest, "{foreach ") {
                if self.depth == MAX_LOOP_DEPTH {
                    return Err(JournalError::Template(format!(
                        "block '{{foreach {name}}}' exceeds the maximum nesting depth of {MAX_LOOP_DEPTH}"
                    )));
                }
                flush_literal(&mut literal, &mut nodes);
                let name = name.to_owned();
                self.rest = &self.rest[tag_len..];
                self.depth += 1;
                let body = self.parse_block(Some(name.as_str()))?;
                self.depth -= 1;
                nodes.push(Node::Loop { name, body });
            } else {
                // A '{' that opens no recognized tag: plain text.
                literal.push('{');
                self.rest = &self.rest[1..];
            }
        }

        if let Some(name) = enclosing {
            return Err(JournalError::Template(format!(
                "unterminated block '{{foreach {name}}}'"
            )));
        }

        flush_literal(&mut literal, &mut nodes);
        Ok(nodes)
    }
}

fn flush_literal(literal: &mut String, nodes: &mut Vec<Node>) {
    if !literal.is_empty() {
        nodes.push(Node::Literal(std::mem::take(literal)));
    }
}

/// Longest leading `[A-Za-z0-9_]` run of `input`.
fn leading_identifier(input: &str) -> &str {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(input.len());
    &input[..end]
}

/// Match `{keyword name}` at the start of `input`; returns the name and
/// the tag's total length.
fn parse_tag<'a>(input: &'a str, keyword: &str) -> Option<(&'a str, usize)> {
    let after = input.strip_prefix(keyword)?;
    let end = after.find('}')?;
    let name = &after[..end];
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some((name, keyword.len() + end + 1))
}

// ── Renderer ────────────────────────────────────────────────────────────

struct Scope<'a> {
    context: &'a PromptContext,
    item: Option<&'a EmotionItem>,
    redirection: Option<&'a str>,
}

impl Scope<'_> {
    fn resolve(&self, name: &str) -> Option<String> {
        match name {
            "prompt" => Some(self.context.prompt.clone()),
            "sentiment" => Some(self.context.sentiment_label.clone()),
            "emotion" => self.item.map(|i| i.emotion.clone()),
            "topic" => self.item.map(|i| i.topic.clone()),
            "score" => self.item.map(|i| format_score(i.score)),
            "redirection" => self.redirection.map(str::to_owned),
            _ => None,
        }
    }
}

/// Format a score for display: 3 decimals, or the `"N/A"` sentinel when
/// the score is unknown. Scores are never fabricated.
#[must_use]
pub fn format_score(score: Option<f32>) -> String {
    match score {
        Some(value) => format!("{value:.3}"),
        None => MISSING_SCORE.to_owned(),
    }
}

fn render_nodes(nodes: &[Node], scope: &Scope<'_>) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Scalar(name) => match scope.resolve(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            },
            Node::Loop { name, body } => out.push_str(&render_loop(name, body, scope)),
        }
    }
    out
}

fn render_loop(name: &str, body: &[Node], scope: &Scope<'_>) -> String {
    match name {
        "emotion" if scope.item.is_none() => scope
            .context
            .emotions
            .iter()
            .map(|item| {
                let inner = Scope {
                    context: scope.context,
                    item: Some(item),
                    redirection: None,
                };
                render_nodes(body, &inner).trim().to_owned()
            })
            .collect::<Vec<_>>()
            .join("\n"),
        "redirection" => match scope.item {
            Some(item) => item
                .redirection
                .iter()
                .map(|redirection| {
                    let inner = Scope {
                        context: scope.context,
                        item: scope.item,
                        redirection: Some(redirection),
                    };
                    render_nodes(body, &inner).trim().to_owned()
                })
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        },
        _ => String::new(),
    }
}
