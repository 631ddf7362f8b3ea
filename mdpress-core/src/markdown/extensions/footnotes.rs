//! `[^id]` footnote references and `[^id]: text` definitions
//!
//! Definitions are cut out of the source before parsing so they never render as body
//! paragraphs. References are numbered by first-seen position; a reference to an undefined
//! id still gets a number and its entry is filled with placeholder text before publishing.

use crate::component::{ComponentState, MetaField};
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{Extension, RenderContext};
use crate::markdown::references::{ReferenceEntry, ReferenceList};
use crate::markdown::base_options;
use crate::settings::Settings;
use comrak::markdown_to_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::warn;

pub const NAME: &str = "footnotes";

pub const DEFAULT_MISSING_TEXT: &str = "footnote not defined";

static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\^([^\]\s]+)\]").unwrap());
static DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}\[\^([^\]\s]+)\]:[ \t]?(.*)$").unwrap());

fn placeholder(position: usize) -> String {
    format!(r#"<sup class="footnote-ref" data-ref="note:{position}"></sup>"#)
}

fn missing_marker(id: &str) -> String {
    format!(
        r#"<span class="footnote-missing" data-ref="{}"></span>"#,
        html_escape(id)
    )
}

/// Fence character and run length when `line` is a code fence
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    (run >= 3).then_some((marker, run))
}

/// A closing fence uses the opening character, is at least as long and carries no info string
fn closes_fence(line: &str, open: (char, usize)) -> bool {
    match fence_marker(line) {
        Some((marker, run)) if marker == open.0 && run >= open.1 => {
            line.trim_start()[run * marker.len_utf8()..].trim().is_empty()
        }
        _ => false,
    }
}

fn is_continuation(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

pub struct FootnoteExtension {
    state: ComponentState,
    definitions: HashMap<String, String>,
    references: ReferenceList,
    missing: Vec<String>,
}

impl Default for FootnoteExtension {
    fn default() -> Self {
        FootnoteExtension {
            state: ComponentState::new(NAME).with_option(
                "missing_text",
                DEFAULT_MISSING_TEXT,
                MetaField::text("Text for undefined footnotes"),
            ),
            definitions: HashMap::new(),
            references: ReferenceList::new(),
            missing: Vec::new(),
        }
    }
}

impl FootnoteExtension {
    pub fn definition(&self, id: &str) -> Option<&str> {
        self.definitions.get(id).map(String::as_str)
    }

    pub fn references(&self) -> &ReferenceList {
        &self.references
    }

    fn render_definition(source: &str) -> String {
        let html = markdown_to_html(source, &base_options());
        let html = html.trim();
        match html
            .strip_prefix("<p>")
            .and_then(|inner| inner.strip_suffix("</p>"))
        {
            Some(inner) if !inner.contains("<p>") => inner.to_string(),
            _ => html.to_string(),
        }
    }
}

impl Extension for FootnoteExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn prepare(&mut self, _settings: &Settings) {
        self.definitions.clear();
        self.references.clear();
        self.missing.clear();
    }

    fn preprocess(&mut self, markdown: &str) -> String {
        let mut kept = Vec::new();
        let mut fence: Option<(char, usize)> = None;
        let mut current: Option<(String, String)> = None;

        for line in markdown.lines() {
            if let Some((id, text)) = current.as_mut() {
                if is_continuation(line) {
                    text.push('\n');
                    text.push_str(line.trim_start());
                    continue;
                }
                let (id, text) = (std::mem::take(id), std::mem::take(text));
                self.definitions.entry(id).or_insert(text);
                current = None;
            }
            fence = match fence {
                Some(open) if closes_fence(line, open) => None,
                Some(open) => Some(open),
                None => fence_marker(line),
            };
            if fence.is_none() && fence_marker(line).is_none() {
                if let Some(captures) = DEFINITION.captures(line) {
                    current = Some((captures[1].to_string(), captures[2].trim().to_string()));
                    continue;
                }
            }
            kept.push(line);
        }
        if let Some((id, text)) = current {
            self.definitions.entry(id).or_insert(text);
        }

        let mut output = kept.join("\n");
        if markdown.ends_with('\n') {
            output.push('\n');
        }
        output
    }

    fn inline_pattern(&self) -> Option<Regex> {
        Some(REFERENCE.clone())
    }

    fn render_inline(&mut self, captures: &Captures, ctx: &mut RenderContext) -> Result<Option<String>> {
        let id = captures[1].to_string();
        let position = ctx.next_position();
        self.references.push(ReferenceEntry {
            key: id.clone(),
            label: id.clone(),
            target: format!("#fn-{id}"),
            position,
        });
        Ok(Some(placeholder(position)))
    }

    fn postprocess(&mut self, html: &str, _settings: &Settings) -> Result<String> {
        if self.references.is_empty() {
            return Ok(html.to_string());
        }

        let mut output = html.to_string();
        for (number, entry) in self.references.occurrences() {
            output = output.replacen(
                &placeholder(entry.position),
                &format!(
                    r#"<sup class="footnote-ref" data-ref="note:{}">[{number}]</sup>"#,
                    entry.position
                ),
                1,
            );
        }

        output.push_str(r#"<section class="footnotes" data-kind="notes"><ol>"#);
        for numbered in self.references.numbered() {
            let id = &numbered.entry.key;
            let body = match self.definitions.get(id) {
                Some(source) => Self::render_definition(source),
                None => {
                    self.missing.push(id.clone());
                    missing_marker(id)
                }
            };
            output.push_str(&format!(r#"<li id="fn-{}">{body}</li>"#, numbered.number));
        }
        output.push_str("</ol></section>\n");
        Ok(output)
    }

    fn before_publish(&mut self, html: &str) -> Result<String> {
        if self.missing.is_empty() {
            return Ok(html.to_string());
        }
        let text = self.state.text_value("missing_text", DEFAULT_MISSING_TEXT);
        let mut output = html.to_string();
        for id in &self.missing {
            warn!(id = id.as_str(), "footnote referenced but never defined");
            let marker = missing_marker(id);
            let filled = marker.replacen("></span>", &format!(">{}</span>", html_escape(&text)), 1);
            output = output.replace(&marker, &filled);
        }
        Ok(output)
    }
}
