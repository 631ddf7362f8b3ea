//! Link footnotes and `[[wiki links]]`
//!
//! Depending on `link_footnote_mode`, external links are rendered as their text followed by
//! a numbered superscript, and a trailing footnote section lists their URLs. Each link token
//! is stamped with a document position while the tree is walked; numbering happens in
//! postprocess, sorted by those positions.

use crate::component::ComponentState;
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{plain_text, Extension, RenderContext, Rendered};
use crate::markdown::references::{ReferenceEntry, ReferenceList};
use crate::settings::{LinkDescriptionMode, LinkFootnoteMode, Settings};
use comrak::nodes::{AstNode, NodeValue};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

pub const NAME: &str = "link-refs";

const WEIXIN_HOST: &str = "mp.weixin.qq.com";

static WIKI_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|\n]+)(?:\|([^\]\n]*))?\]\]").unwrap());

/// Whether `href` should become a footnote under `mode`
pub fn is_footnote_target(href: &str, mode: LinkFootnoteMode) -> bool {
    if mode == LinkFootnoteMode::None {
        return false;
    }
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match mode {
        LinkFootnoteMode::All => true,
        LinkFootnoteMode::NonWx => url.host_str() != Some(WEIXIN_HOST),
        LinkFootnoteMode::None => false,
    }
}

/// One entry of a link footnote list
pub fn link_description(label: &str, url: &str, mode: LinkDescriptionMode) -> String {
    let label = label.trim();
    match mode {
        LinkDescriptionMode::Raw if !label.is_empty() && label != url => {
            format!("{}: <em>{}</em>", html_escape(label), html_escape(url))
        }
        _ => format!("<em>{}</em>", html_escape(url)),
    }
}

fn placeholder(position: usize) -> String {
    format!(r#"<sup class="footnote-ref" data-ref="link:{position}"></sup>"#)
}

pub struct LinkReferenceExtension {
    state: ComponentState,
    mode: LinkFootnoteMode,
    description: LinkDescriptionMode,
    references: ReferenceList,
}

impl Default for LinkReferenceExtension {
    fn default() -> Self {
        LinkReferenceExtension {
            state: ComponentState::new(NAME),
            mode: LinkFootnoteMode::None,
            description: LinkDescriptionMode::Empty,
            references: ReferenceList::new(),
        }
    }
}

impl LinkReferenceExtension {
    pub fn references(&self) -> &ReferenceList {
        &self.references
    }
}

impl Extension for LinkReferenceExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn prepare(&mut self, settings: &Settings) {
        self.mode = settings.link_footnote_mode;
        self.description = settings.link_description_mode;
        self.references.clear();
    }

    fn inline_pattern(&self) -> Option<Regex> {
        Some(WIKI_LINK.clone())
    }

    fn render_inline(&mut self, captures: &Captures, _ctx: &mut RenderContext) -> Result<Option<String>> {
        let target = captures[1].trim();
        let text = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|alias| !alias.is_empty())
            .unwrap_or(target);
        Ok(Some(format!(
            r#"<span class="internal-link" data-href="{}">{}</span>"#,
            html_escape(target),
            html_escape(text)
        )))
    }

    fn render_node<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        let url = match &node.data.borrow().value {
            NodeValue::Link(link) => link.url.clone(),
            _ => return Ok(Rendered::Skipped),
        };
        let position = ctx.next_position();
        if !is_footnote_target(&url, self.mode) {
            return Ok(Rendered::Skipped);
        }

        self.references.push(ReferenceEntry {
            key: url.clone(),
            label: plain_text(node),
            target: url,
            position,
        });
        let open = ctx.raw_inline(r#"<span class="footnote-link">"#);
        let close = ctx.raw_inline(format!("</span>{}", placeholder(position)));
        ctx.unwrap_between(node, open, close);
        Ok(Rendered::Handled)
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
                    r#"<sup class="footnote-ref" data-ref="link:{}">[{number}]</sup>"#,
                    entry.position
                ),
                1,
            );
        }

        output.push_str(r#"<section class="footnotes" data-kind="links"><ol>"#);
        for numbered in self.references.numbered() {
            output.push_str(&format!(
                r#"<li id="link-{}">{}</li>"#,
                numbered.number,
                link_description(&numbered.entry.label, &numbered.entry.target, self.description)
            ));
        }
        output.push_str("</ol></section>\n");
        Ok(output)
    }
}
