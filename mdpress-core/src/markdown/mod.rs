//! Markdown rendering (Markdown → semantic HTML)
//!
//! Pipeline: Markdown string → extension preprocessors → Comrak AST → extension render hooks
//! → Comrak HTML → extension postprocessors → before-publish fixups.
//!
//! The renderer options are assembled once from the enabled extensions and cached until the
//! extension set or an extension's state changes.

pub mod extension;
pub mod extensions;
pub mod references;

pub use extension::{Extension, RenderContext, RenderSession, Rendered};
pub use references::{NumberedReference, ReferenceEntry, ReferenceList};

use crate::error::{render_error_html, PressError, Result};
use crate::settings::Settings;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{format_html, parse_document, Arena, ComrakOptions};
use regex::Regex;
use tracing::{debug, error, warn};

/// Comrak options shared by every parse before extensions add their grammar
pub fn base_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true;
    options
}

/// Ordered set of extensions driving one Markdown renderer
#[derive(Default)]
pub struct MarkdownParser {
    extensions: Vec<Box<dyn Extension>>,
    options: Option<ComrakOptions<'static>>,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with every built-in extension registered in the default order
    pub fn with_defaults() -> Self {
        let mut parser = Self::new();
        for extension in extensions::default_extensions() {
            // Built-in names are distinct.
            let _ = parser.register(extension);
        }
        parser
    }

    /// Append an extension; names must be unique
    pub fn register(&mut self, extension: Box<dyn Extension>) -> Result<()> {
        if self.extension(extension.name()).is_some() {
            return Err(PressError::DuplicateName {
                kind: "extension",
                name: extension.name().to_string(),
            });
        }
        debug!(name = extension.name(), "registered extension");
        self.extensions.push(extension);
        self.options = None;
        Ok(())
    }

    pub fn extension(&self, name: &str) -> Option<&dyn Extension> {
        self.extensions
            .iter()
            .find(|ext| ext.name() == name)
            .map(|ext| ext.as_ref())
    }

    /// Mutable access; invalidates the cached renderer options
    pub fn extension_mut(&mut self, name: &str) -> Option<&mut Box<dyn Extension>> {
        self.options = None;
        self.extensions.iter_mut().find(|ext| ext.name() == name)
    }

    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &dyn Extension> {
        self.extensions.iter().map(|ext| ext.as_ref())
    }

    pub fn set_extension_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let extension = self.extension_mut(name).ok_or_else(|| PressError::NotFound {
            kind: "extension",
            name: name.to_string(),
        })?;
        extension.state_mut().set_enabled(enabled);
        Ok(())
    }

    /// Apply each extension's persisted config slice
    pub fn load_settings(&mut self, settings: &Settings) {
        for extension in &mut self.extensions {
            extension.state_mut().load_from(settings);
        }
        self.options = None;
    }

    pub fn save_settings(&self, settings: &mut Settings) {
        for extension in &self.extensions {
            extension.state().save_into(settings);
        }
    }

    fn build_options(&self) -> Result<ComrakOptions<'static>> {
        let mut options = base_options();
        for extension in self.extensions.iter().filter(|ext| ext.is_enabled()) {
            extension.configure(&mut options)?;
        }
        Ok(options)
    }

    /// Render Markdown to HTML
    ///
    /// A renderer that cannot be built yields an error fragment instead of an `Err`. Failures
    /// in postprocessing are logged and returned.
    pub fn parse(&mut self, markdown: &str, session: &mut RenderSession<'_>) -> Result<String> {
        let options = match &self.options {
            Some(options) => options.clone(),
            None => match self.build_options() {
                Ok(options) => {
                    self.options = Some(options.clone());
                    options
                }
                Err(err) => {
                    error!(%err, "failed to build markdown renderer");
                    return Ok(render_error_html(&PressError::ParserInit(err.to_string())));
                }
            },
        };

        let settings = session.settings;
        for extension in self.enabled_mut() {
            extension.prepare(settings);
        }

        let mut source = markdown.to_string();
        for extension in self.enabled_mut() {
            source = extension.preprocess(&source);
        }

        let arena = Arena::new();
        let root = parse_document(&arena, &source, &options);
        merge_adjacent_text(root);
        {
            let mut ctx = RenderContext::new(&arena, session);
            self.render_tree(root, &mut ctx);
        }

        let mut output = Vec::new();
        format_html(root, &options, &mut output)
            .map_err(|e| PressError::Serialization(format!("HTML rendering failed: {e}")))?;
        let mut html = String::from_utf8(output)
            .map_err(|e| PressError::Serialization(format!("UTF-8 conversion failed: {e}")))?;

        for extension in self.enabled_mut() {
            html = extension.postprocess(&html, settings).map_err(|err| {
                error!(extension = extension.name(), %err, "postprocess failed");
                err
            })?;
        }
        for extension in self.enabled_mut() {
            html = extension.before_publish(&html).map_err(|err| {
                error!(extension = extension.name(), %err, "before-publish failed");
                err
            })?;
        }
        Ok(html)
    }

    fn enabled_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Extension>> {
        self.extensions.iter_mut().filter(|ext| ext.is_enabled())
    }

    fn render_tree<'a>(&mut self, root: &'a AstNode<'a>, ctx: &mut RenderContext<'a, '_>) {
        let patterns: Vec<(usize, Regex)> = self
            .extensions
            .iter()
            .enumerate()
            .filter(|(_, ext)| ext.is_enabled())
            .filter_map(|(index, ext)| ext.inline_pattern().map(|re| (index, re)))
            .collect();

        let nodes: Vec<&'a AstNode<'a>> = root.descendants().skip(1).collect();
        for node in nodes {
            if !is_attached(node, root) {
                continue;
            }
            if matches!(node.data.borrow().value, NodeValue::Text(_)) {
                if !patterns.is_empty() {
                    self.lex_text(node, &patterns, ctx);
                }
                continue;
            }

            let mut handled = false;
            for extension in self.extensions.iter_mut().filter(|ext| ext.is_enabled()) {
                match extension.render_node(node, ctx) {
                    Ok(Rendered::Handled) => {
                        handled = true;
                        break;
                    }
                    Ok(Rendered::Skipped) => {}
                    Err(err) => {
                        warn!(extension = extension.name(), %err, "render hook failed, using default rendering");
                    }
                }
            }
            if !handled {
                render_builtin(node, ctx);
            }
        }
    }

    /// Split a text node around inline extension matches
    fn lex_text<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        patterns: &[(usize, Regex)],
        ctx: &mut RenderContext<'a, '_>,
    ) {
        let text = match &node.data.borrow().value {
            NodeValue::Text(text) => text.clone(),
            _ => return,
        };

        let mut pieces: Vec<&'a AstNode<'a>> = Vec::new();
        let mut pending = String::new();
        let mut cursor = 0;
        let mut changed = false;

        while cursor < text.len() {
            let mut best: Option<(usize, regex::Captures)> = None;
            for (index, re) in patterns {
                if let Some(captures) = re.captures_at(&text, cursor) {
                    let start = captures.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
                    let earlier = best
                        .as_ref()
                        .and_then(|(_, current)| current.get(0))
                        .map_or(true, |current| start < current.start());
                    if earlier {
                        best = Some((*index, captures));
                    }
                }
            }
            let Some((index, captures)) = best else {
                break;
            };
            let Some(whole) = captures.get(0) else {
                break;
            };
            let (start, end) = (whole.start(), whole.end());

            let extension = &mut self.extensions[index];
            let rendered = match extension.render_inline(&captures, ctx) {
                Ok(rendered) => rendered,
                Err(err) => {
                    warn!(extension = extension.name(), %err, "inline render failed, keeping text");
                    None
                }
            };
            match rendered {
                Some(html) if end > start => {
                    pending.push_str(&text[cursor..start]);
                    if !pending.is_empty() {
                        pieces.push(ctx.alloc(NodeValue::Text(std::mem::take(&mut pending))));
                    }
                    pieces.push(ctx.raw_inline(html));
                    cursor = end;
                    changed = true;
                }
                _ => {
                    // Keep one character as text and retry after it.
                    let step = text[start..].chars().next().map_or(1, char::len_utf8);
                    pending.push_str(&text[cursor..start + step]);
                    cursor = start + step;
                }
            }
        }

        if !changed {
            return;
        }
        pending.push_str(&text[cursor..]);
        if !pending.is_empty() {
            pieces.push(ctx.alloc(NodeValue::Text(pending)));
        }
        for piece in pieces {
            node.insert_before(piece);
        }
        node.detach();
    }
}

fn is_attached<'a>(node: &'a AstNode<'a>, root: &'a AstNode<'a>) -> bool {
    node.ancestors()
        .last()
        .map_or(false, |top| std::ptr::eq(top, root))
}

/// Join runs of sibling text nodes so inline patterns see whole words
fn merge_adjacent_text<'a>(root: &'a AstNode<'a>) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
        if !matches!(node.data.borrow().value, NodeValue::Text(_)) || node.parent().is_none() {
            continue;
        }
        while let Some(next) = node.next_sibling() {
            let addition = match &next.data.borrow().value {
                NodeValue::Text(text) => text.clone(),
                _ => break,
            };
            if let NodeValue::Text(text) = &mut node.data.borrow_mut().value {
                text.push_str(&addition);
            }
            next.detach();
        }
    }
}

/// Headings get stable decoration slots; thematic breaks get a normalized rule
fn render_builtin<'a>(node: &'a AstNode<'a>, ctx: &mut RenderContext<'a, '_>) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Heading(_) => {
            node.prepend(ctx.raw_inline(r#"<span class="prefix"></span><span class="content">"#));
            node.append(ctx.raw_inline(r#"</span><span class="suffix"></span>"#));
        }
        NodeValue::ThematicBreak => {
            let rule = ctx.raw_block(r#"<hr class="divider">"#);
            ctx.replace(node, rule);
        }
        _ => {}
    }
}
