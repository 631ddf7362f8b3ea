//! The Extension trait and the context handed to its render hooks

use crate::assets::AssetProvider;
use crate::cards::CardDataManager;
use crate::component::ComponentState;
use crate::error::Result;
use crate::settings::Settings;
use comrak::nodes::{Ast, AstNode, LineColumn, NodeValue};
use comrak::{Arena, ComrakOptions};
use regex::{Captures, Regex};
use std::cell::RefCell;

/// Outcome of offering a node to an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    /// The extension rewrote the node; no other renderer sees it
    Handled,
    /// The node is left for the next extension or the default renderer
    Skipped,
}

/// Per-render collaborators, passed explicitly instead of living in globals
pub struct RenderSession<'s> {
    pub settings: &'s Settings,
    pub cards: &'s mut CardDataManager,
    pub assets: &'s dyn AssetProvider,
}

impl<'s> RenderSession<'s> {
    pub fn new(
        settings: &'s Settings,
        cards: &'s mut CardDataManager,
        assets: &'s dyn AssetProvider,
    ) -> Self {
        RenderSession {
            settings,
            cards,
            assets,
        }
    }
}

/// What render hooks can reach while the tree is walked
pub struct RenderContext<'a, 's> {
    pub arena: &'a Arena<AstNode<'a>>,
    pub settings: &'s Settings,
    pub cards: &'s mut CardDataManager,
    pub assets: &'s dyn AssetProvider,
    position: usize,
}

impl<'a, 's> RenderContext<'a, 's> {
    pub fn new(arena: &'a Arena<AstNode<'a>>, session: &'s mut RenderSession<'_>) -> Self {
        RenderContext {
            arena,
            settings: session.settings,
            cards: &mut *session.cards,
            assets: session.assets,
            position: 0,
        }
    }

    /// Stamp for link and footnote tokens; strictly increasing within one parse
    pub fn next_position(&mut self) -> usize {
        self.position += 1;
        self.position
    }

    pub fn alloc(&self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena.alloc(AstNode::new(RefCell::new(Ast::new(
            value,
            LineColumn { line: 0, column: 0 },
        ))))
    }

    /// A node that renders `html` verbatim
    pub fn raw_inline(&self, html: impl Into<String>) -> &'a AstNode<'a> {
        self.alloc(NodeValue::HtmlInline(html.into()))
    }

    /// Raw HTML standing in for a block; always ends the line
    pub fn raw_block(&self, html: impl Into<String>) -> &'a AstNode<'a> {
        let mut html = html.into();
        if !html.ends_with('\n') {
            html.push('\n');
        }
        self.alloc(NodeValue::HtmlInline(html))
    }

    /// Swap `node` for `replacement` in the tree
    pub fn replace(&self, node: &'a AstNode<'a>, replacement: &'a AstNode<'a>) {
        node.insert_before(replacement);
        node.detach();
    }

    /// Replace `node` by its own children surrounded by two raw fragments
    pub fn unwrap_between(&self, node: &'a AstNode<'a>, open: &'a AstNode<'a>, close: &'a AstNode<'a>) {
        node.insert_before(open);
        let children: Vec<_> = node.children().collect();
        for child in children {
            node.insert_before(child);
        }
        node.insert_before(close);
        node.detach();
    }
}

/// Plain text of an inline subtree
pub fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

/// A Markdown grammar and rendering contributor
///
/// Hooks run in this order for every parse: `configure` (once, when the renderer is built),
/// `prepare`, `preprocess`, the render hooks while the tree is walked, `postprocess`, then
/// `before_publish`. Only enabled extensions take part.
pub trait Extension {
    fn state(&self) -> &ComponentState;
    fn state_mut(&mut self) -> &mut ComponentState;

    fn name(&self) -> &str {
        self.state().name()
    }

    fn is_enabled(&self) -> bool {
        self.state().is_enabled()
    }

    /// Turn on the comrak grammar this extension needs
    fn configure(&self, _options: &mut ComrakOptions<'static>) -> Result<()> {
        Ok(())
    }

    /// Reset per-document state
    fn prepare(&mut self, _settings: &Settings) {}

    /// Rewrite the Markdown source before it is parsed
    fn preprocess(&mut self, markdown: &str) -> String {
        markdown.to_string()
    }

    /// Inline syntax recognised inside text runs
    fn inline_pattern(&self) -> Option<Regex> {
        None
    }

    /// Render one match of [`Extension::inline_pattern`]; `None` keeps the text
    fn render_inline(&mut self, _captures: &Captures, _ctx: &mut RenderContext) -> Result<Option<String>> {
        Ok(None)
    }

    fn render_node<'a>(
        &mut self,
        _node: &'a AstNode<'a>,
        _ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        Ok(Rendered::Skipped)
    }

    fn postprocess(&mut self, html: &str, _settings: &Settings) -> Result<String> {
        Ok(html.to_string())
    }

    fn before_publish(&mut self, html: &str) -> Result<String> {
        Ok(html.to_string())
    }
}
