//! `$inline$` and `$$display$$` math
//!
//! LaTeX is rendered to MathML with pulldown-latex. AsciiMath has no in-process renderer, so it
//! is emitted as a pending placeholder with a stable id; the host renders it later and patches
//! the result in with `update_element_by_id`.

use crate::component::ComponentState;
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{Extension, RenderContext, Rendered};
use crate::settings::{MathDialect, Settings};
use comrak::nodes::{AstNode, NodeValue};
use comrak::ComrakOptions;
use pulldown_latex::{config::DisplayMode, config::RenderConfig, mathml::push_mathml, Parser, Storage};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

pub const NAME: &str = "math";

/// Math waiting for an asynchronous renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMath {
    pub id: String,
    pub source: String,
    pub display: bool,
}

pub struct MathExtension {
    state: ComponentState,
    dialect: MathDialect,
    cache: HashMap<u64, String>,
    pending: Vec<PendingMath>,
}

impl Default for MathExtension {
    fn default() -> Self {
        MathExtension {
            state: ComponentState::new(NAME),
            dialect: MathDialect::Latex,
            cache: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

fn content_hash(source: &str, display: bool) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    display.hash(&mut hasher);
    hasher.finish()
}

fn mode_class(display: bool) -> &'static str {
    if display {
        "math-display"
    } else {
        "math-inline"
    }
}

/// Render LaTeX to MathML, or an error span carrying the source
pub fn render_latex(latex: &str, display: bool) -> String {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(|err| err.to_string()))
        .collect();

    let mut mathml = String::new();
    let failure = if errors.is_empty() {
        push_mathml(&mut mathml, events.into_iter(), config)
            .err()
            .map(|err| err.to_string())
    } else {
        Some(errors.join("; "))
    };

    match failure {
        None => format!(r#"<span class="math {}">{mathml}</span>"#, mode_class(display)),
        Some(message) => {
            warn!(%message, "latex rendering failed");
            format!(
                r#"<span class="math math-error {}" title="{}"><code>{}</code></span>"#,
                mode_class(display),
                html_escape(&message),
                html_escape(latex)
            )
        }
    }
}

impl MathExtension {
    /// AsciiMath placeholders produced by the last parse
    pub fn pending(&self) -> &[PendingMath] {
        &self.pending
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn render(&mut self, source: &str, display: bool) -> String {
        match self.dialect {
            MathDialect::Latex => {
                let key = content_hash(source, display);
                self.cache
                    .entry(key)
                    .or_insert_with(|| render_latex(source, display))
                    .clone()
            }
            MathDialect::Asciimath => {
                let id = format!("math-{}", self.pending.len());
                self.pending.push(PendingMath {
                    id: id.clone(),
                    source: source.to_string(),
                    display,
                });
                format!(
                    r#"<span class="math math-pending {}" id="{id}" data-math="{1}">{1}</span>"#,
                    mode_class(display),
                    html_escape(source)
                )
            }
        }
    }
}

impl Extension for MathExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn configure(&self, options: &mut ComrakOptions<'static>) -> Result<()> {
        options.extension.math_dollars = true;
        Ok(())
    }

    fn prepare(&mut self, settings: &Settings) {
        if settings.math != self.dialect {
            debug!(from = ?self.dialect, to = ?settings.math, "math dialect changed, clearing cache");
            self.cache.clear();
            self.dialect = settings.math;
        }
        self.pending.clear();
    }

    fn render_node<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        let (source, display) = match &node.data.borrow().value {
            NodeValue::Math(math) => (math.literal.clone(), math.display_math),
            _ => return Ok(Rendered::Skipped),
        };
        let html = self.render(source.trim(), display);
        let replacement = ctx.raw_inline(html);
        ctx.replace(node, replacement);
        Ok(Rendered::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::cards::CardDataManager;
    use crate::markdown::{MarkdownParser, RenderSession};

    fn render(parser: &mut MarkdownParser, markdown: &str, settings: &Settings) -> String {
        let mut cards = CardDataManager::new();
        let assets = BuiltinAssets;
        let mut session = RenderSession::new(settings, &mut cards, &assets);
        parser.parse(markdown, &mut session).unwrap()
    }

    fn parser() -> MarkdownParser {
        let mut parser = MarkdownParser::new();
        parser.register(Box::new(MathExtension::default())).unwrap();
        parser
    }

    #[test]
    fn latex_renders_to_mathml() {
        let html = render(&mut parser(), "inline $x^2$ here", &Settings::default());
        assert!(html.contains(r#"<span class="math math-inline"><math"#));
        assert!(html.contains("</math></span>"));
    }

    #[test]
    fn invalid_latex_keeps_source() {
        let html = render_latex(r"\frac{a", false);
        assert!(html.contains("math-error"));
        assert!(html.contains(r"\frac{a"));
    }

    #[test]
    fn asciimath_emits_pending_placeholders() {
        let settings = Settings {
            math: MathDialect::Asciimath,
            ..Default::default()
        };
        let mut parser = parser();
        let html = render(&mut parser, "a $x/y$ b $z$", &settings);
        assert!(html.contains(r#"id="math-0""#));
        assert!(html.contains(r#"id="math-1""#));
        assert!(html.contains("math-pending"));
    }

    #[test]
    fn dialect_change_clears_cache() {
        let mut ext = MathExtension::default();
        ext.prepare(&Settings::default());
        ext.render("x", false);
        assert_eq!(ext.cache_len(), 1);
        ext.prepare(&Settings {
            math: MathDialect::Asciimath,
            ..Default::default()
        });
        assert_eq!(ext.cache_len(), 0);
    }
}
