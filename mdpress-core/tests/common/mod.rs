//! Shared helpers for the integration tests

use mdpress_core::dom::{self, Fragment};
use mdpress_core::{BuiltinAssets, CardDataManager, MarkdownParser, RenderSession, Settings};

/// Render `markdown` with `parser` in a fresh session
pub fn render(parser: &mut MarkdownParser, markdown: &str, settings: &Settings) -> String {
    let mut cards = CardDataManager::new();
    let assets = BuiltinAssets;
    let mut session = RenderSession::new(settings, &mut cards, &assets);
    parser
        .parse(markdown, &mut session)
        .expect("markdown should render")
}

/// Number of `<li>` elements that directly contain a `<ul>` or `<ol>`
pub fn nested_list_items(html: &str) -> usize {
    let fragment = Fragment::parse(html).expect("html should parse");
    dom::elements_by_tag(fragment.root(), &["li"])
        .iter()
        .filter(|li| {
            dom::element_children(li)
                .iter()
                .any(|child| dom::is_tag(child, &["ul", "ol"]))
        })
        .count()
}

/// Build `<ul>` / `<ol>` markup nested `depth` levels deep, alternating kinds
pub fn nested_list(depth: usize, ordered_first: bool) -> String {
    fn level(remaining: usize, ordered: bool, label: &str) -> String {
        let tag = if ordered { "ol" } else { "ul" };
        let inner = if remaining > 1 {
            level(remaining - 1, !ordered, &format!("{label}.1"))
        } else {
            String::new()
        };
        format!("<{tag}><li>{label}{inner}</li><li>{label}-tail</li></{tag}>")
    }
    level(depth, ordered_first, "item")
}
