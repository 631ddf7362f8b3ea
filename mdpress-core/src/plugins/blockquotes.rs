//! Plain block quotes for platforms without custom section styling

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom;
use crate::error::Result;
use crate::settings::Settings;
use markup5ever_rcdom::Handle;

pub const NAME: &str = "blockquotes";

pub struct BlockquotesPlugin {
    state: ComponentState,
}

impl Default for BlockquotesPlugin {
    fn default() -> Self {
        BlockquotesPlugin {
            state: ComponentState::new(NAME).with_option(
                "flatten_nested",
                true,
                MetaField::switch("Flatten nested quotes"),
            ),
        }
    }
}

fn child_with_class(node: &Handle, class: &str) -> Option<Handle> {
    dom::element_children(node)
        .into_iter()
        .find(|child| dom::has_class(child, class))
}

/// `<section class="callout">` → `<blockquote>` led by a bold title paragraph
fn callout_to_blockquote(callout: &Handle) -> Result<()> {
    let quote = dom::create_element("blockquote", vec![]);
    if let Some(kind) = dom::get_attr(callout, "data-callout") {
        dom::set_attr(&quote, "data-callout", &kind);
    }

    let title = child_with_class(callout, "callout-title")
        .map(|title| {
            child_with_class(&title, "callout-title-text")
                .map(|text| dom::text_content(&text))
                .unwrap_or_else(|| dom::text_content(&title))
        })
        .unwrap_or_default();
    let title = title.trim();
    if !title.is_empty() {
        let paragraph = dom::create_element("p", vec![]);
        let strong = dom::create_element("strong", vec![]);
        dom::append_child(&strong, &dom::create_text(title));
        dom::append_child(&paragraph, &strong);
        dom::append_child(&quote, &paragraph);
    }

    if let Some(content) = child_with_class(callout, "callout-content") {
        for child in dom::children(&content) {
            dom::append_child(&quote, &child);
        }
    }
    dom::replace_with(callout, &quote)
}

impl ProcessPlugin for BlockquotesPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Turns callouts into block quotes and flattens nested quotes"
    }

    fn transform(&self, html: &str, _settings: &Settings) -> Result<String> {
        let flatten = self.state.bool_value("flatten_nested", true);
        rewrite_fragment(html, |root| {
            for section in dom::elements_by_tag(root, &["section"]) {
                if dom::has_class(&section, "callout") && dom::parent(&section).is_some() {
                    callout_to_blockquote(&section)?;
                }
            }
            if flatten {
                for quote in dom::elements_by_tag(root, &["blockquote"]) {
                    if dom::has_ancestor(&quote, &["blockquote"]) {
                        dom::unwrap(&quote)?;
                    }
                }
            }
            Ok(())
        })
    }
}
