//! Code block formatting for editors that collapse whitespace

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom;
use crate::error::Result;
use crate::settings::Settings;
use markup5ever_rcdom::Handle;

pub const NAME: &str = "code-blocks";

const FORMATTED: &str = "code-formatted";
const NBSP: char = '\u{a0}';

pub struct CodeBlocksPlugin {
    state: ComponentState,
}

impl Default for CodeBlocksPlugin {
    fn default() -> Self {
        CodeBlocksPlugin {
            state: ComponentState::new(NAME).with_option(
                "tab_size",
                4.0,
                MetaField::number("Spaces per tab"),
            ),
        }
    }
}

/// Rewrite text below `node` so spacing and line breaks survive pasting
fn preserve_whitespace(node: &Handle, tab: &str) -> Result<()> {
    for child in dom::children(node) {
        let Some(text) = dom::text_of(&child) else {
            if dom::is_element(&child) {
                preserve_whitespace(&child, tab)?;
            }
            continue;
        };
        let text = text.replace('\t', tab).replace(' ', &NBSP.to_string());
        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                dom::insert_before(&child, &dom::create_text(line))?;
            }
            if lines.peek().is_some() {
                dom::insert_before(&child, &dom::create_element("br", vec![]))?;
            }
        }
        dom::detach(&child);
    }
    Ok(())
}

fn line_count(pre: &Handle) -> usize {
    let text = dom::text_content(pre);
    let breaks = dom::elements_by_tag(pre, &["br"]).len();
    let text = text.trim_end_matches('\n');
    if text.is_empty() && breaks == 0 {
        return 0;
    }
    text.matches('\n').count() + breaks + 1
}

fn add_line_numbers(pre: &Handle) -> Result<()> {
    let count = line_count(pre);
    if count == 0 {
        return Ok(());
    }
    let gutter = dom::create_element("section", vec![("class", "code-line-numbers")]);
    for number in 1..=count {
        if number > 1 {
            dom::append_child(&gutter, &dom::create_element("br", vec![]));
        }
        dom::append_child(&gutter, &dom::create_text(&number.to_string()));
    }
    dom::prepend_child(pre, &gutter);
    dom::append_style(pre, "display: flex;");
    Ok(())
}

impl ProcessPlugin for CodeBlocksPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Keeps indentation and line breaks in code blocks, adds line numbers"
    }

    fn transform(&self, html: &str, settings: &Settings) -> Result<String> {
        let tab_size = self.state.number_value("tab_size", 4.0).clamp(0.0, 16.0) as usize;
        let tab = NBSP.to_string().repeat(tab_size);
        rewrite_fragment(html, |root| {
            for pre in dom::elements_by_tag(root, &["pre"]) {
                if dom::has_class(&pre, FORMATTED) {
                    continue;
                }
                // Trailing newline from the renderer would add an empty last line.
                let tail = dom::element_children(&pre)
                    .last()
                    .and_then(|code| dom::children(code).pop());
                if let Some(tail) = tail {
                    if let Some(trimmed) = dom::text_of(&tail)
                        .and_then(|text| text.strip_suffix('\n').map(str::to_string))
                    {
                        dom::set_text(&tail, &trimmed);
                    }
                }
                if settings.line_number {
                    add_line_numbers(&pre)?;
                }
                if settings.enable_weixin_code_format {
                    for child in dom::element_children(&pre) {
                        if !dom::has_class(&child, "code-line-numbers") {
                            preserve_whitespace(&child, &tab)?;
                        }
                    }
                }
                dom::add_class(&pre, FORMATTED);
            }
            Ok(())
        })
    }
}
