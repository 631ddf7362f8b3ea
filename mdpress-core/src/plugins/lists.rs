//! List flattening
//!
//! Some editors refuse lists nested inside `<li>`. Every top-level list is rebuilt so that a
//! nested list becomes a sibling of the item it used to live in, one padding level deeper:
//!
//! ```text
//! <ul><li>a<ul><li>b</li></ul></li></ul>
//!   ->
//! <ul class="list-paddingleft-1"><li><section>a</section></li><ul class="list-paddingleft-2">…</ul></ul>
//! ```
//!
//! Item content is wrapped in a `<section>` so the marker can carry the accent color while
//! the text keeps the body color.

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom;
use crate::error::Result;
use crate::settings::{Settings, DEFAULT_TEXT_COLOR};
use markup5ever_rcdom::Handle;

pub const NAME: &str = "lists";

const LISTS: &[&str] = &["ul", "ol"];

/// Colors applied to rebuilt items
#[derive(Debug, Clone, Copy)]
pub struct ListColors<'a> {
    pub marker: &'a str,
    pub text: &'a str,
}

pub struct ListsPlugin {
    state: ComponentState,
}

impl Default for ListsPlugin {
    fn default() -> Self {
        ListsPlugin {
            state: ComponentState::new(NAME).with_option(
                "text_color",
                DEFAULT_TEXT_COLOR,
                MetaField::text("List text color"),
            ),
        }
    }
}

fn marker_style(ordered: bool, level: usize) -> &'static str {
    match (ordered, level) {
        (true, _) => "decimal",
        (false, 0) => "disc",
        (false, 1) => "circle",
        (false, _) => "square",
    }
}

/// Rebuild `list` at `level` with no list nested inside any `<li>`
pub fn transform_list(list: &Handle, level: usize, colors: ListColors<'_>) -> Result<Handle> {
    let ordered = dom::is_tag(list, &["ol"]);
    let tag = if ordered { "ol" } else { "ul" };
    let class = format!("list-paddingleft-{}", level + 1);
    let style = format!("list-style-type: {};", marker_style(ordered, level));
    let flat = dom::create_element(tag, vec![("class", class.as_str()), ("style", style.as_str())]);
    if ordered {
        if let Some(start) = dom::get_attr(list, "start") {
            dom::set_attr(&flat, "start", &start);
        }
    }

    for child in dom::children(list) {
        if dom::is_tag(&child, &["li"]) {
            let mut nested = Vec::new();
            let item_style = format!("color: {};", colors.marker);
            let text_style = format!("color: {};", colors.text);
            let item = dom::create_element("li", vec![("style", item_style.as_str())]);
            let body = dom::create_element("section", vec![("style", text_style.as_str())]);
            for grandchild in dom::children(&child) {
                if dom::is_tag(&grandchild, LISTS) {
                    dom::detach(&grandchild);
                    nested.push(grandchild);
                } else {
                    dom::append_child(&body, &grandchild);
                }
            }
            dom::append_child(&item, &body);
            dom::append_child(&flat, &item);
            for inner in nested {
                let inner = transform_list(&inner, level + 1, colors)?;
                dom::append_child(&flat, &inner);
            }
        } else if dom::is_tag(&child, LISTS) {
            // Lists that were already flattened into siblings.
            dom::detach(&child);
            let inner = transform_list(&child, level + 1, colors)?;
            dom::append_child(&flat, &inner);
        } else if dom::is_element(&child) {
            dom::append_child(&flat, &child);
        }
    }
    Ok(flat)
}

/// Lists whose parent is not a list or list item
pub fn top_level_lists(root: &Handle) -> Vec<Handle> {
    dom::elements_by_tag(root, LISTS)
        .into_iter()
        .filter(|list| {
            dom::parent(list)
                .map(|parent| !dom::is_tag(&parent, &["li", "ul", "ol"]))
                .unwrap_or(true)
        })
        .collect()
}

/// Flatten `lists` in place; results for lists without a parent are gathered into a loose
/// `<section>` that is returned instead
pub fn restructure_lists(lists: &[Handle], colors: ListColors<'_>) -> Result<Option<Handle>> {
    let mut loose: Option<Handle> = None;
    for list in lists {
        let flat = transform_list(list, 0, colors)?;
        if dom::parent(list).is_some() {
            dom::replace_with(list, &flat)?;
        } else {
            let container = loose.get_or_insert_with(|| dom::create_element("section", vec![]));
            dom::append_child(container, &flat);
        }
    }
    Ok(loose)
}

impl ProcessPlugin for ListsPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Moves nested lists out of their items"
    }

    fn transform(&self, html: &str, settings: &Settings) -> Result<String> {
        let text = self.state.text_value("text_color", DEFAULT_TEXT_COLOR);
        let colors = ListColors {
            marker: settings.accent_color(),
            text: &text,
        };
        rewrite_fragment(html, |root| {
            let lists = top_level_lists(root);
            restructure_lists(&lists, colors)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: ListColors<'static> = ListColors {
        marker: "#7852ee",
        text: "#222222",
    };

    #[test]
    fn nested_lists_become_siblings() {
        let html = "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>";
        let output = ListsPlugin::default()
            .transform(html, &Settings::default())
            .unwrap();
        assert_eq!(
            output,
            concat!(
                r#"<ul class="list-paddingleft-1" style="list-style-type: disc;">"#,
                r#"<li style="color: #7852ee;"><section style="color: #222222;">a</section></li>"#,
                r#"<ul class="list-paddingleft-2" style="list-style-type: circle;">"#,
                r#"<li style="color: #7852ee;"><section style="color: #222222;">b</section></li>"#,
                r#"</ul>"#,
                r#"<li style="color: #7852ee;"><section style="color: #222222;">c</section></li>"#,
                r#"</ul>"#
            )
        );
    }

    #[test]
    fn ordered_lists_keep_start_and_kind() {
        let html = r#"<ol start="3"><li>x<ul><li>y</li></ul></li></ol>"#;
        let output = ListsPlugin::default()
            .transform(html, &Settings::default())
            .unwrap();
        assert!(output.starts_with(
            r#"<ol class="list-paddingleft-1" style="list-style-type: decimal;" start="3">"#
        ));
        assert!(output.contains(r#"<ul class="list-paddingleft-2" style="list-style-type: circle;">"#));
    }

    #[test]
    fn empty_lists_stay_empty() {
        let output = ListsPlugin::default()
            .transform("<ul></ul>", &Settings::default())
            .unwrap();
        assert_eq!(
            output,
            r#"<ul class="list-paddingleft-1" style="list-style-type: disc;"></ul>"#
        );
    }

    #[test]
    fn text_color_is_configurable() {
        let mut plugin = ListsPlugin::default();
        let mut updates = crate::component::ConfigMap::new();
        updates.insert("text_color".to_string(), "#333".into());
        plugin.state_mut().update_config(&updates);
        let output = plugin.transform("<ul><li>a</li></ul>", &Settings::default()).unwrap();
        assert!(output.contains(r#"<section style="color: #333;">a</section>"#));
    }

    #[test]
    fn detached_lists_are_collected() {
        let nodes = dom::parse_nodes("<ul><li>a</li></ul><ol><li>b</li></ol>").unwrap();
        let loose = restructure_lists(&nodes, COLORS).unwrap().unwrap();
        let html = dom::inner_html(&loose).unwrap();
        assert!(html.starts_with(r#"<ul class="list-paddingleft-1""#));
        assert!(html.contains(r#"<ol class="list-paddingleft-1" style="list-style-type: decimal;">"#));
    }

    #[test]
    fn flattened_siblings_go_one_level_deeper() {
        let html = r#"<ul><li>a</li><ul><li>b</li></ul></ul>"#;
        let output = ListsPlugin::default()
            .transform(html, &Settings::default())
            .unwrap();
        assert!(output.contains(r#"<ul class="list-paddingleft-2" style="list-style-type: circle;">"#));
    }
}
