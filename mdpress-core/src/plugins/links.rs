//! Anchors that survived rendering (raw HTML, disabled link extension) become footnotes here
//!
//! Numbering continues from any link footnote section the parser already produced, so a
//! document never ends up with two `[1]` markers pointing at different URLs.

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom;
use crate::error::Result;
use crate::markdown::extensions::links::{is_footnote_target, link_description};
use crate::settings::Settings;
use markup5ever_rcdom::Handle;

pub const NAME: &str = "links";

pub struct LinksPlugin {
    state: ComponentState,
}

impl Default for LinksPlugin {
    fn default() -> Self {
        LinksPlugin {
            state: ComponentState::new(NAME).with_option(
                "unwrap_anchors",
                true,
                MetaField::switch("Unwrap in-page anchors"),
            ),
        }
    }
}

fn link_section(root: &Handle) -> Option<Handle> {
    dom::elements_by_tag(root, &["section"]).into_iter().find(|section| {
        dom::has_class(section, "footnotes")
            && dom::get_attr(section, "data-kind").as_deref() == Some("links")
    })
}

/// Find or create the `<ol>` that receives link footnote entries
fn footnote_list(root: &Handle) -> Handle {
    if let Some(section) = link_section(root) {
        if let Some(list) = dom::element_children(&section)
            .into_iter()
            .find(|child| dom::is_tag(child, &["ol"]))
        {
            return list;
        }
        let list = dom::create_element("ol", vec![]);
        dom::append_child(&section, &list);
        return list;
    }

    let section = dom::create_element(
        "section",
        vec![("class", "footnotes"), ("data-kind", "links")],
    );
    let list = dom::create_element("ol", vec![]);
    dom::append_child(&section, &list);
    let container = dom::find_by_id(root, "mdpress").unwrap_or_else(|| root.clone());
    dom::append_child(&container, &section);
    list
}

/// URL and number of every entry already in the links section
///
/// Entries render the URL in their last `<em>`; the number comes from the `link-N` id.
fn listed_entries(root: &Handle) -> Vec<(String, usize)> {
    let Some(section) = link_section(root) else {
        return Vec::new();
    };
    dom::elements_by_tag(&section, &["li"])
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let url = dom::elements_by_tag(&entry, &["em"])
                .last()
                .map(dom::text_content)?;
            let number = dom::get_attr(&entry, "id")
                .and_then(|id| id.strip_prefix("link-").and_then(|n| n.parse().ok()))
                .unwrap_or(index + 1);
            Some((url.trim().to_string(), number))
        })
        .collect()
}

impl ProcessPlugin for LinksPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Turns remaining external anchors into numbered footnotes"
    }

    fn transform(&self, html: &str, settings: &Settings) -> Result<String> {
        let unwrap_anchors = self.state.bool_value("unwrap_anchors", true);
        let mode = settings.link_footnote_mode;
        rewrite_fragment(html, |root| {
            let anchors = dom::elements_by_tag(root, &["a"]);
            let mut list: Option<Handle> = None;
            let mut seen = listed_entries(root);
            let mut next_number = seen.iter().map(|(_, number)| *number).max().unwrap_or(0);

            for (index, anchor) in anchors.iter().enumerate() {
                let href = dom::get_attr(anchor, "href").unwrap_or_default();
                if href.starts_with('#') {
                    if unwrap_anchors {
                        dom::unwrap(anchor)?;
                    }
                    continue;
                }
                if !is_footnote_target(&href, mode) {
                    continue;
                }

                let number = match seen.iter().find(|(url, _)| *url == href) {
                    Some((_, number)) => *number,
                    None => {
                        let list = list.get_or_insert_with(|| footnote_list(root));
                        next_number += 1;
                        seen.push((href.clone(), next_number));
                        let label = dom::text_content(anchor);
                        let entry_html = link_description(&label, &href, settings.link_description_mode);
                        let entry_id = format!("link-{next_number}");
                        let entry = dom::create_element("li", vec![("id", entry_id.as_str())]);
                        dom::set_inner_html(&entry, &entry_html)?;
                        dom::append_child(list, &entry);
                        next_number
                    }
                };

                let wrapper = dom::create_element("span", vec![("class", "footnote-link")]);
                for child in dom::children(anchor) {
                    dom::append_child(&wrapper, &child);
                }
                let data_ref = format!("link:a{}", index + 1);
                let marker = dom::create_element(
                    "sup",
                    vec![("class", "footnote-ref"), ("data-ref", data_ref.as_str())],
                );
                dom::append_child(&marker, &dom::create_text(&format!("[{number}]")));
                dom::insert_before(anchor, &wrapper)?;
                dom::insert_before(anchor, &marker)?;
                dom::detach(anchor);
            }
            Ok(())
        })
    }
}
