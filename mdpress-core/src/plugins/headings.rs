//! Heading numbering and delimiter line breaks

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom;
use crate::error::Result;
use crate::settings::Settings;
use markup5ever_rcdom::Handle;

pub const NAME: &str = "headings";

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

pub struct HeadingsPlugin {
    state: ComponentState,
}

impl Default for HeadingsPlugin {
    fn default() -> Self {
        HeadingsPlugin {
            state: ComponentState::new(NAME).with_option(
                "number_level",
                2.0,
                MetaField::number("Heading level to number"),
            ),
        }
    }
}

fn slot(heading: &Handle, class: &str) -> Option<Handle> {
    dom::element_children(heading)
        .into_iter()
        .find(|child| dom::is_tag(child, &["span"]) && dom::has_class(child, class))
}

/// Make sure the heading has prefix, content and suffix spans; returns (prefix, content)
fn ensure_slots(heading: &Handle) -> (Handle, Handle) {
    let content = match slot(heading, "content") {
        Some(content) => content,
        None => {
            let content = dom::create_element("span", vec![("class", "content")]);
            for child in dom::children(heading) {
                dom::append_child(&content, &child);
            }
            dom::append_child(heading, &content);
            content
        }
    };
    let prefix = match slot(heading, "prefix") {
        Some(prefix) => prefix,
        None => {
            let prefix = dom::create_element("span", vec![("class", "prefix")]);
            dom::prepend_child(heading, &prefix);
            prefix
        }
    };
    if slot(heading, "suffix").is_none() {
        dom::append_child(heading, &dom::create_element("span", vec![("class", "suffix")]));
    }
    (prefix, content)
}

/// Replace `|` and `｜` inside text nodes with `<br>`
fn break_on_delimiters(node: &Handle) -> Result<()> {
    for child in dom::children(node) {
        if let Some(text) = dom::text_of(&child) {
            if !text.contains(['|', '｜']) {
                continue;
            }
            let mut parts = text.split(['|', '｜']).peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    dom::insert_before(&child, &dom::create_text(part))?;
                }
                if parts.peek().is_some() {
                    dom::insert_before(&child, &dom::create_element("br", vec![]))?;
                }
            }
            dom::detach(&child);
        } else if dom::is_element(&child) {
            break_on_delimiters(&child)?;
        }
    }
    Ok(())
}

impl ProcessPlugin for HeadingsPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Numbers headings and breaks titles on delimiters"
    }

    fn transform(&self, html: &str, settings: &Settings) -> Result<String> {
        let level = self.state.number_value("number_level", 2.0).clamp(1.0, 6.0) as usize;
        let numbered_tag = format!("h{level}");
        rewrite_fragment(html, |root| {
            let mut counter = 0;
            for heading in dom::elements_by_tag(root, HEADINGS) {
                let (prefix, content) = ensure_slots(&heading);

                if settings.enable_heading_number && dom::is_tag(&heading, &[numbered_tag.as_str()]) {
                    counter += 1;
                    if dom::children(&prefix).is_empty() {
                        dom::append_child(&prefix, &dom::create_text(&format!("{counter:02}")));
                        dom::append_style(&prefix, &format!("color: {};", settings.accent_color()));
                    }
                }
                if settings.enable_heading_delimiter_break {
                    break_on_delimiters(&content)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_headings_get_slots() {
        let output = HeadingsPlugin::default()
            .transform("<h1>Title</h1>", &Settings::default())
            .unwrap();
        assert_eq!(
            output,
            r#"<h1><span class="prefix"></span><span class="content">Title</span><span class="suffix"></span></h1>"#
        );
    }

    #[test]
    fn numbers_the_configured_level() {
        let settings = Settings {
            enable_heading_number: true,
            ..Default::default()
        };
        let html = "<h2>One</h2><h3>Skip</h3><h2>Two</h2>";
        let output = HeadingsPlugin::default().transform(html, &settings).unwrap();
        assert!(output.contains(r#"<span class="prefix" style="color: #7852ee;">01</span><span class="content">One</span>"#));
        assert!(output.contains(r#"<span class="prefix" style="color: #7852ee;">02</span><span class="content">Two</span>"#));
        assert!(output.contains(r#"<h3><span class="prefix"></span>"#));
    }

    #[test]
    fn delimiters_become_line_breaks() {
        let settings = Settings {
            enable_heading_delimiter_break: true,
            ..Default::default()
        };
        let output = HeadingsPlugin::default()
            .transform("<h1>Main|Sub｜Tail</h1>", &settings)
            .unwrap();
        assert!(output.contains(r#"<span class="content">Main<br>Sub<br>Tail</span>"#));
    }
}
