use crate::common::render;
use mdpress_core::component::ComponentState;
use mdpress_core::markdown::extension::plain_text;
use mdpress_core::markdown::{
    Extension, MarkdownParser, ReferenceEntry, ReferenceList, RenderContext, Rendered,
};
use mdpress_core::{LinkFootnoteMode, Result, Settings};
use comrak::nodes::{AstNode, NodeValue};

/// Collects links like the link footnote extension, but hands them to the reference list
/// last-token-first, the way a renderer that defers work might.
struct DeferredLinks {
    state: ComponentState,
    pending: Vec<ReferenceEntry>,
}

impl DeferredLinks {
    fn new() -> Self {
        DeferredLinks {
            state: ComponentState::new("deferred-links"),
            pending: Vec::new(),
        }
    }
}

fn marker(position: usize) -> String {
    format!(r#"<sup data-pos="{position}"></sup>"#)
}

impl Extension for DeferredLinks {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn prepare(&mut self, _settings: &Settings) {
        self.pending.clear();
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
        self.pending.push(ReferenceEntry {
            key: url.clone(),
            label: plain_text(node),
            target: url,
            position,
        });
        let replacement = ctx.raw_inline(marker(position));
        ctx.replace(node, replacement);
        Ok(Rendered::Handled)
    }

    fn postprocess(&mut self, html: &str, _settings: &Settings) -> Result<String> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.rotate_right(1);
        let collected: Vec<usize> = pending.iter().map(|entry| entry.position).collect();
        assert_eq!(collected, vec![3, 1, 2]);

        let mut references = ReferenceList::new();
        for entry in pending {
            references.push(entry);
        }
        let mut output = html.to_string();
        for (number, entry) in references.occurrences() {
            output = output.replace(&marker(entry.position), &format!("<sup>[{number}]</sup>"));
        }
        output.push_str("<ol>");
        for numbered in references.numbered() {
            output.push_str(&format!("<li>{}</li>", numbered.entry.target));
        }
        output.push_str("</ol>");
        Ok(output)
    }
}

#[test]
fn numbers_follow_source_order_when_collected_out_of_order() {
    let mut parser = MarkdownParser::new();
    parser.register(Box::new(DeferredLinks::new())).unwrap();
    let html = render(
        &mut parser,
        "[one](https://one.example) [two](https://two.example) [three](https://three.example)",
        &Settings::default(),
    );
    assert_eq!(
        html,
        concat!(
            "<p><sup>[1]</sup> <sup>[2]</sup> <sup>[3]</sup></p>\n",
            "<ol><li>https://one.example</li><li>https://two.example</li><li>https://three.example</li></ol>"
        )
    );
}

#[test]
fn links_and_notes_are_numbered_independently() {
    let mut parser = MarkdownParser::with_defaults();
    let settings = Settings {
        link_footnote_mode: LinkFootnoteMode::All,
        ..Default::default()
    };
    let html = render(
        &mut parser,
        "See[^b] [site](https://a.example) and[^a] [again](https://a.example)\n\n[^a]: Alpha\n[^b]: Beta\n",
        &settings,
    );
    assert!(html.contains(r#"<span class="footnote-link">site</span><sup class="footnote-ref" data-ref="link:2">[1]</sup>"#));
    assert!(html.contains(r#"<span class="footnote-link">again</span><sup class="footnote-ref" data-ref="link:4">[1]</sup>"#));
    assert!(html.contains(r#"See<sup class="footnote-ref" data-ref="note:1">[1]</sup>"#));
    assert!(html.contains(r#"and<sup class="footnote-ref" data-ref="note:3">[2]</sup>"#));

    let links = html.find(r#"data-kind="links""#).unwrap();
    let notes = html.find(r#"data-kind="notes""#).unwrap();
    assert!(links < notes);
    assert!(html.contains(r#"<li id="link-1"><em>https://a.example</em></li></ol>"#));
    assert!(html.contains(r#"<li id="fn-1">Beta</li><li id="fn-2">Alpha</li>"#));
}

#[test]
fn numbering_restarts_for_every_parse() {
    let mut parser = MarkdownParser::with_defaults();
    let settings = Settings::default();
    let first = render(&mut parser, "a[^x]\n\n[^x]: X\n", &settings);
    let second = render(&mut parser, "b[^y]\n\n[^y]: Y\n", &settings);
    assert!(first.contains(r#"<li id="fn-1">X</li>"#));
    assert!(second.contains(r#"<li id="fn-1">Y</li>"#));
    assert!(!second.contains("X"));
}
