use crate::common::{nested_list, nested_list_items};
use mdpress_core::{PluginManager, Settings};
use proptest::prelude::*;

fn flatten(html: &str) -> String {
    let plugins = PluginManager::with_defaults();
    let report = plugins.process_chain(&["lists"], html, &Settings::default());
    assert!(report.is_clean());
    report.html
}

#[test]
fn fixtures_of_every_depth_are_flattened() {
    for depth in 1..=5 {
        for ordered_first in [false, true] {
            let html = nested_list(depth, ordered_first);
            assert_eq!(nested_list_items(&html), depth - 1);
            let output = flatten(&html);
            assert_eq!(nested_list_items(&output), 0, "depth {depth}: {output}");
            assert!(output.contains(&format!("list-paddingleft-{depth}")));
            assert!(!output.contains(&format!("list-paddingleft-{}", depth + 1)));
        }
    }
}

#[test]
fn items_keep_their_text_in_order() {
    let output = flatten("<ol><li>one<ul><li>two</li></ul></li><li>three</li></ol>");
    let one = output.find("one").unwrap();
    let two = output.find("two").unwrap();
    let three = output.find("three").unwrap();
    assert!(one < two && two < three);
}

#[test]
fn lists_outside_list_items_stay_in_place() {
    let output = flatten("<blockquote><ul><li>a</li></ul></blockquote><p>after</p>");
    assert!(output.starts_with(r#"<blockquote><ul class="list-paddingleft-1""#));
    assert!(output.ends_with("</ul></blockquote><p>after</p>"));
}

fn list_strategy() -> impl Strategy<Value = String> {
    let leaf = Just(String::from("leaf"));
    leaf.prop_recursive(4, 64, 3, |inner| {
        (
            any::<bool>(),
            prop::collection::vec(("[a-z]{1,6}", prop::option::of(inner)), 0..4),
        )
            .prop_map(|(ordered, items)| {
                let tag = if ordered { "ol" } else { "ul" };
                let body: String = items
                    .into_iter()
                    .map(|(text, nested)| {
                        let nested = nested
                            .filter(|html| html.starts_with('<'))
                            .unwrap_or_default();
                        format!("<li>{text}{nested}</li>")
                    })
                    .collect();
                format!("<{tag}>{body}</{tag}>")
            })
    })
}

proptest! {
    #[test]
    fn flattened_lists_never_nest_inside_items(html in list_strategy()) {
        let output = flatten(&html);
        prop_assert_eq!(nested_list_items(&output), 0);
    }
}
