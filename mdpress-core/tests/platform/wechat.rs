use crate::common::nested_list_items;
use mdpress_core::dom::{self, Fragment};
use mdpress_core::{BuiltinAssets, AssetProvider, LinkFootnoteMode, PlatformAdapter, PluginManager, Publisher, Settings};

fn themed(body: &str) -> String {
    let css = BuiltinAssets.theme_css("default").unwrap();
    format!(r#"<section id="mdpress"><style>{css}</style>{body}</section>"#)
}

#[test]
fn styles_must_run_after_lists() {
    let plugins = PluginManager::with_defaults();
    let settings = Settings::default();
    let html = themed("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");

    let after = PlatformAdapter::wechat().adapt(&html, &settings, &plugins);
    let before = plugins
        .process_chain(
            &["images", "links", "headings", "styles", "lists", "code-blocks", "tables"],
            &html,
            &settings,
        )
        .html;

    assert_ne!(after, before);
    // Running first, the inliner styled items that lists then replaced.
    assert!(before.contains(r#"<li style="color: #7852ee;"><section style="color: #222222;">a</section></li>"#));
    assert!(after.contains(r#"<li style="color: #7852ee; font-family:"#));
    assert!(after.contains("margin: 0.2em 0;"));
    assert_eq!(nested_list_items(&after), 0);
}

#[test]
fn end_to_end_wechat_render() {
    let mut publisher = Publisher::with_defaults();
    let settings = Settings {
        link_footnote_mode: LinkFootnoteMode::All,
        ..Default::default()
    };
    let html = publisher.render(
        "# Title\n\n- a\n  - b\n- c\n\n[link](https://example.com)",
        &settings,
        "wechat",
    );

    let fragment = Fragment::parse(&html).unwrap();
    let root = fragment.root();

    let heading = dom::elements_by_tag(root, &["h1"]).pop().unwrap();
    let slots: Vec<Vec<String>> = dom::element_children(&heading)
        .iter()
        .map(dom::classes)
        .collect();
    assert_eq!(
        slots,
        vec![vec!["prefix".to_string()], vec!["content".to_string()], vec!["suffix".to_string()]]
    );
    assert_eq!(dom::text_content(&heading), "Title");

    assert_eq!(nested_list_items(&html), 0);
    let lists = dom::elements_by_tag(root, &["ul"]);
    assert_eq!(lists.len(), 2);
    assert!(dom::has_class(&lists[1], "list-paddingleft-2"));
    assert_eq!(dom::parent(&lists[1]).as_ref().map(|p| dom::has_class(p, "list-paddingleft-1")), Some(true));

    let refs: Vec<String> = dom::elements_by_tag(root, &["sup"])
        .iter()
        .filter(|sup| dom::has_class(sup, "footnote-ref"))
        .map(dom::text_content)
        .collect();
    assert_eq!(refs, vec!["[1]"]);
    let footnotes = dom::elements_by_tag(root, &["section"])
        .into_iter()
        .find(|section| dom::has_class(section, "footnotes"))
        .unwrap();
    assert!(dom::text_content(&footnotes).contains("https://example.com"));
    assert!(dom::elements_by_tag(root, &["a"]).is_empty());
    assert!(dom::elements_by_tag(root, &["style"]).is_empty());
}
