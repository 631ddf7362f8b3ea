use mdpress_core::{LinkFootnoteMode, Publisher, Settings};

#[test]
fn markdown_and_raw_anchors_share_one_entry_per_url() {
    let settings = Settings {
        link_footnote_mode: LinkFootnoteMode::All,
        ..Default::default()
    };
    let mut publisher = Publisher::with_defaults();
    let html = publisher.render(
        r#"[a](https://a.com) and <a href="https://a.com">b</a>"#,
        &settings,
        "zhihu",
    );

    assert_eq!(html.matches("<em>https://a.com</em>").count(), 1, "{html}");
    assert!(!html.contains(r#"id="link-2""#), "{html}");
    assert_eq!(html.matches(">[1]</sup>").count(), 2, "{html}");
}
