use crate::common::render;
use mdpress_core::component::{ConfigMap, ConfigValue};
use mdpress_core::{MarkdownParser, PressError, Settings};

#[test]
fn default_extensions_register_in_order() {
    let parser = MarkdownParser::with_defaults();
    assert_eq!(
        parser.extension_names(),
        vec!["embeds", "callouts", "math", "fenced-code", "link-refs", "footnotes", "highlight"]
    );
}

#[test]
fn duplicate_extension_names_are_rejected() {
    let mut parser = MarkdownParser::with_defaults();
    let err = parser
        .register(Box::new(
            mdpress_core::markdown::extensions::HighlightExtension::default(),
        ))
        .unwrap_err();
    assert!(matches!(err, PressError::DuplicateName { .. }));
}

#[test]
fn no_extensions_still_decorates_headings_and_rules() {
    let mut parser = MarkdownParser::new();
    let html = render(&mut parser, "# Title\n\n---\n\n==x==", &Settings::default());
    assert_eq!(
        html,
        concat!(
            "<h1><span class=\"prefix\"></span><span class=\"content\">Title</span><span class=\"suffix\"></span></h1>\n",
            "<hr class=\"divider\">\n",
            "<p>==x==</p>\n"
        )
    );
}

#[test]
fn disabling_an_extension_removes_its_syntax() {
    let mut parser = MarkdownParser::with_defaults();
    let settings = Settings::default();
    assert!(render(&mut parser, "==x==", &settings).contains("<mark>x</mark>"));

    parser.set_extension_enabled("highlight", false).unwrap();
    assert_eq!(render(&mut parser, "==x==", &settings), "<p>==x==</p>\n");
    assert!(parser.set_extension_enabled("missing", false).is_err());
}

#[test]
fn persisted_config_is_applied() {
    let mut parser = MarkdownParser::with_defaults();
    let mut settings = Settings::default();
    let mut slice = ConfigMap::new();
    slice.insert("tag".to_string(), ConfigValue::from("strong"));
    settings.plugins_config.insert("highlight".to_string(), slice);

    parser.load_settings(&settings);
    assert!(render(&mut parser, "==x==", &settings).contains("<strong>x</strong>"));
}

#[test]
fn saved_settings_cover_every_extension() {
    let parser = MarkdownParser::with_defaults();
    let mut settings = Settings::default();
    parser.save_settings(&mut settings);
    for name in parser.extension_names() {
        let slice = settings.plugins_config.get(name).expect("slice per extension");
        assert_eq!(slice.get("enabled").and_then(ConfigValue::as_bool), Some(true));
    }
}

#[test]
fn callouts_math_and_code_render_together() {
    let mut parser = MarkdownParser::with_defaults();
    let markdown = "> [!tip] Remember\n> Use $x^2$.\n\n```rust\nfn main() {}\n```\n";
    let html = render(&mut parser, markdown, &Settings::default());
    assert!(html.contains(r#"<section class="callout callout-tip" data-callout="tip""#));
    assert!(html.contains(r#"<span class="callout-title-text">Remember</span>"#));
    assert!(html.contains(r#"<span class="math math-inline">"#));
    assert!(html.contains(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#));
}
