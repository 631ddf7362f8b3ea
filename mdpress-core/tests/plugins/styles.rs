use mdpress_core::dom::{self, Fragment};
use mdpress_core::{PluginManager, Settings};

fn inline(html: &str) -> String {
    let plugins = PluginManager::with_defaults();
    plugins
        .process_chain(&["styles"], html, &Settings::default())
        .html
}

fn emitted_font_size(html: &str, id: &str) -> String {
    let fragment = Fragment::parse(html).unwrap();
    let node = dom::find_by_id(fragment.root(), id).unwrap();
    let style = dom::get_attr(&node, "style").unwrap();
    style
        .rsplit("font-size:")
        .next()
        .and_then(|rest| rest.split(';').next())
        .map(|value| value.trim().to_string())
        .unwrap()
}

#[test]
fn font_sizes_clamp_at_both_ends() {
    let html = concat!(
        "<style>.big { font-size: 41px; } .max { font-size: 40px; } ",
        ".small { font-size: 11px; } .min { font-size: 12px; } sup { font-size: 8px; }</style>",
        r#"<p id="big" class="big">a</p><p id="max" class="max">b</p>"#,
        r#"<p id="small" class="small">c</p><p id="min" class="min">d</p>"#,
        r#"<p id="text" class="small">x<sup id="note">1</sup><sub id="low" style="font-size: 8px">2</sub></p>"#
    );
    let output = inline(html);
    assert_eq!(emitted_font_size(&output, "big"), "40px");
    assert_eq!(emitted_font_size(&output, "max"), "40px");
    assert_eq!(emitted_font_size(&output, "small"), "12px");
    assert_eq!(emitted_font_size(&output, "min"), "12px");
    assert_eq!(emitted_font_size(&output, "note"), "8px");
    assert_eq!(emitted_font_size(&output, "low"), "8px");
    assert!(!output.contains("<style>"));
}

#[test]
fn font_family_is_always_the_safe_stack() {
    let output = inline(r#"<style>p { font-family: "Comic Sans MS"; }</style><p>x</p>"#);
    assert!(!output.contains("Comic Sans"));
    assert!(output.contains("font-family: -apple-system, BlinkMacSystemFont"));
}
