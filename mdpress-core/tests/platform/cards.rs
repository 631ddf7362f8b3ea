use mdpress_core::{CardDataManager, Publisher, Settings};

const PAYLOAD: &str = r#"<mp-common-profile data-nickname="A & B" data-desc='<b>' $0></mp-common-profile>"#;

#[test]
fn card_payload_round_trips_through_every_platform() {
    let markdown = format!("Intro\n\n```mpcard\n{PAYLOAD}\n```\n\nOutro\n");
    let mut publisher = Publisher::with_defaults();
    for platform in ["preview", "wechat", "zhihu", "twitter"] {
        let html = publisher.render(&markdown, &Settings::default(), platform);
        assert!(html.contains(PAYLOAD), "{platform}: {html}");
        assert!(!html.contains(r#"data-id="mpcard-"#), "{platform}");
    }
}

#[test]
fn missing_placeholders_leave_html_unchanged() {
    let mut cards = CardDataManager::new();
    cards.set_card_data("mpcard-9", PAYLOAD);
    let html = r#"<section class="mp-card" data-id="mpcard-1"></section><p>x</p>"#;
    assert_eq!(cards.restore_card(html), html);
}

#[test]
fn restoration_replaces_the_whole_placeholder() {
    let mut cards = CardDataManager::new();
    cards.set_card_data("mpcard-1", "<mp-card-a></mp-card-a>");
    cards.set_card_data("mpcard-2", "<mp-card-b>$1</mp-card-b>");
    let html = concat!(
        r#"<p>a</p><section class="mp-card" data-id="mpcard-1" style="color: red;">"#,
        r#"<span>placeholder</span></section><p>b</p>"#,
        r#"<section data-id="mpcard-2" class="mp-card">x</section>"#
    );
    insta::assert_snapshot!(cards.restore_card(html), @"<p>a</p><mp-card-a></mp-card-a><p>b</p><mp-card-b>$1</mp-card-b>");
}
