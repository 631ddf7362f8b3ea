//! Style inlining
//!
//! Target editors strip `<style>` elements and class-based CSS, so the computed value of a
//! fixed set of properties is written into every element's `style` attribute. Computation
//! uses the [`Stylesheet`] cascade over the document's own `<style>` elements followed by the
//! element's inline declarations; inherited properties flow down from the parent.
//!
//! Two policies apply on output: `font-family` is always the safe stack below, and font sizes
//! are clamped into `[min_font_size, max_font_size]` (`<sup>`/`<sub>` may go below the floor).
//! This must run after every structural plugin, or it styles nodes that get replaced later.

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::css::{parse_declarations, Stylesheet};
use crate::dom;
use crate::error::Result;
use crate::settings::Settings;
use markup5ever_rcdom::Handle;
use std::collections::BTreeMap;

pub const NAME: &str = "styles";

pub const SAFE_FONT_STACK: &str = "-apple-system, BlinkMacSystemFont, 'Helvetica Neue', 'PingFang SC', 'Hiragino Sans GB', 'Microsoft YaHei UI', 'Microsoft YaHei', Arial, sans-serif";

/// Properties copied inline, in output order
const ALLOWED: &[&str] = &[
    "color",
    "background-color",
    "font-family",
    "font-size",
    "font-weight",
    "text-align",
    "line-height",
    "margin",
    "padding",
    "border",
    "border-radius",
    "position",
];

const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "text-align",
    "line-height",
];

const ROOT_FONT_SIZE: f64 = 16.0;

/// Elements that never receive styles
const SKIPPED: &[&str] = &["style", "br", "script"];

pub struct StylesPlugin {
    state: ComponentState,
}

impl Default for StylesPlugin {
    fn default() -> Self {
        StylesPlugin {
            state: ComponentState::new(NAME)
                .with_option("min_font_size", 12.0, MetaField::number("Minimum font size (px)"))
                .with_option("max_font_size", 40.0, MetaField::number("Maximum font size (px)")),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Computed {
    /// Keyed by index into `ALLOWED`
    values: BTreeMap<usize, String>,
    font_px: Option<f64>,
}

impl Computed {
    fn inherit_from(parent: &Computed) -> Self {
        let values = parent
            .values
            .iter()
            .filter(|(index, _)| INHERITED.contains(&ALLOWED[**index]))
            .map(|(index, value)| (*index, value.clone()))
            .collect();
        Computed {
            values,
            font_px: parent.font_px,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FontLimits {
    min: f64,
    max: f64,
}

/// Resolve a `font-size` value to pixels against the parent size
pub fn resolve_font_size(value: &str, parent_px: Option<f64>) -> Option<f64> {
    let base = parent_px.unwrap_or(ROOT_FONT_SIZE);
    let value = value.trim().to_ascii_lowercase();
    let number = |suffix: &str| -> Option<f64> {
        value.strip_suffix(suffix).and_then(|n| n.trim().parse::<f64>().ok())
    };
    if let Some(px) = number("px") {
        return Some(px);
    }
    if let Some(pt) = number("pt") {
        return Some(pt * 4.0 / 3.0);
    }
    if let Some(rem) = number("rem") {
        return Some(rem * ROOT_FONT_SIZE);
    }
    if let Some(em) = number("em") {
        return Some(em * base);
    }
    if let Some(percent) = number("%") {
        return Some(percent / 100.0 * base);
    }
    match value.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(base / 1.2),
        "larger" => Some(base * 1.2),
        _ => value.parse::<f64>().ok().filter(|n| *n == 0.0),
    }
}

fn format_px(px: f64) -> String {
    if (px - px.round()).abs() < 1e-6 {
        format!("{}px", px.round() as i64)
    } else {
        let formatted = format!("{px:.2}");
        format!("{}px", formatted.trim_end_matches('0').trim_end_matches('.'))
    }
}

fn compute(node: &Handle, parent: &Computed, sheet: &Stylesheet) -> Computed {
    let mut computed = Computed::inherit_from(parent);
    let inline = dom::get_attr(node, "style")
        .map(|style| parse_declarations(&style))
        .unwrap_or_default();

    for declaration in sheet.matching_declarations(node).into_iter().chain(inline) {
        let Some(index) = ALLOWED.iter().position(|p| *p == declaration.property) else {
            continue;
        };
        let value = declaration.value.trim();
        if value.eq_ignore_ascii_case("inherit") {
            match parent.values.get(&index) {
                Some(inherited) => {
                    computed.values.insert(index, inherited.clone());
                }
                None => {
                    computed.values.remove(&index);
                }
            }
            if declaration.property == "font-size" {
                computed.font_px = parent.font_px;
            }
            continue;
        }
        if declaration.property == "font-size" {
            if let Some(px) = resolve_font_size(value, parent.font_px) {
                computed.font_px = Some(px);
                computed.values.insert(index, format_px(px));
            }
            continue;
        }
        computed.values.insert(index, value.to_string());
    }
    computed
}

/// Inline declarations for one element
fn emit(tag: &str, computed: &Computed, limits: FontLimits) -> String {
    let mut out = Vec::new();
    for (index, property) in ALLOWED.iter().enumerate() {
        match *property {
            "font-family" => out.push(format!("font-family: {SAFE_FONT_STACK};")),
            "font-size" => {
                if let Some(px) = computed.font_px {
                    let mut size = px.min(limits.max);
                    if !matches!(tag, "sup" | "sub") {
                        size = size.max(limits.min);
                    }
                    out.push(format!("font-size: {};", format_px(size)));
                }
            }
            _ => {
                if let Some(value) = computed.values.get(&index) {
                    out.push(format!("{property}: {value};"));
                }
            }
        }
    }
    out.join(" ")
}

/// Author declarations the inliner does not compute, followed by the computed ones
fn merge_inline(existing: Option<&str>, computed: &str) -> String {
    let replaced: Vec<String> = parse_declarations(computed)
        .into_iter()
        .map(|declaration| declaration.property)
        .collect();
    let mut out: Vec<String> = existing
        .map(parse_declarations)
        .unwrap_or_default()
        .into_iter()
        .filter(|declaration| !replaced.contains(&declaration.property))
        .map(|declaration| format!("{}: {};", declaration.property, declaration.value))
        .collect();
    if !computed.is_empty() {
        out.push(computed.to_string());
    }
    out.join(" ")
}

fn walk(
    node: &Handle,
    parent: &Computed,
    sheet: &Stylesheet,
    limits: FontLimits,
    out: &mut Vec<(Handle, String)>,
) {
    for child in dom::element_children(node) {
        let Some(tag) = dom::tag_name(&child) else {
            continue;
        };
        if SKIPPED.contains(&tag.as_str()) {
            continue;
        }
        let computed = compute(&child, parent, sheet);
        out.push((child.clone(), emit(&tag, &computed, limits)));
        walk(&child, &computed, sheet, limits, out);
    }
}

impl ProcessPlugin for StylesPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Copies computed styles into inline style attributes"
    }

    fn transform(&self, html: &str, _settings: &Settings) -> Result<String> {
        let limits = FontLimits {
            min: self.state.number_value("min_font_size", 12.0),
            max: self.state.number_value("max_font_size", 40.0),
        };
        rewrite_fragment(html, |root| {
            let style_elements = dom::elements_by_tag(root, &["style"]);
            let mut sheet = Stylesheet::default();
            for style in &style_elements {
                sheet.add_source(&dom::text_content(style));
            }

            let mut updates = Vec::new();
            walk(root, &Computed::default(), &sheet, limits, &mut updates);
            for (node, declarations) in updates {
                let style = merge_inline(dom::get_attr(&node, "style").as_deref(), &declarations);
                dom::set_attr(&node, "style", &style);
            }

            for style in &style_elements {
                dom::detach(style);
            }
            Ok(())
        })
    }
}
