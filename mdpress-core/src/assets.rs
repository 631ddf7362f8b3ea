//! Theme, highlight and callout assets consumed by the renderer
//!
//! Downloading and packaging themes belongs to the host. The core only asks an
//! [`AssetProvider`] for CSS text and callout descriptors; [`BuiltinAssets`] serves the
//! sheets compiled into the crate.

const DEFAULT_THEME_CSS: &str = include_str!("../css/themes/default.css");
const GITHUB_HIGHLIGHT_CSS: &str = include_str!("../css/highlight/github.css");

/// Icon and accent color for a callout kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutStyle {
    pub icon: String,
    pub color: String,
}

pub trait AssetProvider {
    /// CSS for a theme name, `None` when unknown
    fn theme_css(&self, name: &str) -> Option<String>;

    /// CSS for a code highlight theme, `None` when unknown
    fn highlight_css(&self, name: &str) -> Option<String>;

    fn callout_style(&self, kind: &str) -> CalloutStyle;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAssets;

impl AssetProvider for BuiltinAssets {
    fn theme_css(&self, name: &str) -> Option<String> {
        match name {
            "default" => Some(DEFAULT_THEME_CSS.to_string()),
            _ => None,
        }
    }

    fn highlight_css(&self, name: &str) -> Option<String> {
        match name {
            "github" => Some(GITHUB_HIGHLIGHT_CSS.to_string()),
            _ => None,
        }
    }

    fn callout_style(&self, kind: &str) -> CalloutStyle {
        let (icon, color) = match kind.to_ascii_lowercase().as_str() {
            "note" | "info" => ("ℹ️", "#086ddd"),
            "tip" | "hint" | "important" => ("💡", "#00bfa5"),
            "success" | "check" | "done" => ("✅", "#08b94e"),
            "question" | "help" | "faq" => ("❓", "#ec7500"),
            "warning" | "caution" | "attention" => ("⚠️", "#ec7500"),
            "failure" | "fail" | "missing" | "danger" | "error" | "bug" => ("⛔", "#e93147"),
            "example" => ("📋", "#7852ee"),
            "quote" | "cite" => ("💬", "#9e9e9e"),
            _ => ("📝", "#086ddd"),
        };
        CalloutStyle {
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}
