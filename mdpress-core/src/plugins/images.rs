//! Image sizing and uploaded-source substitution

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::{ComponentState, MetaField};
use crate::dom::{self, Fragment};
use crate::error::Result;
use crate::settings::Settings;

pub const NAME: &str = "images";

pub struct ImagesPlugin {
    state: ComponentState,
}

impl Default for ImagesPlugin {
    fn default() -> Self {
        ImagesPlugin {
            state: ComponentState::new(NAME)
                .with_option("max_width", "100%", MetaField::text("Maximum width"))
                .with_option("center", true, MetaField::switch("Center images")),
        }
    }
}

fn is_remote(src: &str) -> bool {
    let lower = src.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

/// Uploaded URL for `src`; keys that went through a case-folding config layer still match
fn uploaded_url(settings: &Settings, src: &str) -> Option<String> {
    settings.uploaded_images.get(src).cloned().or_else(|| {
        settings
            .uploaded_images
            .iter()
            .find(|(local, _)| local.eq_ignore_ascii_case(src))
            .map(|(_, url)| url.clone())
    })
}

/// Image sources that still point at local files and need uploading
pub fn local_image_sources(html: &str) -> Result<Vec<String>> {
    let fragment = Fragment::parse(html)?;
    let mut sources = Vec::new();
    for img in dom::elements_by_tag(fragment.root(), &["img"]) {
        if let Some(src) = dom::get_attr(&img, "src") {
            if !src.is_empty() && !is_remote(&src) && !sources.contains(&src) {
                sources.push(src);
            }
        }
    }
    Ok(sources)
}

impl ProcessPlugin for ImagesPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Sizes images and swaps local sources for uploaded URLs"
    }

    fn transform(&self, html: &str, settings: &Settings) -> Result<String> {
        let max_width = self.state.text_value("max_width", "100%");
        let center = self.state.bool_value("center", true);
        rewrite_fragment(html, |root| {
            for img in dom::elements_by_tag(root, &["img"]) {
                // Styled images were handled by an earlier pass or by the author.
                if dom::has_attr(&img, "style") {
                    continue;
                }
                let src = dom::get_attr(&img, "src").unwrap_or_default();
                let src = uploaded_url(settings, &src).unwrap_or(src);
                dom::set_attr(&img, "src", &src);
                dom::set_attr(&img, "data-src", &src);

                let mut style = format!("display: block; max-width: {max_width}; height: auto;");
                if center {
                    style.push_str(" margin: 0 auto;");
                }
                if let Some(width) = dom::get_attr(&img, "width")
                    .and_then(|w| w.trim().trim_end_matches("px").parse::<u32>().ok())
                {
                    style.push_str(&format!(" width: {width}px;"));
                }
                dom::set_attr(&img, "style", &style);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_and_substitutes_sources() {
        let mut settings = Settings::default();
        settings
            .uploaded_images
            .insert("cat.png".to_string(), "https://cdn.example/cat.png".to_string());
        let html = r#"<p><img src="cat.png" width="300"></p>"#;
        let output = ImagesPlugin::default().transform(html, &settings).unwrap();
        assert_eq!(
            output,
            r#"<p><img src="https://cdn.example/cat.png" width="300" data-src="https://cdn.example/cat.png" style="display: block; max-width: 100%; height: auto; margin: 0 auto; width: 300px;"></p>"#
        );
    }

    #[test]
    fn uploaded_paths_match_regardless_of_case() {
        let mut settings = Settings::default();
        settings
            .uploaded_images
            .insert("assets/cat.png".to_string(), "https://cdn.example/cat.png".to_string());
        settings
            .uploaded_images
            .insert("Dog.PNG".to_string(), "https://cdn.example/dog.png".to_string());
        let html = r#"<img src="Assets/Cat.PNG"><img src="Dog.PNG">"#;
        let output = ImagesPlugin::default().transform(html, &settings).unwrap();
        assert!(output.contains(r#"src="https://cdn.example/cat.png""#));
        assert!(output.contains(r#"src="https://cdn.example/dog.png""#));
    }

    #[test]
    fn images_with_style_are_left_alone() {
        let html = r#"<img src="a.png" style="width: 10px">"#;
        let output = ImagesPlugin::default()
            .transform(html, &Settings::default())
            .unwrap();
        assert_eq!(output, html);
    }

    #[test]
    fn rerunning_is_a_no_op() {
        let plugin = ImagesPlugin::default();
        let settings = Settings::default();
        let once = plugin.transform(r#"<img src="a.png">"#, &settings).unwrap();
        let twice = plugin.transform(&once, &settings).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn lists_local_sources_once() {
        let html = r#"<img src="a.png"><img src="https://x/b.png"><img src="a.png"><img src="c.jpg">"#;
        assert_eq!(local_image_sources(html).unwrap(), vec!["a.png", "c.jpg"]);
    }
}
