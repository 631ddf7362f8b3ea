//! Built-in Markdown extensions

pub mod callouts;
pub mod code;
pub mod embeds;
pub mod footnotes;
pub mod highlight;
pub mod links;
pub mod math;

pub use callouts::CalloutExtension;
pub use code::FencedCodeExtension;
pub use embeds::EmbedExtension;
pub use footnotes::FootnoteExtension;
pub use highlight::HighlightExtension;
pub use links::LinkReferenceExtension;
pub use math::MathExtension;

use super::Extension;

/// Built-in extensions in registration order
///
/// Order matters: embeds must see `mpcard` fences before the generic code renderer, and
/// link footnotes are appended before note footnotes.
pub fn default_extensions() -> Vec<Box<dyn Extension>> {
    vec![
        Box::new(EmbedExtension::default()),
        Box::new(CalloutExtension::default()),
        Box::new(MathExtension::default()),
        Box::new(FencedCodeExtension::default()),
        Box::new(LinkReferenceExtension::default()),
        Box::new(FootnoteExtension::default()),
        Box::new(HighlightExtension::default()),
    ]
}
