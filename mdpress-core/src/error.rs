//! Error types for the rendering and adaptation pipeline

use thiserror::Error;

/// Errors raised by extensions, plugins, registries and the DOM layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PressError {
    /// The Markdown renderer could not be assembled from the enabled extensions
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// An extension hook failed while rendering or post-processing
    #[error("extension '{name}' failed: {message}")]
    Extension { name: String, message: String },

    /// A process plugin failed to rewrite its input
    #[error("plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },

    /// HTML could not be parsed, queried or serialized
    #[error("DOM error: {0}")]
    Dom(String),

    /// A component with the same name is already registered
    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: &'static str, name: String },

    /// A lookup by name found nothing
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Settings or config values could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PressError {
    pub fn extension(name: &str, message: impl Into<String>) -> Self {
        PressError::Extension {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn plugin(name: &str, message: impl Into<String>) -> Self {
        PressError::Plugin {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for PressError {
    fn from(err: serde_json::Error) -> Self {
        PressError::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PressError>;

/// The fragment shown in place of a document that could not be rendered
pub fn render_error_html(err: &PressError) -> String {
    format!(
        concat!(
            r#"<section class="render-error">"#,
            r#"<p><strong>Rendering failed.</strong> Edit the document and try again, "#,
            r#"or report the problem together with the message below.</p>"#,
            r#"<pre><code>{}</code></pre>"#,
            r#"</section>"#
        ),
        crate::dom::html_escape(&err.to_string())
    )
}
