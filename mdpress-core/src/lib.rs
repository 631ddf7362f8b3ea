//! Markdown to platform HTML
//!
//!     This crate turns Markdown notes into HTML that survives being pasted into rich-text
//!     editors (WeChat official accounts, Zhihu, Twitter). It is a pure lib: it never reads
//!     files, environment variables or prints. The mdpress-cli crate is the shell around it.
//!
//! Architecture
//!
//!     Rendering happens in two independently pluggable stages:
//!
//!     1. Markdown → HTML. The [`markdown::MarkdownParser`] owns an ordered list of
//!        [`markdown::Extension`]s. Each parse runs prepare → preprocess → comrak parse and
//!        tree walk → postprocess → before_publish across the enabled extensions, in
//!        registration order.
//!     2. HTML → platform HTML. The [`plugins::PluginManager`] owns the process plugins; a
//!        [`platform::PlatformAdapter`] names a fixed ordered subset of them and runs it as a
//!        reduction over the HTML string. A failing stage passes its input through.
//!
//!     The [`publish::Publisher`] wires both stages together with the theme stylesheet and
//!     the [`cards::CardDataManager`], which carries payloads around the DOM stages untouched.
//!
//!     The file structure:
//!     .
//!     ├── assets.rs               # Theme/highlight CSS and callout descriptors
//!     ├── cards.rs                # Out-of-band card payloads
//!     ├── component.rs            # Enable flag + config shared by extensions and plugins
//!     ├── css.rs                  # Minimal cascade used by the styles plugin
//!     ├── dom.rs                  # html5ever tree helpers
//!     ├── markdown
//!     │   ├── extension.rs        # Extension trait and render context
//!     │   ├── references.rs       # Position-ordered footnote collection
//!     │   └── extensions          # Built-in extensions
//!     ├── plugins                 # Process plugins and their manager
//!     ├── platform                # Platform adapters
//!     └── publish.rs              # End-to-end orchestration
//!
//! Ordering
//!
//!     Both stages are order sensitive. Extensions see nodes in registration order, and link
//!     footnotes are numbered by the position stamped on each token, not by collection order.
//!     Adapters run `styles` last because it copies the computed style of the final tree.

pub mod assets;
pub mod cards;
pub mod component;
pub mod css;
pub mod dom;
pub mod error;
pub mod markdown;
pub mod platform;
pub mod plugins;
pub mod publish;
pub mod settings;

pub use assets::{AssetProvider, BuiltinAssets, CalloutStyle};
pub use cards::CardDataManager;
pub use component::{ComponentState, ConfigMap, ConfigValue};
pub use error::{render_error_html, PressError, Result};
pub use markdown::{Extension, MarkdownParser, RenderSession};
pub use platform::{AdapterRegistry, PlatformAdapter};
pub use plugins::{PluginManager, ProcessPlugin, ProcessReport};
pub use publish::Publisher;
pub use settings::{LinkDescriptionMode, LinkFootnoteMode, MathDialect, Settings};
