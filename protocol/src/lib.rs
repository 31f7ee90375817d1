//! Data types shared between the highlighting pipeline and its front ends.

mod fragment;
mod lexer;
mod options;
mod render_args;

pub use fragment::RenderedFragment;
pub use lexer::LexerId;
pub use options::HighlightOptions;
pub use options::OutputFormat;
pub use render_args::RenderArgs;

/// The maximum number of lines that may be selected for highlighting.
pub const HIGHLIGHT_MAX_LINES: usize = 1000;

/// Maximum input size handed to the external highlighter (100 kB).
pub const HIGHLIGHT_MAX_BYTES: usize = 102_400;

/// CSS class carried by every highlighted (or fallback) container.
pub const HIGHLIGHT_CSS_CLASS: &str = "mw-highlight";

/// Stylesheet module the host must load next to highlighted output.
pub const PYGMENTS_STYLE_MODULE: &str = "ext.pygments";

/// Extra class merged onto API pretty-printer output.
pub const API_PRETTY_CSS_CLASS: &str = "api-pretty-content";
