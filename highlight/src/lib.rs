//! Source-code highlighting for rendered wiki pages.
//!
//! Requests are normalized (lexer resolution, line selections, option building), looked up
//! in a cache, and otherwise sent to an external highlighter. Anything that cannot be
//! highlighted comes back as escaped plain text.

// Library code reports through `tracing`, never directly on stdout/stderr.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod atomic_write;
mod cache;
mod error;
mod format;
mod hooks;
mod lexers;
mod line_spec;
mod pipeline;
mod pygments;
mod request;

#[cfg(test)]
mod test_highlighter;

pub use atomic_write::write_atomic;
pub use cache::CacheStore;
pub use cache::DirectoryCache;
pub use cache::MemoryCache;
pub use cache::NoCache;
pub use cache::cache_key;
pub use error::HighlighterError;
pub use format::escape_text;
pub use format::merge_leading_block_class;
pub use hooks::HIGHLIGHT_TAGS;
pub use hooks::TagFuture;
pub use hooks::TagHandler;
pub use hooks::TagRegistry;
pub use hooks::register_tags;
pub use lexers::LexerTable;
pub use lexers::lexer_for_mime;
pub use lexers::parse_pygmentize_listing;
pub use line_spec::parse_lines;
pub use pipeline::Settings;
pub use pipeline::SyntaxHighlight;
pub use pygments::DEFAULT_TIMEOUT;
pub use pygments::HighlightRequest;
pub use pygments::Highlighter;
pub use pygments::Pygmentize;
pub use request::build_options;

pub use syntaxhighlight_protocol as protocol;
