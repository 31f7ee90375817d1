//! Entry points for a hosting renderer.
//!
//! Tag handlers are registered explicitly in a [`TagRegistry`] that the host owns and
//! consults when it meets an extension tag; nothing here mutates global state.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use syntaxhighlight_protocol::API_PRETTY_CSS_CLASS;
use syntaxhighlight_protocol::LexerId;
use syntaxhighlight_protocol::RenderArgs;
use syntaxhighlight_protocol::RenderedFragment;

use crate::cache::CacheStore;
use crate::format::merge_leading_block_class;
use crate::lexers::lexer_for_mime;
use crate::pipeline::SyntaxHighlight;
use crate::pygments::Highlighter;

/// Tag names bound to the highlighter.
pub const HIGHLIGHT_TAGS: [&str; 2] = ["source", "syntaxhighlight"];

pub type TagFuture<'a> = Pin<Box<dyn Future<Output = RenderedFragment> + Send + 'a>>;

/// Renders the body of one extension tag.
pub trait TagHandler: Send + Sync {
    fn render<'a>(&'a self, body: &'a str, args: &'a RenderArgs) -> TagFuture<'a>;
}

/// Tag name to handler mapping handed to the hosting renderer.
#[derive(Clone, Default)]
pub struct TagRegistry {
    handlers: HashMap<String, Arc<dyn TagHandler>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `tag` (case-insensitive) to `handler`, replacing any earlier binding.
    pub fn register(&mut self, tag: &str, handler: Arc<dyn TagHandler>) {
        self.handlers.insert(tag.to_ascii_lowercase(), handler);
    }

    pub fn handler(&self, tag: &str) -> Option<&Arc<dyn TagHandler>> {
        self.handlers.get(&tag.to_ascii_lowercase())
    }

    /// Registered tag names, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Renders `body` with the handler bound to `tag`, or `None` if the tag is unknown.
    pub async fn render(
        &self,
        tag: &str,
        body: &str,
        args: &RenderArgs,
    ) -> Option<RenderedFragment> {
        let handler = self.handler(tag)?;
        Some(handler.render(body, args).await)
    }
}

/// Binds every highlight tag to `pipeline`.
pub fn register_tags<H, C>(registry: &mut TagRegistry, pipeline: Arc<SyntaxHighlight<H, C>>)
where
    H: Highlighter + 'static,
    C: CacheStore + 'static,
{
    for tag in HIGHLIGHT_TAGS {
        registry.register(tag, pipeline.clone());
    }
}

impl<H: Highlighter, C: CacheStore> TagHandler for SyntaxHighlight<H, C> {
    fn render<'a>(&'a self, body: &'a str, args: &'a RenderArgs) -> TagFuture<'a> {
        Box::pin(self.render_tag(body, args))
    }
}

impl<H: Highlighter, C: CacheStore> SyntaxHighlight<H, C> {
    /// Renders the body of a `<syntaxhighlight>` / `<source>` tag.
    pub async fn render_tag(&self, body: &str, args: &RenderArgs) -> RenderedFragment {
        let code = trim_tag_body(body);
        let lexer = args
            .lang
            .as_deref()
            .and_then(|lang| self.resolve_lexer(lang));

        let mut html = self.highlight(code, lexer.as_ref(), args).await;
        if self.settings().use_tidy {
            html = html.replace('\t', "&#9;");
        }
        RenderedFragment::with_pygments_styles(html)
    }

    /// Renders a whole page whose content model maps to a lexer.
    ///
    /// Returns `None` when the model is not highlighted or the text is empty, leaving the
    /// page to the host's default rendering.
    pub async fn render_content(&self, model: &str, text: &str) -> Option<RenderedFragment> {
        let lexer = LexerId::new(self.settings().content_models.get(model)?.as_str());
        if text.is_empty() {
            return None;
        }

        let html = self
            .highlight(text, Some(&lexer), &RenderArgs::default())
            .await;
        Some(RenderedFragment::with_pygments_styles(format!(
            "<div dir=\"ltr\">{html}</div>"
        )))
    }

    /// Renders API pretty-printer output for supported MIME types.
    pub async fn render_api_output(&self, mime: &str, text: &str) -> Option<RenderedFragment> {
        let lexer = lexer_for_mime(mime)?;

        let html = self
            .highlight(text, Some(&lexer), &RenderArgs::default())
            .await;
        let html = merge_leading_block_class(&html, API_PRETTY_CSS_CLASS);
        Some(RenderedFragment::with_pygments_styles(format!(
            "<div dir=\"ltr\">{html}</div>"
        )))
    }
}

/// Strips trailing whitespace and leading line feeds; leading spaces are indentation.
fn trim_tag_body(body: &str) -> &str {
    body.trim_end_matches([' ', '\t', '\n', '\r', '\0', '\x0B'])
        .trim_start_matches('\n')
}
