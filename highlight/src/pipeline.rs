use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use syntaxhighlight_protocol::HIGHLIGHT_MAX_BYTES;
use syntaxhighlight_protocol::LexerId;
use syntaxhighlight_protocol::OutputFormat;
use syntaxhighlight_protocol::RenderArgs;

use crate::cache::CacheStore;
use crate::cache::cache_key;
use crate::error::HighlighterError;
use crate::format;
use crate::lexers::LexerTable;
use crate::pygments::HighlightRequest;
use crate::pygments::Highlighter;
use crate::request::build_options;

/// Host-facing knobs that do not change how a single snippet is highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Armor tabs as `&#9;` so an HTML tidier does not expand them.
    #[serde(default)]
    pub use_tidy: bool,
    /// Content model name to the lexer used when a whole page of that model is shown.
    #[serde(default = "default_content_models")]
    pub content_models: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_tidy: false,
            content_models: default_content_models(),
        }
    }
}

fn default_content_models() -> BTreeMap<String, String> {
    [("css", "css"), ("javascript", "javascript"), ("json", "json")]
        .into_iter()
        .map(|(model, lexer)| (model.to_string(), lexer.to_string()))
        .collect()
}

/// The request pipeline: lexer resolution, option building, cache, external call, output
/// formatting.
#[derive(Debug)]
pub struct SyntaxHighlight<H, C> {
    lexers: LexerTable,
    highlighter: H,
    cache: C,
    settings: Settings,
}

impl<H: Highlighter, C: CacheStore> SyntaxHighlight<H, C> {
    pub fn new(lexers: LexerTable, highlighter: H, cache: C) -> Self {
        Self {
            lexers,
            highlighter,
            cache,
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn lexers(&self) -> &LexerTable {
        &self.lexers
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolve_lexer(&self, tag: &str) -> Option<LexerId> {
        self.lexers.resolve(tag)
    }

    /// Highlights `code` as HTML.
    ///
    /// Never fails. Without a lexer, or when `code` exceeds [`HIGHLIGHT_MAX_BYTES`], the
    /// result is escaped plain text and the highlighter is not called. If the highlighter
    /// fails, nothing is cached and the request is rendered once more as plain text.
    pub async fn highlight(
        &self,
        code: &str,
        lexer: Option<&LexerId>,
        args: &RenderArgs,
    ) -> String {
        let inline = args.is_inline();
        let lexer = if code.len() > HIGHLIGHT_MAX_BYTES {
            None
        } else {
            lexer
        };

        let Some(lexer) = lexer else {
            return format::plain(code, inline);
        };

        match self.highlight_cached(code, lexer, args).await {
            Ok(html) => format::highlighted(html, inline),
            Err(err) => {
                tracing::warn!(
                    "Failed to invoke Pygments ({err}). Please check that Pygments is installed \
                     and that the configured pygmentize path is accurate."
                );
                format::plain(code, inline)
            }
        }
    }

    async fn highlight_cached(
        &self,
        code: &str,
        lexer: &LexerId,
        args: &RenderArgs,
    ) -> Result<String, HighlighterError> {
        let options = build_options(code, lexer, args);
        let key = cache_key(lexer, code, &options);

        if let Some(cached) = key.as_deref().and_then(|key| self.cache.get(key)) {
            tracing::debug!("highlight cache hit for lexer {lexer}");
            return Ok(cached);
        }

        let output = self
            .highlighter
            .highlight(HighlightRequest {
                code,
                lexer,
                format: OutputFormat::Html,
                options: &options,
            })
            .await?;

        if let Some(key) = key.as_deref() {
            self.cache.set(key, &output);
        }
        Ok(output)
    }
}
