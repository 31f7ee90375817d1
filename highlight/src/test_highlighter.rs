use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use syntaxhighlight_protocol::HighlightOptions;

use crate::error::HighlighterError;
use crate::format::escape_text;
use crate::pygments::HighlightRequest;
use crate::pygments::Highlighter;

/// Highlighter double that records every invocation.
#[derive(Debug, Default)]
pub(crate) struct RecordingHighlighter {
    fail: bool,
    calls: AtomicUsize,
    seen_options: Mutex<Vec<HighlightOptions>>,
}

impl RecordingHighlighter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A highlighter that fails every request as if the process timed out.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_options(&self) -> Option<HighlightOptions> {
        match self.seen_options.lock() {
            Ok(seen) => seen.last().cloned(),
            Err(poisoned) => poisoned.into_inner().last().cloned(),
        }
    }

    /// The HTML this double returns for `code` highlighted with `lexer`.
    pub(crate) fn rendered(lexer: &str, code: &str) -> String {
        format!(
            "<div class=\"mw-highlight\"><pre><span class=\"{lexer}\">{}</span></pre></div>\n",
            escape_text(code)
        )
    }
}

impl Highlighter for RecordingHighlighter {
    async fn highlight(&self, request: HighlightRequest<'_>) -> Result<String, HighlighterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.seen_options.lock() {
            Ok(mut seen) => seen.push(request.options.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.options.clone()),
        }
        if self.fail {
            return Err(HighlighterError::Timeout(Duration::from_secs(10)));
        }
        Ok(Self::rendered(request.lexer.as_str(), request.code))
    }
}
