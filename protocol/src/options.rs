use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::HIGHLIGHT_CSS_CLASS;

/// Output format requested from the external highlighter.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
}

/// Configuration bundle handed to the external highlighter.
///
/// Field order is fixed, so serializing two equal values always yields the same bytes.
/// Cache keys rely on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightOptions {
    pub css_class: String,
    pub encoding: String,
    /// Line numbers rendered inline in the output stream, not in a separate gutter.
    #[serde(default)]
    pub line_numbers: bool,
    /// Treat the whole buffer as code (PHP without an opening `<?php`).
    #[serde(default)]
    pub start_inline_heuristic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlighted_lines: Vec<u32>,
    /// Passed through verbatim; the highlighter validates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<String>,
    /// Render as an inline span instead of a block.
    #[serde(default)]
    pub inline: bool,
    /// Suppress the highlighter's own `<pre>` wrapper.
    #[serde(default)]
    pub no_wrap: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            css_class: HIGHLIGHT_CSS_CLASS.to_string(),
            encoding: "utf-8".to_string(),
            line_numbers: false,
            start_inline_heuristic: false,
            highlighted_lines: Vec::new(),
            start_line: None,
            inline: false,
            no_wrap: false,
        }
    }
}

impl HighlightOptions {
    /// Options as the Pygments HTML formatter names them.
    ///
    /// `inline` has no formatter counterpart; it only shapes the wrapping done after the
    /// highlighter returns.
    pub fn to_pygments_options(&self) -> Vec<(&'static str, String)> {
        let mut options = vec![
            ("cssclass", self.css_class.clone()),
            ("encoding", self.encoding.clone()),
        ];
        if self.line_numbers {
            options.push(("linenos", "inline".to_string()));
        }
        if self.start_inline_heuristic {
            options.push(("startinline", "1".to_string()));
        }
        if !self.highlighted_lines.is_empty() {
            let lines = self
                .highlighted_lines
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            options.push(("hl_lines", lines));
        }
        if let Some(start) = &self.start_line {
            options.push(("linenostart", start.clone()));
        }
        if self.no_wrap {
            options.push(("nowrap", "1".to_string()));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_only_carry_class_and_encoding() {
        assert_eq!(
            HighlightOptions::default().to_pygments_options(),
            vec![
                ("cssclass", "mw-highlight".to_string()),
                ("encoding", "utf-8".to_string()),
            ]
        );
    }

    #[test]
    fn full_option_set_maps_to_formatter_names() {
        let options = HighlightOptions {
            line_numbers: true,
            start_inline_heuristic: true,
            highlighted_lines: vec![3, 5, 6],
            start_line: Some("10".to_string()),
            inline: true,
            no_wrap: true,
            ..HighlightOptions::default()
        };

        assert_eq!(
            options.to_pygments_options(),
            vec![
                ("cssclass", "mw-highlight".to_string()),
                ("encoding", "utf-8".to_string()),
                ("linenos", "inline".to_string()),
                ("startinline", "1".to_string()),
                ("hl_lines", "3 5 6".to_string()),
                ("linenostart", "10".to_string()),
                ("nowrap", "1".to_string()),
            ]
        );
    }

    #[test]
    fn equal_options_serialize_identically() {
        let a = HighlightOptions {
            highlighted_lines: vec![1, 2],
            ..HighlightOptions::default()
        };
        let mut b = HighlightOptions::default();
        b.highlighted_lines.extend([1, 2]);

        assert_eq!(
            serde_json::to_string(&a).ok(),
            serde_json::to_string(&b).ok()
        );
    }

    #[test]
    fn output_format_displays_lowercase() {
        assert_eq!(OutputFormat::Html.to_string(), "html");
    }
}
