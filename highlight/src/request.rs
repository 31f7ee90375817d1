use syntaxhighlight_protocol::HighlightOptions;
use syntaxhighlight_protocol::LexerId;
use syntaxhighlight_protocol::RenderArgs;

use crate::line_spec::parse_lines;

const PHP_OPEN_TAG: &str = "<?php";

/// Composes the option set handed to the external highlighter for one request.
pub fn build_options(code: &str, lexer: &LexerId, args: &RenderArgs) -> HighlightOptions {
    let mut options = HighlightOptions::default();

    if args.line {
        options.line_numbers = true;
    }

    if lexer.is_php() && !code.contains(PHP_OPEN_TAG) {
        options.start_inline_heuristic = true;
    }

    if let Some(spec) = &args.highlight {
        options.highlighted_lines = parse_lines(spec);
    }

    if let Some(start) = &args.start {
        options.start_line = Some(start.clone());
    }

    if args.is_inline() {
        options.inline = true;
        options.no_wrap = true;
    }

    options
}
