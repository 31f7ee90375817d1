//! Wrapping of highlighter output (or escaped plain text) into embeddable markup.

use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;
use syntaxhighlight_protocol::HIGHLIGHT_CSS_CLASS;

static LEADING_BLOCK_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^<(pre|div)([^>]*)>").ok());

static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .ok()
});

static ENTITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").ok());

/// Escapes text placed between tags.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Fallback rendering used whenever no highlighting happens.
///
/// Block mode keeps the code untouched inside `<pre>`; inline mode trims it first.
pub fn plain(code: &str, inline: bool) -> String {
    if inline {
        return format!(
            r#"<span class="{HIGHLIGHT_CSS_CLASS}">{}</span>"#,
            escape_text(code.trim())
        );
    }
    format!(
        r#"<div class="{HIGHLIGHT_CSS_CLASS}"><pre>{}</pre></div>"#,
        escape_text(code)
    )
}

/// Wraps highlighter output. Block output already carries its own container.
pub fn highlighted(html: String, inline: bool) -> String {
    if !inline {
        return html;
    }
    format!(r#"<span class="{HIGHLIGHT_CSS_CLASS}">{}</span>"#, html.trim())
}

/// Appends `class` to the class attribute of a leading `<pre>` or `<div>` tag.
///
/// The tag's attributes are decoded and re-encoded; everything after the tag is kept as is.
/// Fragments that do not start with such a tag are returned unchanged.
pub fn merge_leading_block_class(html: &str, class: &str) -> String {
    let Some(captures) = LEADING_BLOCK_TAG
        .as_ref()
        .and_then(|re| re.captures(html))
    else {
        return html.to_string();
    };
    let (Some(whole), Some(tag), Some(raw_attrs)) =
        (captures.get(0), captures.get(1), captures.get(2))
    else {
        return html.to_string();
    };

    let mut attrs = decode_tag_attributes(raw_attrs.as_str());
    match attrs.iter_mut().find(|(name, _)| name == "class") {
        Some((_, value)) if !value.trim().is_empty() => {
            value.push(' ');
            value.push_str(class);
        }
        Some((_, value)) => *value = class.to_string(),
        None => attrs.push(("class".to_string(), class.to_string())),
    }

    format!(
        "<{}{}>{}",
        tag.as_str(),
        encode_tag_attributes(&attrs),
        &html[whole.end()..]
    )
}

/// Parses the attribute portion of an opening tag.
///
/// Names are lowercased; values may be double-, single- or unquoted and have entities
/// decoded. A repeated attribute keeps its first position and its last value.
pub fn decode_tag_attributes(raw: &str) -> Vec<(String, String)> {
    let Some(re) = ATTRIBUTE.as_ref() else {
        return Vec::new();
    };

    let mut attrs: Vec<(String, String)> = Vec::new();
    for captures in re.captures_iter(raw) {
        let Some(name) = captures.get(1) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();

        match attrs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => attrs.push((name, value)),
        }
    }
    attrs
}

/// Serializes attributes as ` name="value"` pairs with values escaped.
pub fn encode_tag_attributes(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(r#" {name}="{}""#, escape_attribute(value)))
        .collect()
}

fn decode_entities(value: &str) -> String {
    let Some(re) = ENTITY.as_ref() else {
        return value.to_string();
    };
    re.replace_all(value, |captures: &Captures<'_>| {
        let whole = captures.get(0).map_or("", |m| m.as_str());
        let body = captures.get(1).map_or("", |m| m.as_str());
        decode_entity(body).map_or_else(|| whole.to_string(), String::from)
    })
    .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(decimal) = body.strip_prefix('#') {
        return decimal.parse().ok().and_then(char::from_u32);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_block_escapes_and_keeps_whitespace() {
        assert_eq!(
            plain("  if (a < b && c > d) {}\n", false),
            "<div class=\"mw-highlight\"><pre>  if (a &lt; b &amp;&amp; c &gt; d) {}\n</pre></div>"
        );
    }

    #[test]
    fn plain_inline_trims_and_uses_span() {
        insta::assert_snapshot!(
            plain("  <b>bold</b>\n", true),
            @r#"<span class="mw-highlight">&lt;b&gt;bold&lt;/b&gt;</span>"#
        );
    }

    #[test]
    fn highlighted_block_is_verbatim() {
        let html = "<div class=\"mw-highlight\"><pre><span class=\"k\">fn</span>\n</pre></div>\n";
        assert_eq!(highlighted(html.to_string(), false), html);
    }

    #[test]
    fn highlighted_inline_is_trimmed_and_wrapped() {
        assert_eq!(
            highlighted("<span class=\"k\">fn</span>\n".to_string(), true),
            "<span class=\"mw-highlight\"><span class=\"k\">fn</span></span>"
        );
    }

    #[test]
    fn merges_class_onto_leading_pre() {
        let html = "<pre class=\"mw-highlight\" data-x='a &amp; b'>{\"a\": 1}</pre>";
        assert_eq!(
            merge_leading_block_class(html, "api-pretty-content"),
            "<pre class=\"mw-highlight api-pretty-content\" data-x=\"a &amp; b\">{\"a\": 1}</pre>"
        );
    }

    #[test]
    fn merges_class_onto_leading_div_without_class() {
        let html = "<DIV dir=ltr><pre>x</pre></DIV>";
        assert_eq!(
            merge_leading_block_class(html, "api-pretty-content"),
            "<DIV dir=\"ltr\" class=\"api-pretty-content\"><pre>x</pre></DIV>"
        );
    }

    #[test]
    fn leaves_other_markup_untouched() {
        let html = "<span class=\"mw-highlight\">x</span>";
        assert_eq!(merge_leading_block_class(html, "extra"), html);
        let html = " <pre>x</pre>";
        assert_eq!(merge_leading_block_class(html, "extra"), html);
    }

    #[test]
    fn decodes_attribute_forms() {
        assert_eq!(
            decode_tag_attributes(r#" ID="a" title='x &lt; y' hidden data-n=5 id="b" alt="&#65;&#x42;&bogus;""#),
            vec![
                ("id".to_string(), "b".to_string()),
                ("title".to_string(), "x < y".to_string()),
                ("hidden".to_string(), String::new()),
                ("data-n".to_string(), "5".to_string()),
                ("alt".to_string(), "AB&bogus;".to_string()),
            ]
        );
    }

    #[test]
    fn encoded_attributes_escape_quotes() {
        let attrs = vec![("title".to_string(), "say \"hi\" & <go>".to_string())];
        assert_eq!(
            encode_tag_attributes(&attrs),
            " title=\"say &quot;hi&quot; &amp; &lt;go&gt;\""
        );
    }
}
