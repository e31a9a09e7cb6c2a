//! Markup stripping for Skype message content.
//!
//! Skype stores rich messages with inline XML/HTML (`<b>`, `<a href>`,
//! `<e_m>`, `<URIObject>` …) and HTML-escaped text. The display text used
//! for viewing and searching has every `<…>` tag removed and entities
//! decoded.

/// Remove tags, decode HTML entities, and trim surrounding whitespace.
pub fn to_display_text(content: &str) -> String {
    let stripped = strip_tags(content);
    unescape_entities(&stripped).trim().to_string()
}

/// Remove every non-empty `<…>` tag. A lone `<` or `<>` is kept as text.
pub fn strip_tags(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(0) => {
                result.push('<');
                rest = after;
            }
            Some(close) => rest = &after[close + 1..],
            None => {
                result.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Decode HTML entities: the full HTML5 named table, numeric forms
/// (`&#39;`, `&#x27;`), and legacy names written without `;` (`&amp`).
///
/// Unknown entities are left untouched.
pub fn unescape_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    htmlize::unescape(input).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_simple_tags() {
        assert_eq!(strip_tags("<b>bold</b> text"), "bold text");
    }

    #[test]
    fn test_strip_keeps_lone_brackets() {
        assert_eq!(strip_tags("a < b"), "a < b");
        assert_eq!(strip_tags("x <> y"), "x <> y");
    }

    #[test]
    fn test_strip_uri_object() {
        let raw = r#"<URIObject type="Picture.1" uri="https://x"><Title>Photo</Title></URIObject>"#;
        assert_eq!(strip_tags(raw), "Photo");
    }

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape_entities("Tom &amp; Jerry &lt;3&gt;"), "Tom & Jerry <3>");
        assert_eq!(unescape_entities("it&#39;s &#x41;"), "it's A");
        assert_eq!(unescape_entities("&quot;hi&quot;"), "\"hi\"");
    }

    #[test]
    fn test_unescape_leaves_unknown() {
        assert_eq!(unescape_entities("fish & chips"), "fish & chips");
        assert_eq!(unescape_entities("&bogus; &"), "&bogus; &");
    }

    #[test]
    fn test_unescape_full_entity_table() {
        assert_eq!(unescape_entities("caf&eacute;"), "café");
        assert_eq!(unescape_entities("I &hearts; it"), "I ♥ it");
        assert_eq!(unescape_entities("&Omega;&rarr;&frac12;"), "Ω→½");
    }

    #[test]
    fn test_unescape_legacy_without_semicolon() {
        assert_eq!(unescape_entities("fish &amp chips"), "fish & chips");
        assert_eq!(unescape_entities("&lt3"), "<3");
        assert_eq!(
            to_display_text("caf&eacute; &hearts; fish &amp chips"),
            "café ♥ fish & chips"
        );
    }

    #[test]
    fn test_entities_decoded_after_tags_removed() {
        // An escaped tag must survive as text, not be stripped.
        assert_eq!(to_display_text("<i>&lt;tag&gt;</i>"), "<tag>");
    }

    #[test]
    fn test_display_text_trims() {
        assert_eq!(to_display_text("  <p>Hello</p>\n"), "Hello");
    }
}
