//! HTML element classification.
//!
//! - `is_void_element()` - Self-closing elements (br, img, etc.)
//! - `is_verbatim_element()` - Elements whose content must not be reflowed
//! - `is_inline_element()` - Elements that stay in text flow

/// Check if an HTML tag is a void element (no closing tag).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag content is whitespace-sensitive or raw text.
///
/// `script` and `style` are raw text elements; `pre` and
/// `textarea` render their whitespace.
#[inline]
pub fn is_verbatim_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "pre" | "textarea")
}

/// Check if tag is phrasing content that stays on the current line.
#[inline]
pub fn is_inline_element(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "br"
            | "button"
            | "cite"
            | "code"
            | "data"
            | "del"
            | "dfn"
            | "em"
            | "i"
            | "img"
            | "input"
            | "ins"
            | "kbd"
            | "label"
            | "mark"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "u"
            | "var"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(is_void_element("img"));
        assert!(!is_void_element("div"));
        assert!(is_verbatim_element("pre"));
        assert!(is_verbatim_element("script"));
        assert!(is_inline_element("a"));
        assert!(!is_inline_element("section"));
    }
}
