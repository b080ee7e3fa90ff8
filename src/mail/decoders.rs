use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use log::debug;

use crate::domain::message::{MIME_TEXT_HTML, MIME_TEXT_PLAIN, MessagePart};
use crate::mail::html::{HtmlStyle, html_to_text};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

// Gmail hands out the URL-safe alphabet; accept standard base64 too.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Best-effort plaintext body for a part tree. Never fails: anything that
/// cannot be decoded yields an empty string.
pub fn decode_body(part: &MessagePart) -> String {
    match part {
        MessagePart::Leaf { mime_type, data } if is_mime(mime_type, MIME_TEXT_PLAIN) => {
            decode_payload(data)
        }
        MessagePart::Leaf { mime_type, data } if is_mime(mime_type, MIME_TEXT_HTML) => {
            html_to_text(&decode_payload(data), HtmlStyle::Message)
        }
        MessagePart::Multipart { children, .. } => decode_children(children),
        MessagePart::Leaf { data, .. } => {
            let text = decode_payload(data);
            if text.starts_with('<') && text.ends_with('>') {
                html_to_text(&text, HtmlStyle::Bare)
            } else {
                text
            }
        }
        MessagePart::Empty { .. } => String::new(),
    }
}

/// Plain siblings win over HTML siblings, and both win over anything nested
/// deeper.
fn decode_children(children: &[MessagePart]) -> String {
    if let Some(data) = first_leaf_of(children, MIME_TEXT_PLAIN) {
        return decode_payload(data);
    }
    if let Some(data) = first_leaf_of(children, MIME_TEXT_HTML) {
        return html_to_text(&decode_payload(data), HtmlStyle::Message);
    }
    children
        .iter()
        .filter(|c| c.is_multipart())
        .map(decode_body)
        .find(|body| !body.is_empty())
        .unwrap_or_default()
}

fn first_leaf_of<'a>(children: &'a [MessagePart], mime: &str) -> Option<&'a str> {
    children.iter().find_map(|c| match c {
        MessagePart::Leaf { mime_type, data } if is_mime(mime_type, mime) => Some(data.as_str()),
        _ => None,
    })
}

/// Exact match: an oddly cased type is treated like any other leaf.
fn is_mime(actual: &str, expected: &str) -> bool {
    actual == expected
}

/// Decodes a base64 body payload into text; invalid UTF-8 is replaced lossily.
pub fn decode_payload(data: &str) -> String {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = URL_SAFE_LENIENT
        .decode(&compact)
        .or_else(|_| STANDARD_LENIENT.decode(&compact));
    match bytes {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!("undecodable body payload ({} chars): {e}", data.len());
            String::new()
        }
    }
}

/// Collapses a body into a single line of at most `max_chars` characters.
pub fn normalize_snippet(s: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(line);
        if out.chars().count() >= max_chars {
            break;
        }
    }
    out.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose;

    fn b64(s: &str) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(s)
    }

    fn plain(s: &str) -> MessagePart {
        MessagePart::leaf("text/plain", b64(s))
    }

    fn html(s: &str) -> MessagePart {
        MessagePart::leaf("text/html", b64(s))
    }

    #[test]
    fn plain_root_returned_verbatim() {
        let body = "Hi there,\n\n  indented <b>not html</b>\n";
        assert_eq!(decode_body(&plain(body)), body);
    }

    #[test]
    fn plain_child_beats_html_sibling_regardless_of_order() {
        let tree = MessagePart::multipart(
            "multipart/alternative",
            vec![html("<p>rich version</p>"), plain("plain version")],
        );
        assert_eq!(decode_body(&tree), "plain version");
    }

    #[test]
    fn plain_child_beats_nested_content() {
        let nested = MessagePart::multipart(
            "multipart/alternative",
            vec![plain("deep plain"), html("<p>deep html</p>")],
        );
        let tree = MessagePart::multipart("multipart/mixed", vec![nested, plain("top plain")]);
        assert_eq!(decode_body(&tree), "top plain");
    }

    #[test]
    fn html_child_used_when_no_plain_sibling() {
        let tree = MessagePart::multipart(
            "multipart/related",
            vec![
                MessagePart::leaf("image/png", b64("PNG")),
                html("<p>only html</p>"),
            ],
        );
        assert_eq!(decode_body(&tree), "only html");
    }

    #[test]
    fn nested_alternative_inside_mixed() {
        let alternative = MessagePart::multipart(
            "multipart/alternative",
            vec![plain("the body"), html("<p>the body</p>")],
        );
        let tree = MessagePart::multipart(
            "multipart/mixed",
            vec![
                alternative,
                MessagePart::leaf("application/pdf", b64("%PDF-1.4")),
            ],
        );
        assert_eq!(decode_body(&tree), "the body");
    }

    #[test]
    fn recursion_skips_empty_branches() {
        let barren = MessagePart::multipart(
            "multipart/alternative",
            vec![MessagePart::empty("text/plain")],
        );
        let fruitful = MessagePart::multipart("multipart/alternative", vec![plain("found")]);
        let tree = MessagePart::multipart("multipart/mixed", vec![barren, fruitful]);
        assert_eq!(decode_body(&tree), "found");
    }

    #[test]
    fn leaf_children_are_not_decoded_as_fallback() {
        let tree = MessagePart::multipart(
            "multipart/mixed",
            vec![MessagePart::leaf("application/octet-stream", b64("attachment"))],
        );
        assert_eq!(decode_body(&tree), "");
    }

    #[test]
    fn untyped_leaf_returned_as_text() {
        let part = MessagePart::leaf("application/octet-stream", b64("just text"));
        assert_eq!(decode_body(&part), "just text");
    }

    #[test]
    fn mime_types_match_exactly() {
        let upper = MessagePart::leaf("TEXT/PLAIN", b64("<b>x</b>"));
        assert_eq!(decode_body(&upper), "x");

        let tree = MessagePart::multipart(
            "multipart/alternative",
            vec![
                MessagePart::leaf("Text/Plain", b64("odd case")),
                html("<p>html wins</p>"),
            ],
        );
        assert_eq!(decode_body(&tree), "html wins");
    }

    #[test]
    fn untyped_leaf_with_markup_is_converted() {
        let part = MessagePart::leaf("application/octet-stream", b64("<div>hello</div>"));
        assert_eq!(decode_body(&part), "hello");
    }

    #[test]
    fn empty_tree_decodes_to_empty_string() {
        assert_eq!(decode_body(&MessagePart::empty("multipart/mixed")), "");
        assert_eq!(
            decode_body(&MessagePart::multipart("multipart/mixed", vec![])),
            ""
        );
    }

    #[test]
    fn undecodable_payload_yields_empty_body() {
        let part = MessagePart::leaf("text/plain", "%%%not base64%%%");
        assert_eq!(decode_body(&part), "");
    }

    #[test]
    fn padded_standard_payload_accepted() {
        let data = general_purpose::STANDARD.encode("ok?>>");
        assert!(data.contains('+') || data.contains('/') || data.ends_with('='));
        assert_eq!(decode_payload(&data), "ok?>>");
    }

    #[test]
    fn snippet_collapses_lines() {
        let s = normalize_snippet("Hello\n\n   world  \nagain", 11);
        assert_eq!(s, "Hello world");
    }
}
