use crate::models::MessagePayload;
use regex::Regex;
use std::sync::LazyLock;

pub const NO_TEXT_CONTENT: &str = "(no text content)";

const MAX_DEPTH: usize = 32;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Produces the most readable plain-text body for a message payload.
///
/// Direct data on a node always wins. Otherwise children are scanned in
/// order: a `text/plain` child with data is returned as-is, and a
/// `multipart/*` child is resolved by applying the same procedure to it,
/// its first non-empty result winning. Only then does a direct `text/html`
/// child get flattened to text. Falls back to [`NO_TEXT_CONTENT`].
pub fn extract_body(payload: &MessagePayload) -> String {
    extract_at(payload, 0)
}

fn extract_at(part: &MessagePayload, depth: usize) -> String {
    if let Some(data) = part.body_data() {
        return decode(data);
    }

    if depth >= MAX_DEPTH {
        tracing::debug!(depth, "Multipart nesting too deep, skipping subtree");
        return NO_TEXT_CONTENT.to_string();
    }

    for child in &part.parts {
        let mime = child.mime_type();

        if mime == "text/plain" {
            if let Some(data) = child.body_data() {
                return decode(data);
            }
        }

        if mime.starts_with("multipart/") {
            let body = extract_at(child, depth + 1);
            if !body.is_empty() {
                return body;
            }
        }
    }

    first_html_child(part).unwrap_or_else(|| NO_TEXT_CONTENT.to_string())
}

fn first_html_child(part: &MessagePayload) -> Option<String> {
    part.parts
        .iter()
        .filter(|child| child.mime_type() == "text/html")
        .find_map(|child| child.body_data())
        .map(|data| html_to_text(&decode(data)))
}

fn decode(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

/// Drops markup tags and collapses whitespace. Entities are left alone.
pub fn html_to_text(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_data_wins_over_children() {
        let mut payload = MessagePayload::leaf("text/plain", b"inline body");
        payload.parts = vec![MessagePayload::leaf("text/plain", b"child body")];
        assert_eq!(extract_body(&payload), "inline body");
    }

    #[test]
    fn test_plain_child_preferred_over_earlier_html() {
        let payload = MessagePayload::multipart(
            "multipart/alternative",
            vec![
                MessagePayload::leaf("text/html", b"<p>html version</p>"),
                MessagePayload::leaf("text/plain", b"plain version"),
            ],
        );
        assert_eq!(extract_body(&payload), "plain version");
    }

    #[test]
    fn test_nested_multipart_is_searched() {
        let payload = MessagePayload::multipart(
            "multipart/mixed",
            vec![
                MessagePayload::multipart(
                    "multipart/alternative",
                    vec![
                        MessagePayload::leaf("text/plain", b"deep plain"),
                        MessagePayload::leaf("text/html", b"<b>deep html</b>"),
                    ],
                ),
                MessagePayload::leaf("application/pdf", b"%PDF-1.4"),
            ],
        );
        assert_eq!(extract_body(&payload), "deep plain");
    }

    #[test]
    fn test_html_only_is_flattened() {
        let payload = MessagePayload::multipart(
            "multipart/alternative",
            vec![MessagePayload::leaf("text/html", b"<p>Hi <b>there</b></p>")],
        );
        assert_eq!(extract_body(&payload), "Hi there");
    }

    #[test]
    fn test_html_whitespace_is_collapsed() {
        let html = "<div>\n  Line one\n\n\t<br/>Line   two  </div>";
        assert_eq!(html_to_text(html), "Line one Line two");
    }

    #[test]
    fn test_empty_payload_yields_placeholder() {
        assert_eq!(extract_body(&MessagePayload::default()), NO_TEXT_CONTENT);

        let empty_parts = MessagePayload::multipart(
            "multipart/mixed",
            vec![
                MessagePayload::leaf("text/plain", b""),
                MessagePayload::multipart("multipart/alternative", vec![]),
            ],
        );
        assert_eq!(extract_body(&empty_parts), NO_TEXT_CONTENT);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let payload = MessagePayload::leaf("text/plain", &[b'o', b'k', 0xff, b'!']);
        assert_eq!(extract_body(&payload), "ok\u{FFFD}!");
    }

    #[test]
    fn test_attachment_parts_are_ignored() {
        let payload = MessagePayload::multipart(
            "multipart/mixed",
            vec![MessagePayload::leaf("image/png", b"\x89PNG")],
        );
        assert_eq!(extract_body(&payload), NO_TEXT_CONTENT);
    }

    #[test]
    fn test_nested_html_found_through_multipart_child() {
        let payload = MessagePayload::multipart(
            "multipart/mixed",
            vec![
                MessagePayload::multipart(
                    "multipart/related",
                    vec![
                        MessagePayload::leaf("text/html", b"<p>nested <i>html</i></p>"),
                        MessagePayload::leaf("image/png", b"\x89PNG"),
                    ],
                ),
                MessagePayload::leaf("text/html", b"<p>outer</p>"),
            ],
        );
        assert_eq!(extract_body(&payload), "nested html");
    }

    #[test]
    fn test_plain_sibling_before_multipart_wins() {
        let payload = MessagePayload::multipart(
            "multipart/mixed",
            vec![
                MessagePayload::leaf("text/plain", b"top level"),
                MessagePayload::multipart(
                    "multipart/alternative",
                    vec![MessagePayload::leaf("text/plain", b"nested")],
                ),
            ],
        );
        assert_eq!(extract_body(&payload), "top level");
    }

    #[test]
    fn test_excessive_nesting_is_cut_off() {
        let mut payload = MessagePayload::leaf("text/plain", b"too deep");
        for _ in 0..(MAX_DEPTH + 2) {
            payload = MessagePayload::multipart("multipart/mixed", vec![payload]);
        }
        assert_eq!(extract_body(&payload), NO_TEXT_CONTENT);
    }
}
