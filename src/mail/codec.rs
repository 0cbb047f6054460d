//! Header/body codec — recovers display text from an arbitrarily
//! nested, base64url-encoded body tree and normalizes headers.

use base64::Engine as _;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};

use crate::mail::types::{BodyNode, Header};

/// Look up a header by name, case-insensitive, first match wins.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Extract the bare address from a `From` header value.
///
/// `"Jane Doe <jane@x.com>"` yields `jane@x.com`; anything without
/// angle brackets passes through trimmed. The result is display text,
/// not a validated address.
pub fn extract_sender(from_header: &str) -> String {
    if let Some(start) = from_header.find('<')
        && let Some(len) = from_header[start + 1..].find('>')
    {
        return from_header[start + 1..start + 1 + len].to_string();
    }
    from_header.trim().to_string()
}

/// Extract a best-effort plain-text body from a body tree.
///
/// Depth-first, left-to-right:
/// 1. a node carrying inline data is decoded and returned outright;
/// 2. otherwise the direct children are scanned for the first
///    `text/plain` or `text/html` part carrying data — HTML gets its
///    tags stripped and whitespace collapsed;
/// 3. otherwise recurse into each child in order, first non-empty
///    result wins;
/// 4. exhausted tree yields an empty string and the caller falls back
///    to the provider snippet.
///
/// Scanning siblings before recursing keeps a shallow text part from
/// losing to a deeply nested one earlier in the tree.
pub fn extract_body(node: &BodyNode) -> String {
    if let Some(data) = inline_data(node) {
        return decode_base64url(data).unwrap_or_default();
    }

    for part in &node.parts {
        if part.mime_type == "text/plain" || part.mime_type == "text/html" {
            if let Some(data) = inline_data(part) {
                let content = decode_base64url(data).unwrap_or_default();
                if part.mime_type == "text/html" {
                    return strip_html(&content);
                }
                return content;
            }
        }
    }

    for part in &node.parts {
        if !part.parts.is_empty() {
            let nested = extract_body(part);
            if !nested.is_empty() {
                return nested;
            }
        }
    }

    String::new()
}

/// Strip HTML tag markup (permissive `<...>` removal), then collapse
/// consecutive whitespace into single spaces and trim.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            // Tags separate words, so they become a space.
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve the message timestamp: RFC 2822 `Date` header first, then
/// the provider's `internalDate` (epoch millis), then the epoch.
pub fn message_date(headers: &[Header], internal_date: Option<&str>) -> DateTime<Utc> {
    if let Some(raw) = header_value(headers, "Date")
        && let Ok(parsed) = DateTime::parse_from_rfc2822(raw.trim())
    {
        return parsed.with_timezone(&Utc);
    }

    internal_date
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

fn inline_data(node: &BodyNode) -> Option<&str> {
    node.body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .filter(|d| !d.is_empty())
}

/// Decode base64url content to UTF-8 text. Gmail pads its output, but
/// some proxies strip the padding, so both forms are accepted.
fn decode_base64url(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Body part is not valid UTF-8: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::BodyData;

    fn encode(text: &str) -> String {
        URL_SAFE.encode(text.as_bytes())
    }

    fn leaf(mime_type: &str, text: &str) -> BodyNode {
        BodyNode {
            mime_type: mime_type.to_string(),
            body: Some(BodyData {
                data: Some(encode(text)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn container(mime_type: &str, parts: Vec<BodyNode>) -> BodyNode {
        BodyNode {
            mime_type: mime_type.to_string(),
            parts,
            ..Default::default()
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs
            .iter()
            .map(|(name, value)| Header {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect()
    }

    // ── extract_body ────────────────────────────────────────────────

    #[test]
    fn single_part_returns_exact_decoded_text() {
        let node = leaf("text/plain", "Hello, world!\nSecond line.");
        assert_eq!(extract_body(&node), "Hello, world!\nSecond line.");
    }

    #[test]
    fn single_part_unpadded_base64url_decodes() {
        let mut node = leaf("text/plain", "hi");
        let unpadded = node
            .body
            .as_ref()
            .unwrap()
            .data
            .as_ref()
            .unwrap()
            .trim_end_matches('=')
            .to_string();
        node.body.as_mut().unwrap().data = Some(unpadded);
        assert_eq!(extract_body(&node), "hi");
    }

    #[test]
    fn multipart_prefers_first_text_part() {
        let node = container(
            "multipart/alternative",
            vec![
                leaf("text/plain", "plain body"),
                leaf("text/html", "<p>html body</p>"),
            ],
        );
        assert_eq!(extract_body(&node), "plain body");
    }

    #[test]
    fn html_part_is_stripped_and_collapsed() {
        let node = container(
            "multipart/alternative",
            vec![leaf(
                "text/html",
                "<div><b>Hello</b>   <i>there</i></div>\n\n<p>bye</p>",
            )],
        );
        let body = extract_body(&node);
        assert_eq!(body, "Hello there bye");
        assert!(!body.contains('<') && !body.contains('>'));
        assert!(!body.contains("  "));
    }

    #[test]
    fn shallow_text_wins_over_earlier_nested_sibling() {
        // A container sibling appearing first must not shadow a text
        // part at the same level.
        let node = container(
            "multipart/mixed",
            vec![
                container(
                    "multipart/related",
                    vec![leaf("text/plain", "nested text")],
                ),
                leaf("text/plain", "shallow text"),
            ],
        );
        assert_eq!(extract_body(&node), "shallow text");
    }

    #[test]
    fn grandchild_text_found_by_recursion() {
        let node = container(
            "multipart/mixed",
            vec![
                leaf("image/png", "not-text"),
                container(
                    "multipart/alternative",
                    vec![container(
                        "multipart/related",
                        vec![leaf("text/plain", "deep body")],
                    )],
                ),
            ],
        );
        assert_eq!(extract_body(&node), "deep body");
    }

    #[test]
    fn exhausted_tree_yields_empty_string() {
        let node = container(
            "multipart/mixed",
            vec![leaf("image/png", "img"), BodyNode::default()],
        );
        // image/png is skipped at the text scan and has no children.
        assert_eq!(
            extract_body(&container("multipart/mixed", vec![BodyNode::default()])),
            ""
        );
        assert_eq!(extract_body(&node), "");
    }

    #[test]
    fn non_text_part_with_data_ignored_at_child_scan() {
        let node = container(
            "multipart/mixed",
            vec![
                leaf("application/pdf", "pdf bytes"),
                leaf("text/plain", "the text"),
            ],
        );
        assert_eq!(extract_body(&node), "the text");
    }

    #[test]
    fn invalid_base64_yields_empty() {
        let node = BodyNode {
            mime_type: "text/plain".to_string(),
            body: Some(BodyData {
                data: Some("!!!not-base64!!!".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(extract_body(&node), "");
    }

    // ── strip_html ──────────────────────────────────────────────────

    #[test]
    fn strip_html_removes_tags_with_attributes() {
        assert_eq!(
            strip_html(r#"<a href="https://example.com">Link</a> text"#),
            "Link text"
        );
    }

    #[test]
    fn strip_html_tags_act_as_separators() {
        assert_eq!(strip_html("Hello<br>World"), "Hello World");
    }

    #[test]
    fn strip_html_plain_text_passthrough() {
        assert_eq!(strip_html("No markup here"), "No markup here");
    }

    #[test]
    fn strip_html_empty() {
        assert_eq!(strip_html(""), "");
    }

    // ── extract_sender ──────────────────────────────────────────────

    #[test]
    fn sender_from_display_name_form() {
        assert_eq!(extract_sender("Jane Doe <jane@x.com>"), "jane@x.com");
    }

    #[test]
    fn sender_bare_address_passthrough() {
        assert_eq!(extract_sender("jane@x.com"), "jane@x.com");
    }

    #[test]
    fn sender_bare_address_trimmed() {
        assert_eq!(extract_sender("  jane@x.com  "), "jane@x.com");
    }

    #[test]
    fn sender_malformed_passes_through_verbatim() {
        // Interior of the brackets is not validated.
        assert_eq!(extract_sender("X <not an address>"), "not an address");
    }

    #[test]
    fn sender_unclosed_bracket_falls_back_to_trim() {
        assert_eq!(extract_sender("Jane <jane@x.com"), "Jane <jane@x.com");
    }

    // ── header_value ────────────────────────────────────────────────

    #[test]
    fn header_lookup_case_insensitive_first_match() {
        let hs = headers(&[
            ("subject", "first"),
            ("Subject", "second"),
            ("From", "a@b.c"),
        ]);
        assert_eq!(header_value(&hs, "Subject"), Some("first"));
        assert_eq!(header_value(&hs, "FROM"), Some("a@b.c"));
        assert_eq!(header_value(&hs, "Date"), None);
    }

    // ── message_date ────────────────────────────────────────────────

    #[test]
    fn date_header_parsed_as_rfc2822() {
        let hs = headers(&[("Date", "Tue, 1 Jul 2003 10:52:37 +0200")]);
        let date = message_date(&hs, None);
        assert_eq!(date.timestamp(), 1_057_049_557);
    }

    #[test]
    fn internal_date_fallback_in_millis() {
        let date = message_date(&[], Some("1700000000000"));
        assert_eq!(date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn unparseable_dates_fall_back_to_epoch() {
        let hs = headers(&[("Date", "not a date")]);
        let date = message_date(&hs, Some("also not"));
        assert_eq!(date.timestamp(), 0);
    }
}
