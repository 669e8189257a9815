use regex::Regex;
use std::sync::LazyLock;

/// Markers that open quoted or forwarded history. Kept in one alternation
/// so the earliest marker in the body wins, whichever kind it is.
const REPLY_MARKERS: &[&str] = &[
    // "On Thu, Jan 15, 2026"
    r"^On [A-Z][a-z]{2}, [A-Z][a-z]{2} \d{1,2}, \d{4}",
    // "On 1/15/2026"
    r"^On \d{1,2}/\d{1,2}/\d{2,4}",
    // "2024-01-01 Person <email>"
    r"^\d{4}-\d{2}-\d{2} .+ <.+>",
    r"^-+\s*Original Message\s*-+",
    // Outlook separator
    r"^_{5,}",
    r"^\*From:\*",
    r"^>",
];

static REPLY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?m){}", REPLY_MARKERS.join("|"))).unwrap());

/// Removes quoted reply content from a plain-text body.
///
/// The body is cut at the first reply marker. If there is none, or the cut
/// leaves nothing, lines starting with `>` are dropped instead. A body that
/// is entirely quoted comes back empty.
pub fn strip_quotes(body: &str) -> String {
    if let Some(found) = REPLY_MARKER.find(body) {
        let truncated = body[..found.start()].trim_end();
        if !truncated.is_empty() {
            return truncated.to_string();
        }
    }

    body.split('\n')
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
