//! Reassembly of a streamed answer into (body, sources).
//!
//! The upstream model is asked to end its reply with a "Sources:" section.
//! The split happens at the first occurrence of the marker; once the sources
//! accumulation is active, every later fragment belongs to it, including any
//! further "Sources:"-like text.

const SOURCES_MARKER: &str = "Sources:";

pub const NO_SOURCES_PLACEHOLDER: &str = "No sources provided";

/// Accumulates incremental text fragments and routes them to the body or the
/// sources buffer depending on whether the marker has been seen.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    body: String,
    sources: String,
    in_sources: bool,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one incremental fragment in arrival order. Returns the portion
    /// routed to the body, which is what live display should show.
    pub fn push<'a>(&mut self, delta: &'a str) -> &'a str {
        if self.in_sources {
            self.sources.push_str(delta);
            return "";
        }
        match delta.find(SOURCES_MARKER) {
            Some(idx) => {
                self.body.push_str(&delta[..idx]);
                self.sources.push_str(&delta[idx + SOURCES_MARKER.len()..]);
                self.in_sources = true;
                &delta[..idx]
            }
            None => {
                self.body.push_str(delta);
                delta
            }
        }
    }

    /// Finish the stream: trim both accumulations, linkify the sources, and
    /// substitute the placeholder when no sources arrived.
    pub fn finish(self) -> (String, String) {
        let body = self.body.trim().to_string();
        let sources = self.sources.trim();
        let sources = if sources.is_empty() {
            NO_SOURCES_PLACEHOLDER.to_string()
        } else {
            linkify(sources)
        };
        (body, sources)
    }
}

/// Split a complete (non-streamed) reply at the first "Sources:" occurrence.
pub fn split_sources(text: &str) -> (&str, &str) {
    match text.find(SOURCES_MARKER) {
        Some(idx) => (&text[..idx], &text[idx + SOURCES_MARKER.len()..]),
        None => (text, ""),
    }
}

/// Convert bare URLs in a sources section to markdown hyperlinks.
///
/// The link text is the sentence fragment preceding the URL (back to the
/// previous sentence boundary or list item); a URL with no preceding fragment
/// links to itself.
pub fn linkify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;

    while let Some(rel) = raw[cursor..].find("http") {
        let start = cursor + rel;
        let rest = &raw[start..];
        if !rest.starts_with("http://") && !rest.starts_with("https://") {
            out.push_str(&raw[cursor..start + 4]);
            cursor = start + 4;
            continue;
        }

        let url_end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, ')' | ']' | '>' | '"'))
            .map(|i| start + i)
            .unwrap_or(raw.len());
        let url = raw[start..url_end].trim_end_matches(['.', ',', ';']);

        let before = &raw[cursor..start];
        let fragment_start = before
            .rfind(['.', '!', '?', '\n', ';'])
            .map(|i| i + 1)
            .unwrap_or(0);
        let region = &before[fragment_start..];
        let leading_ws = region.len() - region.trim_start().len();
        out.push_str(&before[..fragment_start + leading_ws]);

        let fragment = region
            .trim()
            .trim_start_matches(['-', '*'])
            .trim()
            .trim_end_matches([':', '-'])
            .trim();
        let text = if fragment.is_empty() { url } else { fragment };

        out.push('[');
        out.push_str(text);
        out.push_str("](");
        out.push_str(url);
        out.push(')');

        cursor = start + url.len();
    }

    out.push_str(&raw[cursor..]);
    out
}
