use serde::Deserialize;

/// One parsed line of an SSE chat-completion stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental text from a `choices[0].delta.content` record.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
    /// Blank line, comment, keep-alive, or a record we could not parse.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Parse one line of a line-delimited completion stream.
///
/// Malformed data lines are skipped rather than failing the stream.
pub fn parse_line(line: &str) -> StreamEvent {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') {
        return StreamEvent::Skip;
    }

    let Some(data) = line.strip_prefix("data:") else {
        return StreamEvent::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return StreamEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let text = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.as_deref())
                .unwrap_or("");
            if text.is_empty() {
                StreamEvent::Skip
            } else {
                StreamEvent::Delta(text.to_string())
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unparseable stream line");
            StreamEvent::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"hello"}}]}"#;
        assert_eq!(parse_line(line), StreamEvent::Delta("hello".into()));
    }

    #[test]
    fn parses_done_marker() {
        assert_eq!(parse_line("data: [DONE]"), StreamEvent::Done);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_line(""), StreamEvent::Skip);
        assert_eq!(parse_line(": keep-alive"), StreamEvent::Skip);
    }

    #[test]
    fn skips_malformed_data_line() {
        assert_eq!(parse_line("data: {not json"), StreamEvent::Skip);
    }

    #[test]
    fn skips_delta_without_content() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_line(line), StreamEvent::Skip);
    }

    #[test]
    fn handles_crlf_terminated_lines() {
        assert_eq!(parse_line("data: [DONE]\r"), StreamEvent::Done);
    }
}
