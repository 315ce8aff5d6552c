use crate::error::ParseError;

use super::judgment::ReasoningJudgment;

/// Which route produced a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRoute {
    /// The whole response was the JSON object.
    Strict,
    /// The object was dug out of prose or a code fence.
    Lenient,
}

/// Strict parse first, then the lenient fallbacks. Never touches the network.
pub fn parse_judgment(text: &str) -> Result<(ReasoningJudgment, ParseRoute), ParseError> {
    let strict_err = match parse_strict(text) {
        Ok(judgment) => return Ok((judgment, ParseRoute::Strict)),
        Err(e) => e,
    };

    let mut candidates = Vec::new();
    candidates.extend(fenced_blocks(text));
    let mut spans = json_object_spans(text);
    spans.sort_by_key(|s| std::cmp::Reverse(s.len()));
    candidates.extend(spans);

    if candidates.is_empty() {
        return Err(match strict_err {
            ParseError::Invalid(_) => ParseError::NoJson,
            other => other,
        });
    }

    let mut last = strict_err;
    for candidate in candidates {
        match parse_strict(candidate) {
            Ok(judgment) => return Ok((judgment, ParseRoute::Lenient)),
            Err(e) => last = e,
        }
    }
    Err(last)
}

fn parse_strict(text: &str) -> Result<ReasoningJudgment, ParseError> {
    let judgment: ReasoningJudgment = serde_json::from_str(text.trim())?;
    judgment.check_ranges().map_err(ParseError::Schema)?;
    Ok(judgment)
}

/// Bodies of ```json fences, then of bare ``` fences.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for opener in ["```json", "```"] {
        let mut rest = text;
        while let Some(start) = rest.find(opener) {
            let body = &rest[start + opener.len()..];
            let Some(end) = body.find("```") else { break };
            let block = body[..end].trim();
            if block.starts_with('{') && !out.contains(&block) {
                out.push(block);
            }
            rest = &body[end + 3..];
        }
    }
    out
}

/// Balanced `{ ... }` substrings, skipping braces inside JSON strings.
/// Objects nested inside a closed span are candidates too, so a judgment
/// wrapped in a broken outer object is still found. An opener that never
/// closes is skipped so a later object is still found.
pub fn json_object_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        match matching_close(bytes, start) {
            Some(end) => {
                spans.push(&text[start..=end]);
                for inner in nested_openers(bytes, start, end) {
                    if let Some(close) = matching_close(bytes, inner) {
                        spans.push(&text[inner..=close]);
                    }
                }
                pos = end + 1;
            }
            None => pos = start + 1,
        }
    }
    spans
}

// Openers strictly inside `start..end` that are not part of a string.
fn nested_openers(bytes: &[u8], start: usize, end: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().take(end).skip(start + 1) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => out.push(i),
            _ => {}
        }
    }
    out
}

fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
