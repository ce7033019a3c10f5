//! Single-pass tokenizer for placeholder syntaxes.
//!
//! Recognized shapes, all resolved in one left-to-right scan:
//!
//! ```text
//! {{inner}}   double brace
//! {inner}     single brace
//! [inner]     bracket
//! ```
//!
//! A candidate only becomes a token when the caller's resolver accepts its
//! inner text for that syntax; everything else stays literal text. Output is
//! never rescanned, so substituted values cannot be re-expanded.

use std::ops::Range;

/// Longest inner text considered for a token. Bounds the look-ahead so the
/// scan stays linear on pathological input.
pub const MAX_TOKEN_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    DoubleBrace,
    SingleBrace,
    Bracket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a, T> {
    Text(&'a str),
    Token { syntax: Syntax, raw: &'a str, span: Range<usize>, value: T },
}

/// Split `body` into literal text and resolved tokens.
pub fn tokenize<'a, T, F>(body: &'a str, mut resolve: F) -> Vec<Segment<'a, T>>
where
    F: FnMut(Syntax, &'a str) -> Option<T>,
{
    let bytes = body.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' || bytes[i] == b'[' {
            if let Some((syntax, inner, end)) = candidate_at(body, i) {
                if let Some(value) = resolve(syntax, inner) {
                    if text_start < i {
                        segments.push(Segment::Text(&body[text_start..i]));
                    }
                    segments.push(Segment::Token {
                        syntax,
                        raw: &body[i..end],
                        span: i..end,
                        value,
                    });
                    i = end;
                    text_start = end;
                    continue;
                }
            }
        }
        i += 1;
    }

    if text_start < bytes.len() {
        segments.push(Segment::Text(&body[text_start..]));
    }
    segments
}

/// Candidate token starting at byte `start`: (syntax, inner text, end offset).
/// `{{` is tried before `{` so the double-brace form wins when both close.
fn candidate_at(body: &str, start: usize) -> Option<(Syntax, &str, usize)> {
    let rest = &body[start..];
    if rest.starts_with("{{") {
        if let Some(found) = enclosed(body, start + 2, "}}") {
            return Some((Syntax::DoubleBrace, found.0, found.1));
        }
    }
    if rest.starts_with('{') {
        return enclosed(body, start + 1, "}").map(|(inner, end)| (Syntax::SingleBrace, inner, end));
    }
    if rest.starts_with('[') {
        return enclosed(body, start + 1, "]").map(|(inner, end)| (Syntax::Bracket, inner, end));
    }
    None
}

/// Inner text from `from` up to the first `close`, rejecting empty, overlong,
/// multi-line, or nested candidates.
fn enclosed<'a>(body: &'a str, from: usize, close: &str) -> Option<(&'a str, usize)> {
    let window_end = body.len().min(from + MAX_TOKEN_LEN + close.len());
    let window = body.get(from..window_end).or_else(|| {
        // window_end fell inside a multi-byte char; shrink to a boundary
        let mut end = window_end;
        while end > from && !body.is_char_boundary(end) {
            end -= 1;
        }
        body.get(from..end)
    })?;
    let close_at = window.find(close)?;
    let inner = &window[..close_at];
    if inner.is_empty()
        || inner.len() > MAX_TOKEN_LEN
        || inner.contains(['{', '}', '[', ']', '\n', '\r'])
    {
        return None;
    }
    Some((inner, from + close_at + close.len()))
}
