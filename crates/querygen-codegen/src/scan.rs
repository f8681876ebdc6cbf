//! Placeholder token scanner.

use crate::template::is_token_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    Text(&'a str),
    Token {
        name: &'a str,
        facet: Option<&'a str>,
        offset: usize,
    },
}

/// Split `src` into literal text and `{{NAME}}` / `{{NAME:facet}}` tokens.
///
/// Every `{{` opens a token; the error string describes the first malformed one.
pub(crate) fn scan(src: &str) -> Result<Vec<Piece<'_>>, String> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(rel) = src[pos..].find("{{") {
        let open = pos + rel;
        if open > pos {
            out.push(Piece::Text(&src[pos..open]));
        }
        let body_start = open + 2;
        let close = src[body_start..]
            .find("}}")
            .map(|r| body_start + r)
            .ok_or_else(|| format!("unterminated token at byte {open}"))?;
        let body = &src[body_start..close];
        let (name, facet) = match body.split_once(':') {
            Some((n, f)) => (n, Some(f)),
            None => (body, None),
        };
        if !is_token_name(name) {
            return Err(format!("malformed token '{{{{{body}}}}}' at byte {open}"));
        }
        if let Some(f) = facet {
            if f.is_empty() || !f.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(format!("malformed facet in '{{{{{body}}}}}' at byte {open}"));
            }
        }
        out.push(Piece::Token {
            name,
            facet,
            offset: open,
        });
        pos = close + 2;
    }
    if pos < src.len() {
        out.push(Piece::Text(&src[pos..]));
    }
    Ok(out)
}
