//! Tag scanner over raw plist bytes.
//!
//! The scanner never builds a tree. It hands out one `<...>` token at a time
//! together with the character data that preceded it; scalar tags use that
//! preceding text as their body. No entity decoding is performed anywhere.

use crate::budget::{Budget, BudgetEnforcer, BudgetReport};
use crate::error::Error;
use crate::location::Location;

/// Split `data` at the next `<...>` token.
///
/// Returns `(content, token, rest)`: the bytes before the token, the token
/// including its delimiters, and everything after it. When no complete token
/// remains the whole input is returned as `content` and `token` is empty.
pub(crate) fn split_next_tag(data: &[u8]) -> (&[u8], &[u8], &[u8]) {
    let Some(start) = data.iter().position(|&b| b == b'<') else {
        return (data, &[], &[]);
    };
    let Some(len) = data[start..].iter().position(|&b| b == b'>') else {
        return (data, &[], &[]);
    };
    let end = start + len + 1;
    (&data[..start], &data[start..end], &data[end..])
}

/// Structural class of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// `<?xml ...?>` and other processing instructions.
    Declaration,
    /// `<!DOCTYPE ...>`.
    Doctype,
    /// `<name ...>`, opens a nesting level.
    Open,
    /// `</name>`, closes a nesting level.
    Close,
    /// `<name/>`, a complete zero-depth unit (`<true/>`, `<false/>`, `<dict/>`...).
    Empty,
}

/// One scanned tag plus the character data that preceded it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Token<'de> {
    pub(crate) kind: TokenKind,
    /// Element name with attributes stripped; empty for declarations.
    pub(crate) name: &'de str,
    /// The token as written, delimiters included.
    pub(crate) raw: &'de [u8],
    /// Byte offset of the token's `<`.
    pub(crate) offset: usize,
    /// Character data between the previous token and this one.
    pub(crate) text: &'de [u8],
    /// Byte offset of `text`.
    pub(crate) text_offset: usize,
}

impl Token<'_> {
    #[inline]
    pub(crate) fn is_open(&self, name: &str) -> bool {
        self.kind == TokenKind::Open && self.name == name
    }

    #[inline]
    pub(crate) fn is_close(&self, name: &str) -> bool {
        self.kind == TokenKind::Close && self.name == name
    }

    /// Opening or self-closing `name`, i.e. a token that can start a value of that kind.
    #[inline]
    pub(crate) fn starts(&self, name: &str) -> bool {
        matches!(self.kind, TokenKind::Open | TokenKind::Empty) && self.name == name
    }

    /// The token as written, for error messages.
    pub(crate) fn display(&self) -> String {
        String::from_utf8_lossy(self.raw).into_owned()
    }
}

/// Classify a complete token and extract its element name.
fn classify(raw: &[u8]) -> (TokenKind, &[u8]) {
    let inner = &raw[1..raw.len() - 1];
    if inner.starts_with(b"?") {
        (TokenKind::Declaration, &[])
    } else if inner.starts_with(b"!DOCTYPE") {
        (TokenKind::Doctype, &[])
    } else if let Some(rest) = inner.strip_prefix(b"/") {
        (TokenKind::Close, element_name(rest))
    } else if let Some(rest) = inner.strip_suffix(b"/") {
        (TokenKind::Empty, element_name(rest))
    } else {
        (TokenKind::Open, element_name(inner))
    }
}

/// Element name: everything up to the first whitespace (attributes are ignored).
fn element_name(tag: &[u8]) -> &[u8] {
    let end = tag
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(tag.len());
    &tag[..end]
}

/// Token source with one token of lookahead and budget enforcement.
pub(crate) struct Scanner<'de> {
    input: &'de [u8],
    pos: usize,
    peeked: Option<Token<'de>>,
    enforcer: Option<BudgetEnforcer>,
}

impl<'de> Scanner<'de> {
    pub(crate) fn new(input: &'de [u8], budget: Option<Budget>) -> Self {
        Self {
            input,
            pos: 0,
            peeked: None,
            enforcer: budget.map(BudgetEnforcer::new),
        }
    }

    /// Peek at the next token without consuming it.
    ///
    /// Returns:
    /// - `Ok(Some(Token))` for a complete tag,
    /// - `Ok(None)` when only character data remains,
    /// - `Err(Error)` for an unterminated tag or a non-UTF-8 tag name.
    pub(crate) fn peek(&mut self) -> Result<Option<Token<'de>>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.scan_at(self.pos)?;
        }
        Ok(self.peeked)
    }

    /// Consume the next token. Budget limits are checked here, never on peek.
    pub(crate) fn next(&mut self) -> Result<Option<Token<'de>>, Error> {
        let tok = match self.peeked.take() {
            Some(tok) => tok,
            None => match self.scan_at(self.pos)? {
                Some(tok) => tok,
                None => return Ok(None),
            },
        };
        self.pos = tok.offset + tok.raw.len();

        let observed = match self.enforcer.as_mut() {
            Some(enforcer) => enforcer.observe(tok.kind, tok.text.len()),
            None => Ok(()),
        };
        if let Err(breach) = observed {
            return Err(Error::budget(breach).with_location(self.location_at(tok.offset)));
        }
        Ok(Some(tok))
    }

    fn scan_at(&self, pos: usize) -> Result<Option<Token<'de>>, Error> {
        let input: &'de [u8] = self.input;
        let data = &input[pos..];
        let (text, raw, _) = split_next_tag(data);
        if raw.is_empty() {
            if let Some(open) = data.iter().position(|&b| b == b'<') {
                return Err(Error::unterminated_tag().with_location(self.location_at(pos + open)));
            }
            return Ok(None);
        }

        let offset = pos + text.len();
        let (kind, name) = classify(raw);
        let name = std::str::from_utf8(name).map_err(|_| {
            Error::unexpected_tag(&String::from_utf8_lossy(raw), "(tag name is not UTF-8)")
                .with_location(self.location_at(offset))
        })?;
        Ok(Some(Token {
            kind,
            name,
            raw,
            offset,
            text,
            text_offset: pos,
        }))
    }

    /// Read the body of the scalar opened by `open` (already consumed) up to and
    /// including its closing tag.
    ///
    /// Returns the body as UTF-8 text and its byte offset. A self-closing `open`
    /// has an empty body.
    pub(crate) fn scalar_text(&mut self, open: &Token<'de>) -> Result<(&'de str, usize), Error> {
        if open.kind == TokenKind::Empty {
            return Ok(("", open.offset));
        }
        let (body, at) = match self.next()? {
            Some(tok) if tok.is_close(open.name) => (tok.text, tok.text_offset),
            Some(tok) => {
                let context = format!("where </{}> was expected", open.name);
                return Err(self.unexpected_tag(&tok, &context));
            }
            None => return Err(self.eof(&format!("inside <{}>", open.name))),
        };
        let text = std::str::from_utf8(body).map_err(|_| {
            Error::conversion(open.name, "UTF-8 text", &String::from_utf8_lossy(body))
                .with_location(self.location_at(at))
        })?;
        Ok((text, at))
    }

    /// Bytes not yet consumed. Only meaningful when nothing is peeked.
    pub(crate) fn rest(&self) -> &'de [u8] {
        let input: &'de [u8] = self.input;
        &input[self.pos..]
    }

    /// Byte offset of the first unconsumed byte.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Offset where the next value starts, for attaching locations to errors.
    pub(crate) fn next_offset(&mut self) -> usize {
        match self.peek() {
            Ok(Some(tok)) => tok.offset,
            _ => self.pos,
        }
    }

    pub(crate) fn location_at(&self, offset: usize) -> Location {
        Location::from_offset(self.input, offset)
    }

    /// Fill in the location of an error that does not have one yet.
    pub(crate) fn locate(&self, err: Error, offset: usize) -> Error {
        err.or_location(self.location_at(offset))
    }

    pub(crate) fn eof(&self, context: &str) -> Error {
        Error::eof(context).with_location(self.location_at(self.input.len()))
    }

    pub(crate) fn unexpected_tag(&self, tok: &Token<'_>, context: &str) -> Error {
        Error::unexpected_tag(&tok.display(), context).with_location(self.location_at(tok.offset))
    }

    /// Keys of the `<dict>` whose opening tag was just consumed, in document
    /// order, read ahead on a budget-free copy of the cursor. Nested dicts are
    /// not descended into. Stops quietly at the first malformed token, which
    /// the real pass reports.
    pub(crate) fn dict_keys_ahead(&self) -> Vec<&'de str> {
        let mut ahead = Scanner {
            input: self.input,
            pos: self.peeked.map_or(self.pos, |tok| tok.text_offset),
            peeked: None,
            enforcer: None,
        };
        let mut keys = Vec::new();
        let mut depth = 1usize;
        while let Ok(Some(tok)) = ahead.next() {
            match tok.kind {
                TokenKind::Open | TokenKind::Empty if depth == 1 && tok.name == "key" => {
                    match ahead.scalar_text(&tok) {
                        Ok((key, _)) => keys.push(key),
                        Err(_) => break,
                    }
                }
                TokenKind::Open => depth += 1,
                TokenKind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        keys
    }

    /// Stop scanning and hand back the budget report, if a budget was set.
    pub(crate) fn finish(self) -> Option<BudgetReport> {
        self.enforcer.map(BudgetEnforcer::finalize)
    }
}
