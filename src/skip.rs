//! Discarding one complete value without binding it.

use crate::error::Error;
use crate::scanner::{Scanner, TokenKind};

/// Consume exactly one value (and everything nested in it) from `sc`.
///
/// Only opening and closing tags move the depth counter. Self-closing tokens
/// such as `<true/>` or `<dict/>` are complete values on their own. Tag names
/// are not matched against each other; the decoder that reads real values does
/// that. Every consumed token still counts against the budget.
pub(crate) fn skip_value(sc: &mut Scanner<'_>) -> Result<(), Error> {
    let mut depth = 0usize;
    loop {
        let Some(tok) = sc.next()? else {
            return Err(sc.eof("while skipping a value"));
        };
        match tok.kind {
            TokenKind::Open => depth += 1,
            TokenKind::Empty => {}
            TokenKind::Close => {
                if depth == 0 {
                    return Err(sc.unexpected_tag(&tok, "where a value was expected"));
                }
                depth -= 1;
            }
            TokenKind::Declaration | TokenKind::Doctype => {
                return Err(sc.unexpected_tag(&tok, "inside a value"));
            }
        }
        if depth == 0 {
            return Ok(());
        }
    }
}
