//! Streaming budget checker for the tag scanner.
//!
//! Every token the scanner consumes is observed here, including tokens that are
//! discarded while skipping unknown keys, so a hostile document cannot hide its
//! size inside ignored content.

use crate::scanner::TokenKind;

/// Budgets for a single decode call.
///
/// The defaults are intentionally permissive for typical configuration files
/// while stopping obvious resource-amplifying inputs. Nesting depth matters most:
/// the value decoder recurses once per nested tag.
///
/// Example: tightening the depth limit for untrusted input.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Config {
///     name: String,
///     retries: i32,
/// }
///
/// let plist = r#"<plist version="1.0"><dict>
///     <key>name</key><string>My Application</string>
///     <key>retries</key><integer>5</integer>
/// </dict></plist>"#;
///
/// let options = serde_xmlplist::options! {
///     budget: Some(serde_xmlplist::budget! { max_depth: 16 }),
/// };
///
/// let cfg: Config = serde_xmlplist::from_str_with_options(plist, options).unwrap();
/// assert_eq!(cfg.retries, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    /// Maximum number of tags consumed (declarations, opening, closing and
    /// self-closing tags all count).
    ///
    /// Default: 1,000,000
    pub max_tags: usize,
    /// Maximum nesting depth of opening tags, the `<plist>` wrapper included.
    ///
    /// Default: 256
    pub max_depth: usize,
    /// Maximum total bytes of character data between tags.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_text_bytes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_tags: 1_000_000,
            max_depth: 256,                   // protects the stack
            max_text_bytes: 64 * 1024 * 1024, // 64 MiB of text
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    /// The number of tags exceeded [`Budget::max_tags`].
    Tags {
        /// Total tags observed at the moment of the breach.
        tags: usize,
    },
    /// The nesting depth exceeded [`Budget::max_depth`].
    Depth {
        /// Depth reached when the breach occurred.
        depth: usize,
    },
    /// The cumulative size of character data exceeded [`Budget::max_text_bytes`].
    TextBytes {
        /// Sum of text bytes seen so far.
        text_bytes: usize,
    },
}

/// Summary of the scan (even if no breach).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded; `None` if all budgets were respected.
    pub breached: Option<BudgetBreach>,
    /// Total number of tags observed.
    pub tags: usize,
    /// Maximum nesting depth reached at any point.
    pub max_depth: usize,
    /// Sum of character data bytes, saturating on overflow.
    pub text_bytes: usize,
}

/// Stateful helper that enforces a [`Budget`] while the scanner consumes tokens.
#[derive(Debug)]
pub(crate) struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
}

impl BudgetEnforcer {
    /// Create a new enforcer for the provided `budget`.
    pub(crate) fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
        }
    }

    /// Observe one consumed token and the character data that preceded it.
    ///
    /// Returns `Err(BudgetBreach)` as soon as a limit is exceeded. The breach is
    /// also recorded in the report.
    pub(crate) fn observe(&mut self, kind: TokenKind, text_len: usize) -> Result<(), BudgetBreach> {
        let res = self.check(kind, text_len);
        if let Err(breach) = &res {
            self.report.breached = Some(breach.clone());
        }
        res
    }

    fn check(&mut self, kind: TokenKind, text_len: usize) -> Result<(), BudgetBreach> {
        self.report.text_bytes = self.report.text_bytes.saturating_add(text_len);
        if self.report.text_bytes > self.budget.max_text_bytes {
            return Err(BudgetBreach::TextBytes {
                text_bytes: self.report.text_bytes,
            });
        }

        self.report.tags += 1;
        if self.report.tags > self.budget.max_tags {
            return Err(BudgetBreach::Tags {
                tags: self.report.tags,
            });
        }

        match kind {
            TokenKind::Open => {
                self.depth = self.depth.saturating_add(1);
                if self.depth > self.report.max_depth {
                    self.report.max_depth = self.depth;
                }
                if self.depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth { depth: self.depth });
                }
            }
            // Stray closing tags are the decoder's business, not the budget's.
            TokenKind::Close => self.depth = self.depth.saturating_sub(1),
            TokenKind::Empty | TokenKind::Declaration | TokenKind::Doctype => {}
        }
        Ok(())
    }

    /// Consume the enforcer and return its final report.
    pub(crate) fn finalize(self) -> BudgetReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Budget {
        Budget {
            max_tags: 6,
            max_depth: 2,
            max_text_bytes: 10,
        }
    }

    #[test]
    fn counts_depth_and_tags() {
        let mut enforcer = BudgetEnforcer::new(Budget::default());
        for kind in [
            TokenKind::Declaration,
            TokenKind::Open,
            TokenKind::Open,
            TokenKind::Empty,
            TokenKind::Close,
            TokenKind::Close,
        ] {
            enforcer.observe(kind, 1).expect("within budget");
        }
        let report = enforcer.finalize();
        assert_eq!(report.tags, 6);
        assert_eq!(report.max_depth, 2);
        assert_eq!(report.text_bytes, 6);
        assert!(report.breached.is_none());
    }

    #[test]
    fn depth_breach_is_reported() {
        let mut enforcer = BudgetEnforcer::new(small());
        enforcer.observe(TokenKind::Open, 0).unwrap();
        enforcer.observe(TokenKind::Open, 0).unwrap();
        let err = enforcer.observe(TokenKind::Open, 0).unwrap_err();
        assert_eq!(err, BudgetBreach::Depth { depth: 3 });
        assert_eq!(enforcer.finalize().breached, Some(err));
    }

    #[test]
    fn self_closing_tokens_do_not_nest() {
        let mut enforcer = BudgetEnforcer::new(small());
        enforcer.observe(TokenKind::Open, 0).unwrap();
        enforcer.observe(TokenKind::Empty, 0).unwrap();
        enforcer.observe(TokenKind::Empty, 0).unwrap();
        enforcer.observe(TokenKind::Open, 0).unwrap();
        assert_eq!(enforcer.finalize().max_depth, 2);
    }

    #[test]
    fn tag_and_text_limits() {
        let mut enforcer = BudgetEnforcer::new(small());
        for _ in 0..6 {
            enforcer.observe(TokenKind::Empty, 0).unwrap();
        }
        assert_eq!(
            enforcer.observe(TokenKind::Empty, 0),
            Err(BudgetBreach::Tags { tags: 7 })
        );

        let mut enforcer = BudgetEnforcer::new(small());
        enforcer.observe(TokenKind::Empty, 10).unwrap();
        assert_eq!(
            enforcer.observe(TokenKind::Empty, 1),
            Err(BudgetBreach::TextBytes { text_bytes: 11 })
        );
    }
}
