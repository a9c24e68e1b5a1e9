use crate::budget::{Budget, BudgetReport};

/// Decoder configuration options.
///
/// Use this to configure the resource [`Budget`], numeric coercion and how
/// errors are rendered.
///
/// Example: parse a small `Config` using custom `Options`.
///
/// ```rust
/// use serde::Deserialize;
///
/// use serde_xmlplist::{from_str_with_options, Options};
///
/// #[derive(Deserialize)]
/// struct Config {
///     name: String,
///     enabled: bool,
///     ratio: f64,
/// }
///
/// let plist = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <plist version="1.0">
/// <dict>
///     <key>name</key><string>My Application</string>
///     <key>enabled</key><true/>
///     <key>ratio</key><integer>2</integer>
/// </dict>
/// </plist>"#;
///
/// let options = serde_xmlplist::options! {
///     integers_as_reals: true,
///     with_snippet: false,
/// };
///
/// let cfg: Config = from_str_with_options(plist, options).unwrap();
/// assert_eq!(cfg.name, "My Application");
/// assert_eq!(cfg.ratio, 2.0);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Optional budget enforced while scanning. `None` disables all limits.
    pub budget: Option<Budget>,
    /// Optional callback invoked with the final budget report.
    /// It is invoked both when decoding succeeds and when the budget was breached.
    pub budget_report: Option<fn(&BudgetReport)>,
    /// Accept `<integer>` text where a floating point destination is declared.
    /// Default: true.
    pub integers_as_reals: bool,
    /// If true (default), public entry points wrap returned errors with a
    /// rendered source snippet when the input is UTF-8 and a location is known.
    pub with_snippet: bool,
    /// Horizontal crop radius (in character columns) when rendering snippet
    /// diagnostics. If set to `0`, snippet wrapping is disabled.
    pub crop_radius: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            budget_report: None,
            integers_as_reals: true,
            with_snippet: true,
            crop_radius: 64,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("budget", &self.budget)
            .field("budget_report", &if self.budget_report.is_some() { "set" } else { "none" })
            .field("integers_as_reals", &self.integers_as_reals)
            .field("with_snippet", &self.with_snippet)
            .field("crop_radius", &self.crop_radius)
            .finish()
    }
}

/// Small immutable runtime configuration that the deserializer needs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cfg {
    /// If true, `<integer>` bodies are parsed into `f32`/`f64` destinations.
    pub(crate) integers_as_reals: bool,
}

impl Cfg {
    #[inline]
    pub(crate) fn from_options(options: &Options) -> Self {
        Self {
            integers_as_reals: options.integers_as_reals,
        }
    }
}
