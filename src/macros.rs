//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! These macros keep call sites ergonomic while allowing the option structs to
//! grow new fields without breaking callers.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let options = serde_xmlplist::options! {
///     integers_as_reals: false,
///     crop_radius: 0,
/// };
/// assert!(!options.integers_as_reals);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let budget = serde_xmlplist::budget! {
///     max_depth: 32,
///     max_tags: 10_000,
/// };
/// assert_eq!(budget.max_depth, 32);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        budget
    }};
}
