//! Serde deserializer for XML property lists.
//!
//! A document is scanned tag by tag and bound straight into the destination
//! type: struct fields are matched against `<key>` names, unknown keys are
//! skipped with their whole value, and scalar bodies are converted at the
//! width of the destination (`<real>` into `f32` is parsed as 32-bit).
//! No intermediate tree is built unless the destination asks for one
//! ([`Value`]).
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[allow(non_snake_case)]
//! #[derive(Debug, Deserialize)]
//! struct Exclusions {
//!     #[serde(alias = "excludes")]
//!     Excludes: Vec<String>,
//!     BucketUUID: String,
//! }
//!
//! let plist = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <plist version="1.0">
//! <dict>
//!     <key>excludes</key>
//!     <array><string>/.vol</string><string>/tmp</string></array>
//!     <key>BucketUUID</key>
//!     <string>C218A47D-DAFB-4476-9C67-597E556D7D8A</string>
//! </dict>
//! </plist>"#;
//!
//! let ex: Exclusions = serde_xmlplist::from_str(plist).unwrap();
//! assert_eq!(ex.Excludes, ["/.vol", "/tmp"]);
//! assert_eq!(ex.BucketUUID, "C218A47D-DAFB-4476-9C67-597E556D7D8A");
//! ```

pub mod budget;
mod date;
mod de;
mod document;
mod error;
mod location;
#[macro_use]
mod macros;
mod options;
mod parse_scalars;
mod scanner;
mod skip;
mod snippet;
mod value;

pub use budget::{Budget, BudgetBreach, BudgetReport};
pub use date::Date;
pub use de::Deserializer;
pub use document::{
    from_slice, from_slice_into, from_slice_with_options, from_str, from_str_with_options, with_deserializer_from_slice,
    with_deserializer_from_slice_with_options, with_deserializer_from_str,
};
pub use error::Error;
pub use location::Location;
pub use options::Options;
pub use value::{Dictionary, Value};
