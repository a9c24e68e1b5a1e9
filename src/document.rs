//! Document entry points: the `<plist>` envelope around exactly one value.

use serde::de::Deserialize;

use crate::de::Deserializer;
use crate::error::Error;
use crate::options::{Cfg, Options};
use crate::scanner::{Scanner, TokenKind};

/// Deserialize any `T` from a plist document in a byte slice.
///
/// Leading `<?xml ...?>` and `<!DOCTYPE ...>` tokens are skipped, the `<plist>`
/// wrapper is required (its attributes are ignored) and only whitespace may
/// follow `</plist>`.
///
/// Example:
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Bucket {
///     #[serde(rename = "BucketUUID")]
///     bucket_uuid: String,
///     #[serde(rename = "IgnoredRelativePaths")]
///     ignored: Vec<String>,
/// }
///
/// let plist = br#"<?xml version="1.0" encoding="UTF-8"?>
/// <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
/// <plist version="1.0">
/// <dict>
///     <key>BucketUUID</key><string>C218A47D-DAFB-4476-9C67-597E556D7D8A</string>
///     <key>IgnoredRelativePaths</key><array><string>/.vol</string></array>
/// </dict>
/// </plist>"#;
///
/// let bucket: Bucket = serde_xmlplist::from_slice(plist).unwrap();
/// assert_eq!(bucket.ignored, vec!["/.vol".to_string()]);
/// ```
pub fn from_slice<'de, T: Deserialize<'de>>(input: &'de [u8]) -> Result<T, Error> {
    from_slice_with_options(input, Options::default())
}

/// Deserialize any `T` from a byte slice with configurable [`Options`].
pub fn from_slice_with_options<'de, T: Deserialize<'de>>(
    input: &'de [u8],
    options: Options,
) -> Result<T, Error> {
    with_deserializer_from_slice_with_options(input, options, |de| T::deserialize(de))
}

/// Deserialize any `T` from a plist document in a string.
///
/// `&str` fields borrow from `input`:
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Entry<'a> {
///     name: &'a str,
/// }
///
/// let plist = "<plist><dict><key>name</key><string>Lincoln</string></dict></plist>";
/// let entry: Entry = serde_xmlplist::from_str(plist).unwrap();
/// assert_eq!(entry.name, "Lincoln");
/// ```
pub fn from_str<'de, T: Deserialize<'de>>(input: &'de str) -> Result<T, Error> {
    from_slice(input.as_bytes())
}

/// Deserialize any `T` from a string with configurable [`Options`].
pub fn from_str_with_options<'de, T: Deserialize<'de>>(
    input: &'de str,
    options: Options,
) -> Result<T, Error> {
    from_slice_with_options(input.as_bytes(), options)
}

/// Decode into an existing destination (`Deserialize::deserialize_in_place`).
///
/// Envelope errors are reported before `dest` is touched. Errors inside the
/// root value may leave `dest` partially updated.
///
/// ```rust
/// let mut names: Vec<String> = vec!["kept only on envelope errors".into()];
/// let err = serde_xmlplist::from_slice_into(b"<array></array>", &mut names).unwrap_err();
/// assert!(matches!(err.without_snippet(), serde_xmlplist::Error::NotAPlist { .. }));
/// assert_eq!(names.len(), 1);
/// ```
pub fn from_slice_into<'de, T: Deserialize<'de>>(input: &'de [u8], dest: &mut T) -> Result<(), Error> {
    with_deserializer_from_slice(input, |de| T::deserialize_in_place(de, dest))
}

/// Create a streaming [`Deserializer`] for the root value of `input` and run a closure against it.
///
/// This is useful for tooling that needs access to the underlying serde
/// deserializer, such as wrappers that report unknown/ignored fields (the
/// `serde_ignored` crate) or that augment error paths (`serde_path_to_error`).
///
/// The deserializer borrows internal scanning state, so it cannot be returned
/// directly. The envelope is checked before and after `f` runs.
pub fn with_deserializer_from_slice<'de, R, F>(input: &'de [u8], f: F) -> Result<R, Error>
where
    F: for<'a> FnOnce(Deserializer<'a, 'de>) -> Result<R, Error>,
{
    with_deserializer_from_slice_with_options(input, Options::default(), f)
}

/// [`with_deserializer_from_slice`] for string input.
pub fn with_deserializer_from_str<'de, R, F>(input: &'de str, f: F) -> Result<R, Error>
where
    F: for<'a> FnOnce(Deserializer<'a, 'de>) -> Result<R, Error>,
{
    with_deserializer_from_slice(input.as_bytes(), f)
}

/// [`with_deserializer_from_slice`] with configurable [`Options`].
pub fn with_deserializer_from_slice_with_options<'de, R, F>(
    input: &'de [u8],
    options: Options,
    f: F,
) -> Result<R, Error>
where
    F: for<'a> FnOnce(Deserializer<'a, 'de>) -> Result<R, Error>,
{
    let cfg = Cfg::from_options(&options);
    let mut sc = Scanner::new(input, options.budget.clone());

    let res = decode_root(&mut sc, cfg, f);

    if let (Some(report), Some(cb)) = (sc.finish(), options.budget_report) {
        if res.is_ok() || report.breached.is_some() {
            cb(&report);
        }
    }
    res.map_err(|err| maybe_with_snippet(err, input, options.with_snippet, options.crop_radius))
}

fn decode_root<'de, R, F>(sc: &mut Scanner<'de>, cfg: Cfg, f: F) -> Result<R, Error>
where
    F: for<'a> FnOnce(Deserializer<'a, 'de>) -> Result<R, Error>,
{
    open_envelope(sc)?;
    let value = f(Deserializer::new(&mut *sc, cfg))?;
    close_envelope(sc)?;
    Ok(value)
}

/// Skip declarations up to and including the opening `<plist>` tag.
fn open_envelope(sc: &mut Scanner<'_>) -> Result<(), Error> {
    loop {
        match sc.next()? {
            Some(tok) if matches!(tok.kind, TokenKind::Declaration | TokenKind::Doctype) => {}
            Some(tok) if tok.is_open("plist") => return Ok(()),
            Some(tok) if tok.starts("plist") => {
                return Err(sc.unexpected_tag(&tok, "(a plist holds exactly one root value)"));
            }
            Some(tok) => {
                return Err(Error::not_a_plist(&tok.display()).with_location(sc.location_at(tok.offset)));
            }
            None => {
                return Err(Error::not_a_plist("end of input").with_location(sc.location_at(sc.position())));
            }
        }
    }
}

/// Require `</plist>` right after the root value and only whitespace after it.
fn close_envelope(sc: &mut Scanner<'_>) -> Result<(), Error> {
    let tok = match sc.next()? {
        Some(tok) if tok.is_close("plist") => tok,
        Some(tok) => return Err(Error::trailing_content().with_location(sc.location_at(tok.offset))),
        None => return Err(sc.eof("where </plist> was expected")),
    };
    if let Some(i) = first_non_whitespace(tok.text) {
        return Err(Error::trailing_content().with_location(sc.location_at(tok.text_offset + i)));
    }
    if let Some(i) = first_non_whitespace(sc.rest()) {
        return Err(Error::trailing_content().with_location(sc.location_at(sc.position() + i)));
    }
    Ok(())
}

fn first_non_whitespace(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|b| !b.is_ascii_whitespace())
}

/// Wrap `err` with a rendered snippet when the input is text and snippets are enabled.
fn maybe_with_snippet(err: Error, input: &[u8], with_snippet: bool, crop_radius: usize) -> Error {
    if !with_snippet || crop_radius == 0 {
        return err;
    }
    match std::str::from_utf8(input) {
        Ok(text) => err.with_snippet(text, crop_radius),
        Err(_) => err,
    }
}
