use indoc::indoc;
use serde::Deserialize;
use serde_xmlplist::{Error, Value};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Config {
    name: String,
    retries: u8,
}

fn plain(options_input: &str) -> Error {
    let options = serde_xmlplist::options! { with_snippet: false };
    serde_xmlplist::from_str_with_options::<Config>(options_input, options).unwrap_err()
}

#[test]
fn conversion_error_points_at_the_body() {
    let input = indoc! {r#"
        <plist>
        <dict>
            <key>name</key><string>x</string>
            <key>retries</key><integer>300</integer>
        </dict>
        </plist>
    "#};
    let err = plain(input);
    let Error::Conversion { tag, expected, text, location } = &err else {
        panic!("expected a conversion error, got {err:?}");
    };
    assert_eq!(tag, "integer");
    assert_eq!(*expected, "u8");
    assert_eq!(text, "300");
    assert_eq!(location.line(), 4);
    assert_eq!(location.column(), 32);
    assert_eq!(
        err.to_string(),
        "cannot convert <integer> body `300` to u8 at line 4, column 32"
    );
}

#[test]
fn type_mismatch_points_at_the_value() {
    let input = "<plist>\n<dict>\n<key>name</key>\n<array/>\n</dict>\n</plist>";
    let err = plain(input);
    assert!(matches!(err, Error::TypeMismatch { .. }), "{err:?}");
    let location = err.location().expect("location");
    assert_eq!((location.line(), location.column()), (4, 1));
}

#[test]
fn missing_field_is_reported_by_serde() {
    let err = plain("<plist><dict><key>name</key><string>x</string></dict></plist>");
    assert!(err.to_string().contains("missing field `retries`"), "{err}");
}

#[test]
fn missing_plist_root() {
    for (input, found) in [
        (r#"<?xml version="1.0"?><dict></dict>"#, "<dict>"),
        ("<!DOCTYPE plist>", "end of input"),
        ("", "end of input"),
    ] {
        let err = plain(input);
        match &err {
            Error::NotAPlist { found: f, .. } => assert_eq!(f, found),
            other => panic!("expected NotAPlist for {input:?}, got {other:?}"),
        }
    }
}

#[test]
fn plist_attributes_are_ignored() {
    let v: i64 = serde_xmlplist::from_str(r#"<plist version="1.0" xmlns:x="y"><integer>5</integer></plist>"#).unwrap();
    assert_eq!(v, 5);
}

#[test]
fn self_closing_plist_has_no_root_value() {
    let err = serde_xmlplist::from_str::<Value>("<plist/>").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::UnexpectedTag { .. }), "{err:?}");
}

#[test]
fn trailing_content_is_rejected() {
    for input in [
        "<plist><integer>1</integer><integer>2</integer></plist>",
        "<plist><integer>1</integer>junk</plist>",
        "<plist><integer>1</integer></plist>junk",
        "<plist><integer>1</integer></plist><plist/>",
    ] {
        let err = serde_xmlplist::from_str::<i64>(input).unwrap_err();
        assert!(
            matches!(err.without_snippet(), Error::TrailingContent { .. }),
            "{input}: {err:?}"
        );
    }

    let ok: i64 = serde_xmlplist::from_str("<plist><integer>1</integer></plist>\n\n  ").unwrap();
    assert_eq!(ok, 1);
}

#[test]
fn truncated_documents() {
    let err = serde_xmlplist::from_str::<Value>("<plist><dict><key>a</key><string>x</string>").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::Eof { .. }), "{err:?}");

    let err = serde_xmlplist::from_str::<Value>("<plist><integer>1</integer>").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::Eof { .. }), "{err:?}");

    let err = serde_xmlplist::from_str::<Value>("<plist><array><string>x</string").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::UnterminatedTag { .. }), "{err:?}");
}

#[test]
fn mismatched_closing_tags() {
    let err = serde_xmlplist::from_str::<Value>("<plist><string>x</integer></plist>").unwrap_err();
    assert!(err.to_string().contains("where </string> was expected"), "{err}");

    let err = serde_xmlplist::from_str::<Value>("<plist><dict><string>x</string></dict></plist>").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::UnexpectedTag { .. }), "{err:?}");
}

#[test]
fn unknown_value_tag() {
    let err = serde_xmlplist::from_str::<Value>("<plist><float>1</float></plist>").unwrap_err();
    match err.without_snippet() {
        Error::UnexpectedTag { tag, .. } => assert_eq!(tag, "<float>"),
        other => panic!("expected UnexpectedTag, got {other:?}"),
    }
}

#[test]
fn snippet_shows_the_offending_line() {
    let input = indoc! {r#"
        <plist>
        <dict>
            <key>name</key><string>x</string>
            <key>retries</key><integer>many</integer>
        </dict>
        </plist>
    "#};
    let err = serde_xmlplist::from_str::<Config>(input).unwrap_err();
    assert!(matches!(err, Error::WithSnippet { .. }), "{err:?}");
    let rendered = err.to_string();
    assert!(rendered.contains("line 4 column 32"), "{rendered}");
    assert!(rendered.contains("<integer>many</integer>"), "{rendered}");
    assert!(rendered.contains("<input>"), "{rendered}");

    assert!(matches!(err.without_snippet(), Error::Conversion { .. }));
    assert_eq!(err.location().map(|l| l.line()), Some(4));
}

#[test]
fn snippets_can_be_disabled() {
    let options = serde_xmlplist::options! { crop_radius: 0 };
    let err = serde_xmlplist::from_str_with_options::<i64>("<plist><string>x</string></plist>", options).unwrap_err();
    assert!(!matches!(err, Error::WithSnippet { .. }), "{err:?}");
    assert!(err.to_string().ends_with("at line 1, column 8"), "{err}");
}

#[test]
fn non_utf8_text_is_a_conversion_error() {
    let input = b"<plist><string>\xff\xfe</string></plist>";
    let err = serde_xmlplist::from_slice::<String>(input).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }), "{err:?}");
}

#[test]
fn custom_deserialize_errors_get_the_value_location() {
    #[derive(Debug)]
    struct Even(i64);

    impl<'de> Deserialize<'de> for Even {
        fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let v = i64::deserialize(d)?;
            if v % 2 == 0 {
                Ok(Even(v))
            } else {
                Err(serde::de::Error::custom("odd number"))
            }
        }
    }

    let options = serde_xmlplist::options! { with_snippet: false };
    let err = serde_xmlplist::from_str_with_options::<Vec<Even>>(
        "<plist><array>\n<integer>2</integer>\n<integer>3</integer>\n</array></plist>",
        options,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "odd number at line 3, column 1");
}
