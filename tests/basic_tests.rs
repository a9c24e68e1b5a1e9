use indoc::indoc;
use serde::Deserialize;
use serde_xmlplist::{Date, Value};

const BACKUP_PLIST: &str = indoc! {r#"
    <plist version="1.0">
        <dict>
            <key>BucketUUID</key>
            <string>C218A47D-DAFB-4476-9C67-597E556D7D8A</string>
            <key>BucketName</key>
            <string>rsc</string>
            <key>ComputerUUID</key>
            <string>E7859547-BB9C-41C0-871E-858A0526BAE7</string>
            <key>LocalPath</key>
            <string>/Users/rsc</string>
            <key>LocalMountPoint</key>
            <string>/Users</string>
            <key>IgnoredRelativePaths</key>
            <array>
                <string>/.Trash</string>
                <string>/go/pkg</string>
                <string>/go1/pkg</string>
                <string>/Library/Caches</string>
            </array>
            <key>Excludes</key>
            <dict>
                <key>excludes</key>
                <array>
                    <dict>
                        <key>type</key>
                        <integer>2</integer>
                        <key>text</key>
                        <string>.unison.</string>
                    </dict>
                </array>
            </dict>
        </dict>
    </plist>
"#};

const PRESIDENTS_PLIST: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <!DOCTYPE plist SYSTEM "file://localhost/System/Library/DTDs/PropertyList.dtd">
    <plist version="1.0">
    <dict>
        <key>Lincoln</key>
        <dict>
            <key>DOB</key>
            <date>1809-02-12T09:18:00Z</date>
            <key>Name</key>
            <string>Abraham Lincoln</string>
            <key>Scores</key>
            <array>
                <integer>8</integer>
                <real>4.9000000953674316</real>
                <integer>9</integer>
            </array>
            <key>Assassinated</key>
            <true/>
        </dict>
        <key>Washington</key>
        <dict>
            <key>DOB</key>
            <date>1732-02-17T01:32:00Z</date>
            <key>Name</key>
            <string>George Washington</string>
            <key>Scores</key>
            <array>
                <integer>6</integer>
                <real>4.5999999046325684</real>
                <integer>6</integer>
            </array>
            <key>Assassinated</key>
            <false/>
        </dict>
    </dict>
    </plist>
"#};

#[allow(non_snake_case)]
#[derive(Debug, Deserialize, PartialEq)]
struct Backup {
    BucketUUID: String,
    BucketName: String,
    ComputerUUID: String,
    LocalPath: String,
    LocalMountPoint: String,
    IgnoredRelativePaths: Vec<String>,
    Excludes: Exclude1,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize, PartialEq)]
struct Exclude1 {
    #[serde(alias = "excludes")]
    Excludes: Vec<Exclude2>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Exclude2 {
    #[serde(rename = "type")]
    kind: i32,
    text: String,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize, PartialEq)]
struct PresTest {
    Lincoln: President,
    Washington: President,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize, PartialEq)]
struct President {
    DOB: Date,
    Name: String,
    Assassinated: bool,
    Scores: Vec<Value>,
}

#[test]
fn backup_settings_bind_by_field_name_and_alias() {
    let backup: Backup = serde_xmlplist::from_str(BACKUP_PLIST).expect("backup plist");
    assert_eq!(
        backup,
        Backup {
            BucketUUID: "C218A47D-DAFB-4476-9C67-597E556D7D8A".into(),
            BucketName: "rsc".into(),
            ComputerUUID: "E7859547-BB9C-41C0-871E-858A0526BAE7".into(),
            LocalPath: "/Users/rsc".into(),
            LocalMountPoint: "/Users".into(),
            IgnoredRelativePaths: vec![
                "/.Trash".into(),
                "/go/pkg".into(),
                "/go1/pkg".into(),
                "/Library/Caches".into(),
            ],
            Excludes: Exclude1 {
                Excludes: vec![Exclude2 {
                    kind: 2,
                    text: ".unison.".into(),
                }],
            },
        }
    );
}

#[test]
fn empty_struct_ignores_every_key() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Nothing {}

    let nothing: Nothing = serde_xmlplist::from_str(BACKUP_PLIST).unwrap();
    assert_eq!(nothing, Nothing {});
}

#[test]
fn presidents_with_dates_and_mixed_arrays() -> anyhow::Result<()> {
    let pres: PresTest = serde_xmlplist::from_str(PRESIDENTS_PLIST)?;

    assert_eq!(
        pres.Lincoln,
        President {
            DOB: Date::parse("1809-02-12T09:18:00Z")?,
            Name: "Abraham Lincoln".into(),
            Assassinated: true,
            Scores: vec![
                Value::Integer(8),
                Value::Real(4.9000000953674316),
                Value::Integer(9),
            ],
        }
    );
    assert_eq!(
        pres.Washington,
        President {
            DOB: Date::parse("1732-02-17T01:32:00Z")?,
            Name: "George Washington".into(),
            Assassinated: false,
            Scores: vec![
                Value::Integer(6),
                Value::Real(4.5999999046325684),
                Value::Integer(6),
            ],
        }
    );
    Ok(())
}

#[test]
fn unknown_keys_are_skipped_wherever_they_appear() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Wanted {
        a: i32,
        b: String,
    }

    let plain = "<plist><dict><key>a</key><integer>1</integer><key>b</key><string>x</string></dict></plist>";
    let noisy = indoc! {r#"
        <plist>
        <dict>
            <key>junk1</key>
            <dict><key>deep</key><array><true/><dict/><string>s</string></array></dict>
            <key>a</key><integer>1</integer>
            <key>junk2</key><false/>
            <key>junk3</key><array/>
            <key>b</key><string>x</string>
            <key>junk4</key><data>AAEC</data>
        </dict>
        </plist>
    "#};

    let expected: Wanted = serde_xmlplist::from_str(plain).unwrap();
    assert_eq!(expected, serde_xmlplist::from_str::<Wanted>(noisy).unwrap());
}

#[test]
fn skipped_boolean_does_not_swallow_the_next_entries() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct After {
        after: String,
        last: i64,
    }

    let input = indoc! {r#"
        <plist><dict>
            <key>flag</key><true/>
            <key>after</key><string>seen</string>
            <key>other</key><false/>
            <key>last</key><integer>-3</integer>
        </dict></plist>
    "#};
    let v: After = serde_xmlplist::from_str(input).unwrap();
    assert_eq!(
        v,
        After {
            after: "seen".into(),
            last: -3,
        }
    );
}

#[test]
fn optional_and_boxed_fields_are_allocated_when_present() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Node {
        name: String,
        child: Option<Box<Node>>,
        #[serde(default)]
        note: Option<String>,
    }

    let input = indoc! {r#"
        <plist><dict>
            <key>name</key><string>root</string>
            <key>child</key>
            <dict>
                <key>name</key><string>leaf</string>
                <key>child</key><dict><key>name</key><string>deepest</string></dict>
            </dict>
        </dict></plist>
    "#};
    let node: Node = serde_xmlplist::from_str(input).unwrap();
    let leaf = node.child.as_deref().expect("child present");
    assert_eq!(leaf.name, "leaf");
    let deepest = leaf.child.as_deref().expect("grandchild present");
    assert_eq!(deepest.name, "deepest");
    assert!(deepest.child.is_none());
    assert!(node.note.is_none());
}

#[test]
fn borrowed_strings_point_into_the_input() {
    #[derive(Deserialize)]
    struct Names<'a> {
        #[serde(borrow)]
        names: Vec<&'a str>,
    }

    let input = String::from("<plist><dict><key>names</key><array><string>a</string><string>b&amp;c</string></array></dict></plist>");
    let names: Names = serde_xmlplist::from_str(&input).unwrap();
    assert_eq!(names.names, ["a", "b&amp;c"]);
    let range = input.as_bytes().as_ptr_range();
    assert!(range.contains(&names.names[0].as_ptr()));
}

#[test]
fn text_is_taken_verbatim() {
    let s: String = serde_xmlplist::from_str("<plist><string>  padded &lt;x&gt;\n</string></plist>").unwrap();
    assert_eq!(s, "  padded &lt;x&gt;\n");
}

#[test]
fn empty_element_forms() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Empties {
        s: String,
        list: Vec<i32>,
        map: std::collections::BTreeMap<String, i32>,
        bytes: Vec<u8>,
    }

    let input = "<plist><dict><key>s</key><string/><key>list</key><array/><key>map</key><dict/><key>bytes</key><data/></dict></plist>";
    let v: Empties = serde_xmlplist::from_str(input).unwrap();
    assert_eq!(
        v,
        Empties {
            s: String::new(),
            list: vec![],
            map: Default::default(),
            bytes: vec![],
        }
    );
}

#[test]
fn decoding_is_deterministic() {
    let first: Value = serde_xmlplist::from_str(PRESIDENTS_PLIST).unwrap();
    for _ in 0..3 {
        let again: Value = serde_xmlplist::from_slice(PRESIDENTS_PLIST.as_bytes()).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn from_slice_into_overwrites_existing_destination() {
    let mut scores: Vec<i64> = vec![100, 200, 300];
    serde_xmlplist::from_slice_into(b"<plist><array><integer>1</integer><integer>2</integer></array></plist>", &mut scores)
        .unwrap();
    assert_eq!(scores, [1, 2]);
}

#[test]
fn from_slice_into_leaves_destination_alone_without_root() {
    let mut scores: Vec<i64> = vec![100, 200, 300];
    let err = serde_xmlplist::from_slice_into(b"<?xml version=\"1.0\"?>\n<array></array>", &mut scores).unwrap_err();
    assert!(matches!(err.without_snippet(), serde_xmlplist::Error::NotAPlist { .. }), "{err:?}");
    assert_eq!(scores, [100, 200, 300]);
}

#[test]
fn repeated_keys_bind_the_last_value() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        a: i32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Outer {
        a: i32,
        name: String,
        inner: Inner,
    }

    let plist = indoc! {r#"
        <plist version="1.0">
        <dict>
            <key>a</key><integer>1</integer>
            <key>inner</key>
            <dict>
                <key>a</key><integer>10</integer>
                <key>a</key><integer>20</integer>
            </dict>
            <key>name</key><string>first</string>
            <key>a</key><integer>2</integer>
            <key>name</key><string>second</string>
        </dict>
        </plist>
    "#};

    let outer: Outer = serde_xmlplist::from_str(plist).unwrap();
    assert_eq!(
        outer,
        Outer {
            a: 2,
            name: "second".into(),
            inner: Inner { a: 20 },
        }
    );
}

#[test]
fn repeated_key_under_name_and_alias_is_a_duplicate_field() {
    #[allow(non_snake_case)]
    #[derive(Debug, Deserialize)]
    struct Exclusions {
        #[serde(alias = "excludes")]
        Excludes: Vec<String>,
    }

    let err = serde_xmlplist::from_str::<Exclusions>(
        "<plist><dict><key>Excludes</key><array/><key>excludes</key><array/></dict></plist>",
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate field `Excludes`"), "{err}");
}
