use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use rstest::rstest;
use smol_str::SmolStr;

use flatdoc::{
    escape_json_string, json_enum, json_record, read, read_to, read_to_with, to_string, try_read,
    unescape_json_string, write, DiagnosticCollector, Error, ReadConfig, WriteConfig,
};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Level {
    #[default]
    Low,
    Mid,
    High,
}

json_enum!(Level { Low, Mid, High });

#[derive(Debug, Default, PartialEq)]
struct Foo {
    x: i32,
    b: bool,
}

json_record!(Foo { x, b });

#[derive(Debug, Default, PartialEq)]
struct Settings {
    name: SmolStr,
    level: Level,
    ratio: f32,
    grid: [[u8; 2]; 2],
    counts: HashMap<String, u32>,
    by_id: BTreeMap<u16, Foo>,
    queue: VecDeque<i64>,
    tags: BTreeSet<String>,
    parent: Option<Box<Settings>>,
}

json_record!(Settings { name, level, ratio, grid, counts, by_id, queue, tags, parent });

fn settings() -> Settings {
    Settings {
        name: "main".into(),
        level: Level::High,
        ratio: 0.25,
        grid: [[1, 2], [3, 4]],
        counts: HashMap::from([("a".to_string(), 1), ("b\n".to_string(), 2)]),
        by_id: BTreeMap::from([(7, Foo { x: 17, b: true })]),
        queue: VecDeque::from([i64::MIN, 0, i64::MAX]),
        tags: BTreeSet::from(["x".to_string(), "y \"quoted\"".to_string()]),
        parent: Some(Box::new(Settings {
            name: "parent".into(),
            ..Settings::default()
        })),
    }
}

#[rstest]
fn compact_vector() {
    assert_eq!(to_string(&vec![1, 2, 3], &WriteConfig::compact()), "[1,2,3]");
}

#[rstest]
fn pretty_empty_vector() {
    let empty: Vec<i32> = Vec::new();
    assert_eq!(to_string(&empty, &WriteConfig::pretty(2)), "[\n]");
}

#[rstest]
fn pretty_nested_vectors() {
    let nested: Vec<Vec<i32>> = vec![vec![], vec![1]];
    assert_eq!(
        to_string(&nested, &WriteConfig::pretty(2)),
        "[\n  [\n  ],\n  [\n    1\n  ]\n]"
    );
}

#[rstest]
fn record_in_declaration_order() {
    let foo = Foo { x: 2, b: false };
    assert_eq!(to_string(&foo, &WriteConfig::compact()), r#"{"x":2,"b":false}"#);
    assert_eq!(
        to_string(&foo, &WriteConfig::pretty(4)),
        "{\n    \"x\": 2,\n    \"b\": false\n}"
    );
}

#[rstest]
fn string_map_ignores_source_order() {
    let map: HashMap<String, i32> = read(r#"{"a":3,"b":7}"#);
    let expected = HashMap::from([("a".to_string(), 3), ("b".to_string(), 7)]);
    assert_eq!(map, expected);
    let reversed: HashMap<String, i32> = read(r#"{"b":7,"a":3}"#);
    assert_eq!(reversed, expected);
}

#[rstest]
fn escaping_literal() {
    assert_eq!(escape_json_string("ha\"s\\"), "\"ha\\\"s\\\\\"");
    assert_eq!(
        to_string(&"h\"el\tl\\o", &WriteConfig::compact()),
        r#""h\"el\tl\\o""#
    );
    assert_eq!(
        unescape_json_string(r#""a\/b\r\n""#).ok().as_deref(),
        Some("a/b\r\n")
    );
}

#[rstest]
#[case(WriteConfig::compact())]
#[case(WriteConfig::pretty(1))]
#[case(WriteConfig::pretty(2))]
#[case(WriteConfig::pretty(8))]
fn nested_record_round_trip(#[case] config: WriteConfig) {
    let original = settings();
    let text = to_string(&original, &config);
    let decoded: Settings = try_read(&text, &ReadConfig::default().with_strict(true))
        .unwrap_or_else(|err| panic!("{err}\n{text}"));
    assert_eq!(decoded, original);
}

#[rstest]
fn scalars_round_trip() {
    assert_eq!(read::<f64>(&to_string(&0.1f64, &WriteConfig::compact())), 0.1);
    assert_eq!(read::<f32>(&to_string(&-0.25f32, &WriteConfig::compact())), -0.25);
    assert_eq!(read::<u128>(&to_string(&u128::MAX, &WriteConfig::compact())), u128::MAX);
    assert_eq!(read::<char>("\"a\""), 'a');
    assert_eq!(read::<[bool; 3]>("[true, false, true]"), [true, false, true]);
    assert_eq!(&*read::<Box<str>>("\"boxed\""), "boxed");
}

#[rstest]
fn read_to_keeps_unmentioned_fields() {
    let mut foo = Foo { x: 5, b: true };
    read_to(&mut foo, r#"{"x": 6}"#);
    assert_eq!(foo, Foo { x: 6, b: true });
}

#[rstest]
fn mismatches_do_not_stop_siblings() {
    let mut foo = Foo { x: 5, b: false };
    let mut collector = DiagnosticCollector::new();
    read_to_with(
        &mut foo,
        r#"{"x": "nope", "b": true}"#,
        &ReadConfig::default(),
        &mut collector,
    );
    assert_eq!(foo, Foo { x: 5, b: true });
    assert_eq!(collector.errors().count(), 1);
    assert_eq!(
        collector.diagnostics()[0].message,
        "expected 'number' node, found 'string'"
    );
}

#[rstest]
fn optional_record_keeps_fields_that_read() {
    let mut foo: Option<Foo> = None;
    let mut collector = DiagnosticCollector::new();
    read_to_with(
        &mut foo,
        r#"{"x": 1, "b": "bad"}"#,
        &ReadConfig::default(),
        &mut collector,
    );
    assert_eq!(foo, Some(Foo { x: 1, b: false }));
    assert_eq!(collector.errors().count(), 1);

    let mut parent: Option<Box<Settings>> = None;
    let mut collector = DiagnosticCollector::new();
    read_to_with(
        &mut parent,
        r#"{"name": "p", "level": 1, "ratio": "half", "parent": {"name": "q", "queue": [1, "2"]}}"#,
        &ReadConfig::default(),
        &mut collector,
    );
    assert_eq!(collector.errors().count(), 2);
    let parent = parent.expect("kept");
    assert_eq!(parent.name, "p");
    assert_eq!(parent.level, Level::Mid);
    let grandparent = parent.parent.expect("kept");
    assert_eq!(grandparent.name, "q");
    assert_eq!(grandparent.queue, VecDeque::from([1, 0]));
}

#[rstest]
#[case("[1]")]
#[case("\"x\"")]
#[case("true")]
fn optional_record_of_wrong_kind_stays_empty(#[case] text: &str) {
    let mut foo: Option<Foo> = None;
    let mut collector = DiagnosticCollector::new();
    read_to_with(&mut foo, text, &ReadConfig::default(), &mut collector);
    assert_eq!(foo, None);
    assert_eq!(collector.errors().count(), 1);
}

#[rstest]
fn try_read_rejects_on_errors_only() {
    let config = ReadConfig::default();
    let foo: Foo = try_read(r#"{"x": 1, "b": true, "extra": 0}"#, &config).expect("warnings only");
    assert_eq!(foo, Foo { x: 1, b: true });

    let strict = config.clone().with_strict(true);
    match try_read::<Foo>(r#"{"x": 1, "b": true, "extra": 0}"#, &strict) {
        Err(Error::Rejected(diagnostics)) => {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].message, "extra data: unexpected member 'extra'");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[rstest]
fn unknown_escape_is_reported() {
    let mut collector = DiagnosticCollector::new();
    let mut text = String::from("kept");
    read_to_with(&mut text, r#""\u0041""#, &ReadConfig::default(), &mut collector);
    assert_eq!(text, "kept");
    assert!(collector.has_errors());
}

#[rstest]
fn write_into_io() {
    let mut out = Vec::new();
    write(&mut out, &Foo { x: 1, b: true }, &WriteConfig::pretty(2)).expect("write");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "{\n  \"x\": 1,\n  \"b\": true\n}"
    );
}
