pub mod writer;

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io;
use std::rc::Rc;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::arena::{Cursor, NodeKind};
use crate::constants::is_json_number;
use crate::key::MapKey;
use crate::{Result, WriteConfig};

pub use writer::{IoSink, Scope, Sink, Writer};

/// Types that know how to write themselves as JSON.
///
/// Implemented for the scalar, string, sequence, set and map types of the
/// standard library. Records and enums get an impl from
/// [`json_record!`](crate::json_record) and [`json_enum!`](crate::json_enum).
pub trait ToJson {
    fn write_json(&self, w: &mut Writer<'_>);
}

/// Writes `value` into any `io::Write`.
pub fn write<W, T>(sink: W, value: &T, config: &WriteConfig) -> Result<()>
where
    W: io::Write,
    T: ToJson + ?Sized,
{
    let mut sink = IoSink::new(sink);
    write_to_sink(&mut sink, value, config);
    sink.into_result()?;
    Ok(())
}

pub fn write_to_sink<T: ToJson + ?Sized>(sink: &mut dyn Sink, value: &T, config: &WriteConfig) {
    let mut writer = Writer::new(sink, config);
    value.write_json(&mut writer);
}

/// Renders `value` as JSON text.
///
/// # Examples
/// ```
/// use flatdoc::{to_string, WriteConfig};
///
/// assert_eq!(to_string(&vec![1, 2], &WriteConfig::compact()), "[1,2]");
/// assert_eq!(to_string(&vec![1, 2], &WriteConfig::pretty(2)), "[\n  1,\n  2\n]");
/// ```
pub fn to_string<T: ToJson + ?Sized>(value: &T, config: &WriteConfig) -> String {
    let mut out = String::new();
    write_to_sink(&mut out, value, config);
    out
}

pub fn to_vec<T: ToJson + ?Sized>(value: &T, config: &WriteConfig) -> Vec<u8> {
    let mut out = Vec::new();
    write_to_sink(&mut out, value, config);
    out
}

impl ToJson for bool {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_bool(*self);
    }
}

macro_rules! impl_to_json_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToJson for $ty {
                fn write_json(&self, w: &mut Writer<'_>) {
                    w.write_integer(*self);
                }
            }
        )*
    };
}

impl_to_json_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ToJson for f32 {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_f32(*self);
    }
}

impl ToJson for f64 {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_f64(*self);
    }
}

impl ToJson for char {
    fn write_json(&self, w: &mut Writer<'_>) {
        let mut buf = [0u8; 4];
        w.write_string(self.encode_utf8(&mut buf));
    }
}

impl ToJson for str {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_string(self);
    }
}

impl ToJson for String {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_string(self);
    }
}

impl ToJson for SmolStr {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_string(self);
    }
}

impl ToJson for Cow<'_, str> {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_string(self);
    }
}

impl ToJson for () {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_null();
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        match self {
            Some(value) => value.write_json(w),
            None => w.write_null(),
        }
    }
}

impl<T: ToJson + ?Sized> ToJson for &T {
    fn write_json(&self, w: &mut Writer<'_>) {
        (**self).write_json(w);
    }
}

impl<T: ToJson + ?Sized> ToJson for Box<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        (**self).write_json(w);
    }
}

impl<T: ToJson + ?Sized> ToJson for Rc<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        (**self).write_json(w);
    }
}

impl<T: ToJson + ?Sized> ToJson for Arc<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        (**self).write_json(w);
    }
}

impl<T: ToJson> ToJson for [T] {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<T: ToJson, const N: usize> ToJson for [T; N] {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<T: ToJson> ToJson for VecDeque<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<T: ToJson, S> ToJson for HashSet<T, S> {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<T: ToJson> ToJson for BTreeSet<T> {
    fn write_json(&self, w: &mut Writer<'_>) {
        w.write_array(self);
    }
}

impl<K: MapKey + ToJson, V: ToJson, S> ToJson for HashMap<K, V, S> {
    fn write_json(&self, w: &mut Writer<'_>) {
        write_map(w, self.iter());
    }
}

impl<K: MapKey + ToJson, V: ToJson> ToJson for BTreeMap<K, V> {
    fn write_json(&self, w: &mut Writer<'_>) {
        write_map(w, self.iter());
    }
}

fn write_map<'m, K, V>(w: &mut Writer<'_>, entries: impl Iterator<Item = (&'m K, &'m V)>)
where
    K: MapKey + ToJson + 'm,
    V: ToJson + 'm,
{
    if K::STRING_KEY {
        let mut scope = w.begin_object();
        for (key, value) in entries {
            w.field(&mut scope, key.key_str(), value);
        }
        w.end_object(scope);
    } else {
        let mut scope = w.begin_array();
        for (key, value) in entries {
            w.element(&mut scope);
            w.write_pair(key, value);
        }
        w.end_array(scope);
    }
}

/// Re-emits a parsed subtree with only the whitespace between tokens
/// changed. Number tokens that are not valid JSON become `null` and string
/// escapes JSON does not allow are repaired, so the output always parses.
/// [`Document::check_leaves`](crate::Document::check_leaves) reports both.
impl ToJson for Cursor<'_, '_> {
    fn write_json(&self, w: &mut Writer<'_>) {
        match self.kind {
            NodeKind::Null => w.write_null(),
            NodeKind::Boolean => w.write_bool(self.get_boolean().unwrap_or_default()),
            NodeKind::Number if is_json_number(self.token) => w.write_raw(self.token),
            NodeKind::Number => w.write_null(),
            NodeKind::String => w.write_string_token(self.token),
            NodeKind::Array => {
                let mut scope = w.begin_array();
                for child in self.children() {
                    w.element(&mut scope);
                    child.write_json(w);
                }
                w.end_array(scope);
            }
            NodeKind::Object => {
                let mut scope = w.begin_object();
                for (key, value) in self.entries() {
                    w.key_token(&mut scope, key.token);
                    value.write_json(w);
                }
                w.end_object(scope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::read_ref;

    #[rstest::rstest]
    #[case(0.5f64, "0.5")]
    #[case(-0.25f64, "-0.25")]
    #[case(f64::INFINITY, "null")]
    fn test_floats(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(to_string(&value, &WriteConfig::compact()), expected);
    }

    #[rstest::rstest]
    fn test_option_and_unit() {
        let values: Vec<Option<u8>> = vec![Some(1), None];
        assert_eq!(to_string(&values, &WriteConfig::compact()), "[1,null]");
        assert_eq!(to_string(&(), &WriteConfig::compact()), "null");
    }

    #[rstest::rstest]
    fn test_char_is_a_string() {
        assert_eq!(to_string(&'a', &WriteConfig::compact()), "\"a\"");
    }

    #[rstest::rstest]
    fn test_string_keyed_map_is_an_object() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        assert_eq!(to_string(&map, &WriteConfig::compact()), r#"{"a":1,"b":2}"#);
        assert_eq!(
            to_string(&map, &WriteConfig::pretty(2)),
            "{\n  \"a\": 1,\n  \"b\": 2\n}"
        );
    }

    #[rstest::rstest]
    fn test_integer_keyed_map_is_a_pair_list() {
        let mut map = BTreeMap::new();
        map.insert(7, 17);
        map.insert(1, 3);
        assert_eq!(to_string(&map, &WriteConfig::compact()), "[[1,3],[7,17]]");
        assert_eq!(
            to_string(&map, &WriteConfig::pretty(2)),
            "[\n  [1, 3],\n  [7, 17]\n]"
        );
    }

    #[rstest::rstest]
    fn test_cursor_reemits_tokens() {
        let doc = read_ref(r#" { "a" : [ 1.50, "x\ty" , null ] } "#);
        let root = doc.root().expect("root");
        assert_eq!(
            to_string(&root, &WriteConfig::compact()),
            r#"{"a":[1.50,"x\ty",null]}"#
        );
    }

    #[rstest::rstest]
    fn test_cursor_output_is_valid_json() {
        let text = r#"{"a\qk": [+4, 1x, 0x1F, "a\qb", 01, -2.5e1, "\u00e9"]}"#;
        let doc = read_ref(text);
        let root = doc.root().expect("root");
        let out = to_string(&root, &WriteConfig::compact());
        assert_eq!(out, r#"{"a\\qk":[null,null,null,"a\\qb",null,-2.5e1,"\u00e9"]}"#);
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(parsed["a\\qk"][3], "a\\qb");
    }

    #[rstest::rstest]
    fn test_write_to_io() {
        let mut out = Vec::new();
        write(&mut out, &[true, false], &WriteConfig::compact()).expect("write");
        assert_eq!(out, b"[true,false]");
        assert_eq!(to_vec(&"x", &WriteConfig::compact()), b"\"x\"");
    }
}
