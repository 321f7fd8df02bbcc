//! Declarative impls of [`ToJson`](crate::ToJson) and
//! [`FromJson`](crate::FromJson) for user types.

/// Implements `ToJson` and `FromJson` for a struct with named fields.
///
/// Fields are written in the listed order and looked up by name when
/// reading. `field as "name"` stores a field under a different member name.
/// Every listed field type must implement `Default`, which is used when a
/// missing member is default-initialized.
///
/// # Examples
/// ```
/// use flatdoc::{json_record, read, to_string, WriteConfig};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Foo {
///     x: i32,
///     b: bool,
///     kind: String,
/// }
///
/// json_record!(Foo { x, b, kind as "type" });
///
/// let foo = Foo { x: 2, b: false, kind: "t".into() };
/// let text = to_string(&foo, &WriteConfig::compact());
/// assert_eq!(text, r#"{"x":2,"b":false,"type":"t"}"#);
/// assert_eq!(read::<Foo>(&text), foo);
/// ```
#[macro_export]
macro_rules! json_record {
    (@key $field:ident) => {
        stringify!($field)
    };
    (@key $field:ident $key:literal) => {
        $key
    };
    ($ty:ty { $($field:ident $(as $key:literal)?),* $(,)? }) => {
        impl $crate::ToJson for $ty {
            fn write_json(&self, w: &mut $crate::encode::Writer<'_>) {
                #[allow(unused_mut)]
                let mut scope = w.begin_object();
                $(
                    w.field(&mut scope, $crate::json_record!(@key $field $($key)?), &self.$field);
                )*
                w.end_object(scope);
            }
        }

        impl $crate::FromJson for $ty {
            fn read_json(
                &mut self,
                node: $crate::arena::Cursor<'_, '_>,
                de: &mut $crate::decode::Deserializer<'_>,
            ) {
                #[allow(unused_mut)]
                let Some(mut record) = de.record(node) else {
                    return;
                };
                $(
                    record.field($crate::json_record!(@key $field $($key)?), &mut self.$field);
                )*
                record.finish();
            }
        }
    };
}

/// Implements `ToJson` and `FromJson` for a fieldless enum, stored as its
/// integer discriminant.
///
/// Reading a number that matches no listed variant is an error and leaves
/// the target unchanged.
///
/// # Examples
/// ```
/// use flatdoc::{json_enum, read, to_string, WriteConfig};
///
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// enum Color {
///     #[default]
///     Red,
///     Green = 5,
/// }
///
/// json_enum!(Color { Red, Green });
///
/// assert_eq!(to_string(&Color::Green, &WriteConfig::compact()), "5");
/// assert_eq!(read::<Color>("5"), Color::Green);
/// assert_eq!(read::<Color>("0"), Color::Red);
/// ```
#[macro_export]
macro_rules! json_enum {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl $crate::ToJson for $ty {
            fn write_json(&self, w: &mut $crate::encode::Writer<'_>) {
                let discriminant: i64 = match self {
                    $( $ty::$variant => $ty::$variant as i64, )*
                };
                w.write_integer(discriminant);
            }
        }

        impl $crate::FromJson for $ty {
            fn read_json(
                &mut self,
                node: $crate::arena::Cursor<'_, '_>,
                de: &mut $crate::decode::Deserializer<'_>,
            ) {
                let mut discriminant: i64 = 0;
                let before = de.errors();
                $crate::FromJson::read_json(&mut discriminant, node, de);
                if de.errors() != before {
                    return;
                }
                $(
                    if discriminant == $ty::$variant as i64 {
                        *self = $ty::$variant;
                        return;
                    }
                )*
                de.error(
                    node,
                    &format!(
                        "unknown discriminant {} for enum {}",
                        discriminant,
                        stringify!($ty)
                    ),
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::error::DiagnosticCollector;
    use crate::{read, read_to_with, to_string, ReadConfig, WriteConfig};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Shape {
        #[default]
        Circle,
        Square,
        Triangle = 7,
    }

    json_enum!(Shape { Circle, Square, Triangle });

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        name: String,
        tags: Vec<String>,
    }

    json_record!(Inner { name, tags });

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        id: u64,
        shape: Shape,
        inner: Inner,
        lookup: BTreeMap<u8, f64>,
        note: Option<String>,
    }

    json_record!(Outer { id, shape, inner, lookup, note });

    fn sample() -> Outer {
        Outer {
            id: 9,
            shape: Shape::Triangle,
            inner: Inner {
                name: "in".into(),
                tags: vec!["a".into()],
            },
            lookup: BTreeMap::from([(1, 0.5)]),
            note: None,
        }
    }

    #[rstest::rstest]
    fn test_enum_discriminants() {
        assert_eq!(to_string(&Shape::Square, &WriteConfig::compact()), "1");
        assert_eq!(to_string(&Shape::Triangle, &WriteConfig::compact()), "7");
        assert_eq!(read::<Shape>("7"), Shape::Triangle);
    }

    #[rstest::rstest]
    fn test_unknown_discriminant_keeps_target() {
        let mut shape = Shape::Square;
        let mut collector = DiagnosticCollector::new();
        read_to_with(&mut shape, "3", &ReadConfig::default(), &mut collector);
        assert_eq!(shape, Shape::Square);
        assert_eq!(
            collector.diagnostics()[0].message,
            "unknown discriminant 3 for enum Shape"
        );
    }

    #[rstest::rstest]
    fn test_nested_record_compact() {
        assert_eq!(
            to_string(&sample(), &WriteConfig::compact()),
            r#"{"id":9,"shape":7,"inner":{"name":"in","tags":["a"]},"lookup":[[1,0.5]],"note":null}"#
        );
    }

    #[rstest::rstest]
    fn test_nested_record_round_trip() {
        let original = sample();
        for config in [WriteConfig::compact(), WriteConfig::pretty(2), WriteConfig::pretty(4)] {
            let text = to_string(&original, &config);
            assert_eq!(read::<Outer>(&text), original);
        }
    }

    #[rstest::rstest]
    fn test_pretty_record() {
        let inner = Inner {
            name: "n".into(),
            tags: vec![],
        };
        assert_eq!(
            to_string(&inner, &WriteConfig::pretty(2)),
            "{\n  \"name\": \"n\",\n  \"tags\": [\n  ]\n}"
        );
    }
}
