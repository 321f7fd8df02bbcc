//! Dynamic documents through `serde_json::Value`.

use serde_json::{Map, Number, Value};

use crate::arena::{Cursor, NodeKind};
use crate::decode::{Deserializer, FromJson};
use crate::encode::{ToJson, Writer};
use crate::Error;

impl ToJson for Number {
    fn write_json(&self, w: &mut Writer<'_>) {
        if let Some(value) = self.as_i64() {
            w.write_integer(value);
        } else if let Some(value) = self.as_u64() {
            w.write_integer(value);
        } else if let Some(value) = self.as_f64() {
            w.write_f64(value);
        } else {
            w.write_null();
        }
    }
}

impl ToJson for Map<String, Value> {
    fn write_json(&self, w: &mut Writer<'_>) {
        let mut scope = w.begin_object();
        for (key, value) in self {
            w.field(&mut scope, key, value);
        }
        w.end_object(scope);
    }
}

impl ToJson for Value {
    fn write_json(&self, w: &mut Writer<'_>) {
        match self {
            Value::Null => w.write_null(),
            Value::Bool(value) => w.write_bool(*value),
            Value::Number(number) => number.write_json(w),
            Value::String(text) => w.write_string(text),
            Value::Array(items) => w.write_array(items),
            Value::Object(map) => map.write_json(w),
        }
    }
}

impl FromJson for Number {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Number) {
            return;
        }
        match node.token.parse::<Number>() {
            Ok(number) => *self = number,
            Err(_) => de.fail(
                node,
                &Error::InvalidNumber {
                    token: node.token.to_string(),
                    target: "json number",
                },
            ),
        }
    }
}

impl FromJson for Map<String, Value> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Object) {
            return;
        }
        self.clear();
        for (key, value_node) in node.entries() {
            let key = match key.get_string() {
                Ok(key) => key,
                Err(err) => {
                    de.fail(key, &err);
                    continue;
                }
            };
            let mut value = Value::Null;
            value.read_json(value_node, de);
            self.insert(key, value);
        }
    }
}

/// Accepts any node. A leaf that fails to convert is reported and the
/// target is left as it was.
impl FromJson for Value {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        match node.kind {
            NodeKind::Null => *self = Value::Null,
            NodeKind::Boolean => *self = Value::Bool(node.token.starts_with('t')),
            NodeKind::Number => {
                let mut number = Number::from(0);
                let before = de.errors();
                number.read_json(node, de);
                if de.errors() == before {
                    *self = Value::Number(number);
                }
            }
            NodeKind::String => match node.get_string() {
                Ok(text) => *self = Value::String(text),
                Err(err) => de.fail(node, &err),
            },
            NodeKind::Array => {
                let mut items = Vec::with_capacity(node.child_count);
                for child in node.children() {
                    let mut item = Value::Null;
                    item.read_json(child, de);
                    items.push(item);
                }
                *self = Value::Array(items);
            }
            NodeKind::Object => {
                let mut map = Map::new();
                map.read_json(node, de);
                *self = Value::Object(map);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::DiagnosticCollector;
    use crate::{read, read_to_with, to_string, ReadConfig, WriteConfig};

    #[rstest::rstest]
    fn test_value_round_trip() {
        let value = json!({"b": [1, -2, 3.5, null], "a": {"s": "x\ny", "t": true}});
        let text = to_string(&value, &WriteConfig::compact());
        assert_eq!(text, r#"{"b":[1,-2,3.5,null],"a":{"s":"x\ny","t":true}}"#);
        assert_eq!(read::<Value>(&text), value);
    }

    #[rstest::rstest]
    fn test_member_order_is_kept() {
        let value: Value = read(r#"{"z": 1, "a": 2}"#);
        let keys: Vec<String> = value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[rstest::rstest]
    fn test_invalid_number_is_reported() {
        let mut value = json!("keep");
        let mut collector = DiagnosticCollector::new();
        read_to_with(&mut value, "1.2.3", &ReadConfig::default(), &mut collector);
        assert_eq!(value, json!("keep"));
        assert!(collector.has_errors());
    }

    #[rstest::rstest]
    fn test_large_integers() {
        let value: Value = read("[18446744073709551615, -9223372036854775808]");
        assert_eq!(value, json!([u64::MAX, i64::MIN]));
    }
}
