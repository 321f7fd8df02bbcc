use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use smol_str::SmolStr;

use crate::arena::{Cursor, NodeKind};
use crate::decode::record::RecordReader;
use crate::error::{ErrorHandler, Severity};
use crate::key::MapKey;
use crate::{Error, ReadConfig};

/// Types that can be filled in from a parsed node.
///
/// A reader never fails: problems go to the [`Deserializer`]'s handler and
/// the target keeps whatever it held before.
pub trait FromJson {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>);
}

/// Carries the read configuration and error handler through a
/// deserialization pass.
pub struct Deserializer<'r> {
    config: &'r ReadConfig,
    handler: &'r mut dyn ErrorHandler,
    errors: usize,
    // Index of the node behind the latest kind mismatch.
    mismatch: Option<usize>,
}

impl<'r> Deserializer<'r> {
    pub fn new(config: &'r ReadConfig, handler: &'r mut dyn ErrorHandler) -> Self {
        Self {
            config,
            handler,
            errors: 0,
            mismatch: None,
        }
    }

    pub fn config(&self) -> &ReadConfig {
        self.config
    }

    /// Errors reported so far in this pass.
    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn read<T: FromJson + ?Sized>(&mut self, node: Cursor<'_, '_>, target: &mut T) {
        target.read_json(node, self);
    }

    pub fn report(&mut self, node: Cursor<'_, '_>, message: &str, severity: Severity) {
        if severity == Severity::Error {
            self.errors += 1;
        }
        self.handler
            .report(node.source(), node.span(), message, severity);
    }

    pub fn error(&mut self, node: Cursor<'_, '_>, message: &str) {
        self.report(node, message, Severity::Error);
    }

    pub fn fail(&mut self, node: Cursor<'_, '_>, err: &Error) {
        if matches!(err, Error::KindMismatch { .. }) {
            self.mismatch = Some(node.index());
        }
        self.error(node, &err.to_string());
    }

    /// Reports a kind mismatch unless `node` is of `kind`.
    pub fn expect(&mut self, node: Cursor<'_, '_>, kind: NodeKind) -> bool {
        if node.kind == kind {
            return true;
        }
        self.fail(
            node,
            &Error::KindMismatch {
                expected: kind,
                found: node.kind,
            },
        );
        false
    }

    /// Target wanted more than `node` holds.
    pub fn missing_data(&mut self, node: Cursor<'_, '_>, message: &str) {
        if self.config.warn_on_missing_data {
            self.report(node, message, self.config.data_severity());
        }
    }

    /// `node` holds more than the target has room for.
    pub fn extra_data(&mut self, node: Cursor<'_, '_>, message: &str) {
        if self.config.warn_on_extra_data {
            self.report(node, message, self.config.data_severity());
        }
    }

    /// Starts reading a record from an object node.
    pub fn record<'x, 'd, 'a>(
        &'x mut self,
        node: Cursor<'d, 'a>,
    ) -> Option<RecordReader<'x, 'r, 'd, 'a>> {
        if !self.expect(node, NodeKind::Object) {
            return None;
        }
        Some(RecordReader::new(self, node))
    }
}

impl FromJson for bool {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        match node.get_boolean() {
            Ok(value) => *self = value,
            Err(err) => de.fail(node, &err),
        }
    }
}

macro_rules! impl_from_json_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromJson for $ty {
                fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
                    if node.is_boolean() && de.config().allow_bool_number_conversion {
                        if let Ok(value) = node.get_boolean() {
                            *self = value as u8 as $ty;
                        }
                        return;
                    }
                    match node.get_number::<$ty>() {
                        Ok(value) => *self = value,
                        Err(err) => de.fail(node, &err),
                    }
                }
            }
        )*
    };
}

impl_from_json_number!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl FromJson for char {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        let text = match node.get_str() {
            Ok(text) => text,
            Err(err) => return de.fail(node, &err),
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => *self = ch,
            _ => de.error(node, "expected 'string' node of length 1"),
        }
    }
}

impl FromJson for String {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        match node.get_str() {
            Ok(text) => {
                self.clear();
                self.push_str(&text);
            }
            Err(err) => de.fail(node, &err),
        }
    }
}

impl FromJson for SmolStr {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        match node.get_str() {
            Ok(text) => *self = SmolStr::new(text),
            Err(err) => de.fail(node, &err),
        }
    }
}

impl FromJson for Box<str> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        match node.get_str() {
            Ok(text) => *self = text.into_owned().into_boxed_str(),
            Err(err) => de.fail(node, &err),
        }
    }
}

impl FromJson for () {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        de.expect(node, NodeKind::Null);
    }
}

/// `null` clears the option. Anything else is read into the held value, or
/// into a fresh default. The default is kept even when something inside it
/// failed to read, and dropped only when the node itself has the wrong kind.
impl<T: FromJson + Default> FromJson for Option<T> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if node.is_null() {
            *self = None;
            return;
        }
        match self {
            Some(value) => value.read_json(node, de),
            None => {
                de.mismatch = None;
                let mut value = T::default();
                value.read_json(node, de);
                if de.mismatch != Some(node.index()) {
                    *self = Some(value);
                }
            }
        }
    }
}

impl<T: FromJson> FromJson for Box<T> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        (**self).read_json(node, de);
    }
}

fn read_elements<T, F>(node: Cursor<'_, '_>, de: &mut Deserializer<'_>, mut push: F)
where
    T: FromJson + Default,
    F: FnMut(T),
{
    for child in node.children() {
        let mut value = T::default();
        value.read_json(child, de);
        push(value);
    }
}

impl<T: FromJson + Default> FromJson for Vec<T> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Array) {
            return;
        }
        self.clear();
        self.reserve(node.child_count);
        read_elements(node, de, |value| self.push(value));
    }
}

impl<T: FromJson + Default> FromJson for VecDeque<T> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Array) {
            return;
        }
        self.clear();
        self.reserve(node.child_count);
        read_elements(node, de, |value| self.push_back(value));
    }
}

impl<T, S> FromJson for HashSet<T, S>
where
    T: FromJson + Default + Eq + Hash,
    S: BuildHasher,
{
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Array) {
            return;
        }
        self.clear();
        read_elements(node, de, |value| {
            self.insert(value);
        });
    }
}

impl<T: FromJson + Default + Ord> FromJson for BTreeSet<T> {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Array) {
            return;
        }
        self.clear();
        read_elements(node, de, |value| {
            self.insert(value);
        });
    }
}

/// Fixed-size arrays fill slot by slot. Short input leaves the remaining
/// slots alone (or resets them, see [`ReadConfig::default_initialize_missing`]);
/// long input is reported and the surplus ignored.
impl<T: FromJson + Default, const N: usize> FromJson for [T; N] {
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !de.expect(node, NodeKind::Array) {
            return;
        }
        let found = node.child_count;
        for (slot, child) in self.iter_mut().zip(node.children()) {
            slot.read_json(child, de);
        }
        if found < N {
            de.missing_data(
                node,
                &format!("missing data: expected {N} elements, found {found}"),
            );
            if de.config().default_initialize_missing {
                for slot in &mut self[found..] {
                    *slot = T::default();
                }
            }
        } else if found > N {
            de.extra_data(
                node,
                &format!("extra data: expected {N} elements, found {found}"),
            );
        }
    }
}

/// Checks the container shape a map with key type `K` is stored as.
fn expect_map_shape<K: MapKey>(node: Cursor<'_, '_>, de: &mut Deserializer<'_>) -> bool {
    let kind = if K::STRING_KEY {
        NodeKind::Object
    } else {
        NodeKind::Array
    };
    de.expect(node, kind)
}

fn read_map_entries<K, V, F>(node: Cursor<'_, '_>, de: &mut Deserializer<'_>, mut insert: F)
where
    K: MapKey + FromJson + Default,
    V: FromJson + Default,
    F: FnMut(K, V),
{
    if K::STRING_KEY {
        for (key_node, value_node) in node.entries() {
            let name = match key_node.get_str() {
                Ok(name) => name,
                Err(err) => {
                    de.fail(key_node, &err);
                    continue;
                }
            };
            let Some(key) = K::from_key(name) else {
                de.error(key_node, "object member name is not a valid key");
                continue;
            };
            let mut value = V::default();
            value.read_json(value_node, de);
            insert(key, value);
        }
        return;
    }

    for pair in node.children() {
        let mut items = pair.children();
        let (Some(key_node), Some(value_node), true) =
            (items.next(), items.next(), pair.is_array() && pair.child_count == 2)
        else {
            de.error(pair, "expected a [key, value] pair");
            continue;
        };
        let mut key = K::default();
        key.read_json(key_node, de);
        let mut value = V::default();
        value.read_json(value_node, de);
        insert(key, value);
    }
}

impl<K, V, S> FromJson for HashMap<K, V, S>
where
    K: MapKey + FromJson + Default + Eq + Hash,
    V: FromJson + Default,
    S: BuildHasher,
{
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !expect_map_shape::<K>(node, de) {
            return;
        }
        self.clear();
        read_map_entries(node, de, |key, value| {
            self.insert(key, value);
        });
    }
}

impl<K, V> FromJson for BTreeMap<K, V>
where
    K: MapKey + FromJson + Default + Ord,
    V: FromJson + Default,
{
    fn read_json(&mut self, node: Cursor<'_, '_>, de: &mut Deserializer<'_>) {
        if !expect_map_shape::<K>(node, de) {
            return;
        }
        self.clear();
        read_map_entries(node, de, |key, value| {
            self.insert(key, value);
        });
    }
}
