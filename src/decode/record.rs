use smallvec::SmallVec;

use crate::arena::{key_matches, Cursor};
use crate::decode::reader::{Deserializer, FromJson};

/// Reads named fields out of one object node.
///
/// Every lookup scans the members front to back and takes the first key that
/// matches. [`RecordReader::finish`] then reports members no field asked for.
pub struct RecordReader<'x, 'r, 'd, 'a> {
    de: &'x mut Deserializer<'r>,
    node: Cursor<'d, 'a>,
    consumed: SmallVec<[bool; 16]>,
}

impl<'x, 'r, 'd, 'a> RecordReader<'x, 'r, 'd, 'a> {
    pub(crate) fn new(de: &'x mut Deserializer<'r>, node: Cursor<'d, 'a>) -> Self {
        Self {
            de,
            node,
            consumed: SmallVec::from_elem(false, node.child_count),
        }
    }

    pub fn node(&self) -> Cursor<'d, 'a> {
        self.node
    }

    pub fn deserializer(&mut self) -> &mut Deserializer<'r> {
        self.de
    }

    /// Reads member `name` into `target`. A missing member is reported per
    /// [`ReadConfig`](crate::ReadConfig) and leaves `target` as it was unless
    /// default initialization is on.
    pub fn field<T: FromJson + Default>(&mut self, name: &str, target: &mut T) {
        let found = self
            .node
            .entries()
            .enumerate()
            .find(|(_, (key, _))| key_matches(key.node(), name));
        match found {
            Some((position, (_, value))) => {
                self.consumed[position] = true;
                target.read_json(value, self.de);
            }
            None => {
                self.de
                    .missing_data(self.node, &format!("missing data: no member named '{name}'"));
                if self.de.config().default_initialize_missing {
                    *target = T::default();
                }
            }
        }
    }

    /// Reports every member no [`RecordReader::field`] call consumed.
    pub fn finish(self) {
        if !self.de.config().warn_on_extra_data || !self.consumed.contains(&false) {
            return;
        }
        for (position, (key, _)) in self.node.entries().enumerate() {
            if self.consumed[position] {
                continue;
            }
            let name = key.get_str().unwrap_or_default();
            self.de
                .extra_data(key, &format!("extra data: unexpected member '{name}'"));
        }
    }
}
