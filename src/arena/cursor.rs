use std::ops::Deref;

use super::{Document, Node, NodeKind, NO_SIBLING};

/// A node together with the document it lives in.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'d, 'a> {
    document: &'d Document<'a>,
    index: usize,
}

impl<'d, 'a> Cursor<'d, 'a> {
    pub(crate) fn new(document: &'d Document<'a>, index: usize) -> Self {
        Self { document, index }
    }

    pub fn document(&self) -> &'d Document<'a> {
        self.document
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn node(&self) -> &'d Node<'a> {
        &self.document.nodes()[self.index]
    }

    pub fn source(&self) -> &'a str {
        self.document.source()
    }

    /// Array elements in order. On objects this yields the member values.
    pub fn children(&self) -> Children<'d, 'a> {
        Children {
            entries: self.entries_raw(),
            object: self.is_object(),
        }
    }

    /// Object members as `(key, value)`. Empty for anything but objects.
    pub fn entries(&self) -> Entries<'d, 'a> {
        if self.is_object() {
            self.entries_raw()
        } else {
            Entries::empty(self.document)
        }
    }

    fn entries_raw(&self) -> Entries<'d, 'a> {
        let node = self.node();
        if !node.is_composite() || node.child_count == 0 {
            return Entries::empty(self.document);
        }
        Entries {
            document: self.document,
            next: node.first_child,
            remaining: node.child_count,
            paired: node.is_object(),
        }
    }

    pub fn at(&self, position: usize) -> Option<Cursor<'d, 'a>> {
        if !self.is_array() {
            return None;
        }
        self.children().nth(position)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First member value whose key equals `name` after unescaping.
    pub fn get(&self, name: &str) -> Option<Cursor<'d, 'a>> {
        self.entries()
            .find(|(key, _)| key_matches(key.node(), name))
            .map(|(_, value)| value)
    }
}

impl<'d, 'a> Deref for Cursor<'d, 'a> {
    type Target = Node<'a>;

    fn deref(&self) -> &Self::Target {
        self.node()
    }
}

/// Compares a key node against a plain name without allocating when the key
/// token holds no escapes.
pub(crate) fn key_matches(key: &Node<'_>, name: &str) -> bool {
    if key.kind != NodeKind::String || key.token.len() < 2 {
        return false;
    }
    let raw = &key.token[1..key.token.len() - 1];
    if memchr::memchr(b'\\', raw.as_bytes()).is_none() {
        return raw == name;
    }
    match key.get_str() {
        Ok(unescaped) => unescaped == name,
        Err(_) => false,
    }
}

/// Walks a sibling chain. For objects it steps over key/value pairs.
#[derive(Debug, Clone)]
pub struct Entries<'d, 'a> {
    document: &'d Document<'a>,
    next: usize,
    remaining: usize,
    paired: bool,
}

impl<'d, 'a> Entries<'d, 'a> {
    fn empty(document: &'d Document<'a>) -> Self {
        Self {
            document,
            next: NO_SIBLING,
            remaining: 0,
            paired: false,
        }
    }

    fn step(&mut self) -> Option<(usize, usize)> {
        if self.remaining == 0 || self.next == NO_SIBLING {
            return None;
        }
        let nodes = self.document.nodes();
        let first = self.next;
        let second = if self.paired {
            let key = nodes.get(first)?;
            if key.next_sibling == NO_SIBLING {
                self.remaining = 0;
                return None;
            }
            key.next_sibling
        } else {
            first
        };
        let last = nodes.get(second)?;
        self.next = last.next_sibling;
        self.remaining -= 1;
        Some((first, second))
    }
}

impl<'d, 'a> Iterator for Entries<'d, 'a> {
    type Item = (Cursor<'d, 'a>, Cursor<'d, 'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.step()?;
        Some((
            Cursor::new(self.document, key),
            Cursor::new(self.document, value),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[derive(Debug, Clone)]
pub struct Children<'d, 'a> {
    entries: Entries<'d, 'a>,
    object: bool,
}

impl<'d, 'a> Iterator for Children<'d, 'a> {
    type Item = Cursor<'d, 'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, second) = self.entries.step()?;
        let index = if self.object { second } else { first };
        Some(Cursor::new(self.entries.document, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use crate::read_ref;

    #[rstest::rstest]
    fn test_children_follow_sibling_chain() {
        let doc = read_ref("[1, [2, 3], 4]");
        let root = doc.root().unwrap();
        let tokens: Vec<&str> = root.children().map(|c| c.token).collect();
        assert_eq!(tokens, vec!["1", "[2, 3]", "4"]);
    }

    #[rstest::rstest]
    fn test_object_lookup() {
        let doc = read_ref(r#"{"a": 1, "b\"c": {"d": null}, "e": [true]}"#);
        let root = doc.root().unwrap();
        assert!(root.has_child("a"));
        assert!(root.has_child("b\"c"));
        assert!(!root.has_child("d"));
        assert_eq!(root.get("a").unwrap().get_int().unwrap(), 1);
        assert!(root.get("b\"c").unwrap().get("d").unwrap().is_null());
        assert!(root.get("e").unwrap().at(0).unwrap().get_boolean().unwrap());
        assert!(root.get("e").unwrap().at(1).is_none());
    }

    #[rstest::rstest]
    fn test_entries_yield_pairs() {
        let doc = read_ref(r#"{"x": 1, "y": 2}"#);
        let root = doc.root().unwrap();
        let pairs: Vec<(String, i32)> = root
            .entries()
            .map(|(k, v)| (k.get_string().unwrap(), v.get_int().unwrap()))
            .collect();
        assert_eq!(pairs, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
        let values: Vec<i32> = root.children().map(|v| v.get_int().unwrap()).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[rstest::rstest]
    fn test_leaves_have_no_children() {
        let doc = read_ref("\"text\"");
        let root = doc.root().unwrap();
        assert_eq!(root.children().count(), 0);
        assert_eq!(root.entries().count(), 0);
        assert!(root.get("text").is_none());
    }
}
