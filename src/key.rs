use std::borrow::Cow;

use smol_str::SmolStr;

/// Types usable as map keys.
///
/// Maps whose key type has `STRING_KEY = true` are written as JSON objects.
/// Every other map becomes an array of two-element `[key, value]` arrays, so
/// the key goes through its regular `ToJson`/`FromJson` impls.
pub trait MapKey: Sized {
    const STRING_KEY: bool;

    /// Object member name for this key. Only called when `STRING_KEY` holds.
    fn key_str(&self) -> &str {
        ""
    }

    /// Builds a key from an unescaped object member name. Only called when
    /// `STRING_KEY` holds.
    fn from_key(_key: Cow<'_, str>) -> Option<Self> {
        None
    }
}

impl MapKey for String {
    const STRING_KEY: bool = true;

    fn key_str(&self) -> &str {
        self
    }

    fn from_key(key: Cow<'_, str>) -> Option<Self> {
        Some(key.into_owned())
    }
}

impl MapKey for SmolStr {
    const STRING_KEY: bool = true;

    fn key_str(&self) -> &str {
        self.as_str()
    }

    fn from_key(key: Cow<'_, str>) -> Option<Self> {
        Some(SmolStr::new(key))
    }
}

impl MapKey for Box<str> {
    const STRING_KEY: bool = true;

    fn key_str(&self) -> &str {
        self
    }

    fn from_key(key: Cow<'_, str>) -> Option<Self> {
        Some(key.into_owned().into_boxed_str())
    }
}

macro_rules! impl_pair_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                const STRING_KEY: bool = false;
            }
        )*
    };
}

impl_pair_key!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
