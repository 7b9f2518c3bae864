//! Process-wide string interner backing [`Name`].
//!
//! Strings are leaked to `&'static str` on first insertion, so resolving a
//! `Name` never allocates and the returned slice outlives every graph.

use std::sync::LazyLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

static GLOBAL: LazyLock<StringInterner> = LazyLock::new(StringInterner::new);

struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// Index 0 is always the empty string.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    pub fn new() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        StringInterner {
            table: RwLock::new(InternTable {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// The interner used by [`Name::intern`].
    pub fn global() -> &'static StringInterner {
        &GLOBAL
    }

    /// Intern a string, returning its index.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s) {
                return Name::from_raw(index);
            }
        }

        let mut guard = self.table.write();
        // Another thread may have won the race between the two locks.
        if let Some(&index) = guard.map.get(s) {
            return Name::from_raw(index);
        }

        let Ok(index) = u32::try_from(guard.strings.len()) else {
            panic!("string interner exceeded {} entries", u32::MAX);
        };
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::from_raw(index)
    }

    /// Resolve a name interned by this interner.
    ///
    /// Names from a different interner resolve to the empty string when
    /// their index is out of range.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.table.read();
        guard.strings.get(name.index()).copied().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        // The empty string is always present.
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
