//! String interning to dense sequential ids.
//!
//! The table is a key-sorted vector searched with binary search. New keys
//! are inserted in place so the vector stays sorted; nothing is ever removed.

/// One interned key and its assigned value
#[derive(Debug, Clone, PartialEq, Eq)]
struct Symbol {
    key: String,
    value: usize,
}

/// Sorted symbol table with insert-or-fetch enumeration
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table and enumerate `keys` in order
    pub fn seeded(keys: &[&str]) -> Self {
        let mut table = Self::new();
        for key in keys {
            table.enumerate(key);
        }
        table
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, key: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|s| s.key.as_str().cmp(key))
    }

    /// Value for `key`, or `default` if the key was never seen
    pub fn get(&self, key: &str, default: usize) -> usize {
        match self.search(key) {
            Ok(i) => self.entries[i].value,
            Err(_) => default,
        }
    }

    /// Assign `value` to `key`, inserting the key if needed
    pub fn set(&mut self, key: &str, value: usize) {
        match self.search(key) {
            Ok(i) => self.entries[i].value = value,
            Err(i) => self.entries.insert(
                i,
                Symbol {
                    key: key.to_string(),
                    value,
                },
            ),
        }
    }

    /// Insert-or-fetch
    ///
    /// **Public** - the foundation of every enumeration pass
    ///
    /// The first sighting of `key` gets the next unused sequential value
    /// (the current key count); later sightings return the same value.
    ///
    /// # Example
    /// ```
    /// use smaps_filter::utils::symtab::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    /// assert_eq!(table.enumerate("libc.so"), 0);
    /// assert_eq!(table.enumerate("[heap]"), 1);
    /// assert_eq!(table.enumerate("libc.so"), 0);
    /// ```
    pub fn enumerate(&mut self, key: &str) -> usize {
        match self.search(key) {
            Ok(i) => self.entries[i].value,
            Err(i) => {
                let value = self.entries.len();
                self.entries.insert(
                    i,
                    Symbol {
                        key: key.to_string(),
                        value,
                    },
                );
                value
            }
        }
    }

    /// Reassign values 0..len-1 in ascending key order
    ///
    /// Used when ids from independent enumeration runs must be comparable.
    pub fn renumber(&mut self) {
        for (i, symbol) in self.entries.iter_mut().enumerate() {
            symbol.value = i;
        }
    }

    /// Reverse lookup array: `names[value] == key`
    ///
    /// Only meaningful when values are dense (after `enumerate` or
    /// `renumber`); a value outside 0..len is skipped.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.entries.len()];
        for symbol in &self.entries {
            if let Some(slot) = names.get_mut(symbol.value) {
                *slot = symbol.key.clone();
            }
        }
        names
    }

    /// Iterate `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|s| (s.key.as_str(), s.value))
    }
}
