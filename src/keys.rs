//! Head key allocation and indexed-key parsing.
//!
//! Keys in a canonical `head` are only there for readability: the node's own
//! `rel` list is authoritative. When several nodes share a relation name the
//! allocator appends an index (`item[0]`, `item[1]`, ...) so that every key
//! stays unique.

/// Generates unique keys of the form `{base}{prefix}{index}{suffix}`.
///
/// Allocation is deterministic: the same base names offered in the same
/// order against the same occupied keys always produce the same keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAllocator<'a> {
    prefix: &'a str,
    suffix: &'a str,
    start: usize,
}

/// Allocator for `head` keys: `rel`, then `rel[0]`, `rel[1]`, ...
pub const HEAD_KEYS: KeyAllocator<'static> = KeyAllocator::new("[", "]", 0);

/// Allocator for renamed CURIE prefixes: `acme`, then `acme1`, `acme2`, ...
pub const CURIE_NAMES: KeyAllocator<'static> = KeyAllocator::new("", "", 1);

impl<'a> KeyAllocator<'a> {
    pub const fn new(prefix: &'a str, suffix: &'a str, start: usize) -> Self {
        Self {
            prefix,
            suffix,
            start,
        }
    }

    /// Return `base` if it is free, otherwise the first free indexed form
    /// starting at the allocator's start index.
    pub fn allocate(&self, base: &str, is_taken: impl Fn(&str) -> bool) -> String {
        if !is_taken(base) {
            return base.to_string();
        }
        self.first_free(base, self.start, is_taken)
    }

    /// Return the first free indexed form starting at `index`, never the bare base.
    ///
    /// Used for members of a collection so that their keys carry their position.
    pub fn allocate_indexed(
        &self,
        base: &str,
        index: usize,
        is_taken: impl Fn(&str) -> bool,
    ) -> String {
        self.first_free(base, index, is_taken)
    }

    /// Format a single candidate key.
    pub fn format(&self, base: &str, index: usize) -> String {
        format!("{}{}{}{}", base, self.prefix, index, self.suffix)
    }

    fn first_free(&self, base: &str, mut index: usize, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = self.format(base, index);
            if !is_taken(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

/// A head key split into its relation name and optional collection index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedKey<'a> {
    pub relation: &'a str,
    pub index: Option<usize>,
}

impl<'a> IndexedKey<'a> {
    /// Parse `name[index]`, where `name` is either free of brackets or a
    /// single bracketed CURIE (`[acme:widget][1]`). Anything else is a plain
    /// relation name.
    pub fn parse(key: &'a str) -> Self {
        Self::split(key).unwrap_or(Self {
            relation: key,
            index: None,
        })
    }

    /// The relation is written as a bracketed CURIE (`[prefix:local]`).
    pub fn is_safe_curie(&self) -> bool {
        bracketed(self.relation).is_some()
    }

    fn split(key: &'a str) -> Option<Self> {
        let inner = key.strip_suffix(']')?;
        let open = inner.rfind('[')?;
        let (name, digits) = (&inner[..open], &inner[open + 1..]);

        let bare = bracketed(name).unwrap_or(name);
        if bare.is_empty() || bare.contains(['[', ']']) {
            return None;
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            relation: name,
            index: Some(digits.parse().ok()?),
        })
    }
}

/// Contents of a `[...]` group spanning all of `name`.
fn bracketed(name: &str) -> Option<&str> {
    name.strip_prefix('[')?.strip_suffix(']')
}

/// Relation names for a node: its explicit list, else the name parsed from
/// an indexed key, else the key itself.
pub fn derive_relations(explicit: &[String], key: &str) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    vec![IndexedKey::parse(key).relation.to_string()]
}

/// Whether a key without explicit cardinality denotes a single value.
pub fn singular_from_key(key: &str) -> bool {
    IndexedKey::parse(key).index.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn taken(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn free_base_returned_unchanged() {
        let used = taken(&["other"]);
        assert_eq!(HEAD_KEYS.allocate("item", |k| used.contains(k)), "item");
    }

    #[test]
    fn taken_base_gets_first_free_index() {
        let used = taken(&["item", "item[0]", "item[1]"]);
        assert_eq!(HEAD_KEYS.allocate("item", |k| used.contains(k)), "item[2]");
    }

    #[test]
    fn indexed_allocation_never_returns_bare_base() {
        let used = taken(&[]);
        assert_eq!(
            HEAD_KEYS.allocate_indexed("item", 0, |k| used.contains(k)),
            "item[0]"
        );
    }

    #[test]
    fn indexed_allocation_skips_occupied_slots() {
        let used = taken(&["item[3]", "item[4]"]);
        assert_eq!(
            HEAD_KEYS.allocate_indexed("item", 3, |k| used.contains(k)),
            "item[5]"
        );
    }

    #[test]
    fn curie_names_start_at_one() {
        let used = taken(&["acme"]);
        assert_eq!(CURIE_NAMES.allocate("acme", |k| used.contains(k)), "acme1");
    }

    #[test]
    fn parse_indexed_key() {
        let key = IndexedKey::parse("item[12]");
        assert_eq!(key.relation, "item");
        assert_eq!(key.index, Some(12));
    }

    #[test]
    fn parse_plain_key() {
        let plain_keys = [
            "item", "item[]", "[0]", "[][0]", "item[x]", "a[b][0]", "[a[b]][0]", "item[0]x",
        ];
        for plain in plain_keys {
            let key = IndexedKey::parse(plain);
            assert_eq!(key.relation, plain, "{plain}");
            assert_eq!(key.index, None, "{plain}");
        }
    }

    #[test]
    fn parse_curie_key() {
        let key = IndexedKey::parse("acme:widget[1]");
        assert_eq!(key.relation, "acme:widget");
        assert_eq!(key.index, Some(1));
        assert!(!key.is_safe_curie());

        let key = IndexedKey::parse("[acme:widget][1]");
        assert_eq!(key.relation, "[acme:widget]");
        assert_eq!(key.index, Some(1));
        assert!(key.is_safe_curie());
    }

    #[test]
    fn allocated_safe_curie_keys_parse_back() {
        let used = taken(&[]);
        let key = HEAD_KEYS.allocate_indexed("[x:y]", 0, |k| used.contains(k));
        assert_eq!(key, "[x:y][0]");
        assert_eq!(derive_relations(&[], &key), vec!["[x:y]"]);
        assert!(!singular_from_key(&key));
    }

    #[test]
    fn derive_relations_priority() {
        assert_eq!(derive_relations(&["next".into()], "item[0]"), vec!["next"]);
        assert_eq!(derive_relations(&[], "item[0]"), vec!["item"]);
        assert_eq!(derive_relations(&[], "self"), vec!["self"]);
    }

    #[test]
    fn singular_follows_key_shape() {
        assert!(singular_from_key("self"));
        assert!(!singular_from_key("item[0]"));
    }
}
