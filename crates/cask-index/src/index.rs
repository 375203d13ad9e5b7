//! The in-memory alias index of one namespace.
//!
//! [`AliasIndex`] keeps, per key, a vector of aliases already ordered by
//! `(rank, seq)`, so lookups are a clone of a sorted slice.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use cask_types::{ContentHash, HashedBlobRef};

use crate::alias::{validate_alias_key, Alias, PendingAlias};
use crate::error::IndexResult;

#[derive(Debug, Default)]
struct AliasTable {
    by_key: HashMap<String, Vec<Alias>>,
    next_seq: u64,
    total: usize,
}

/// Multi-valued, ordered secondary index from alias key to blob.
///
/// Aliases are attached in bulk when a blob is completed and leave only in
/// bulk when that blob is garbage collected; there is no single-alias
/// delete.
#[derive(Debug, Default)]
pub struct AliasIndex {
    table: RwLock<AliasTable>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach every alias in `aliases` to `target` under one lock
    /// acquisition. Returns the number inserted.
    pub fn insert_all(&self, target: &HashedBlobRef, aliases: &[PendingAlias]) -> usize {
        let assigned = self.assign(target, aliases);
        self.restore(assigned)
    }

    /// Give each pending alias its sequence number without making it
    /// visible. Lets a caller persist the aliases before [`Self::restore`].
    pub fn assign(&self, target: &HashedBlobRef, aliases: &[PendingAlias]) -> Vec<Alias> {
        if aliases.is_empty() {
            return Vec::new();
        }
        let mut table = self.table.write().expect("alias index lock poisoned");
        aliases
            .iter()
            .map(|pending| {
                let seq = table.next_seq;
                table.next_seq += 1;
                Alias {
                    key: pending.key.clone(),
                    rank: pending.rank,
                    target: target.clone(),
                    seq,
                }
            })
            .collect()
    }

    /// Insert aliases that already carry sequence numbers, from
    /// [`Self::assign`] or from storage. Returns the number inserted.
    pub fn restore(&self, aliases: Vec<Alias>) -> usize {
        if aliases.is_empty() {
            return 0;
        }
        let count = aliases.len();
        let mut table = self.table.write().expect("alias index lock poisoned");
        for alias in aliases {
            table.next_seq = table.next_seq.max(alias.seq + 1);
            let entries = table.by_key.entry(alias.key.clone()).or_default();
            let at = entries.partition_point(|a| (a.rank, a.seq) <= (alias.rank, alias.seq));
            entries.insert(at, alias);
        }
        table.total += count;
        debug!(count, "aliases recorded");
        count
    }

    /// Validate and attach a single alias.
    pub fn insert(&self, key: &str, rank: i32, target: &HashedBlobRef) -> IndexResult<()> {
        let pending = PendingAlias::new(key, rank)?;
        self.insert_all(target, std::slice::from_ref(&pending));
        Ok(())
    }

    /// All aliases for `key`, ascending by rank, ties in insertion order.
    pub fn find(&self, key: &str) -> IndexResult<Vec<Alias>> {
        validate_alias_key(key)?;
        let table = self.table.read().expect("alias index lock poisoned");
        Ok(table.by_key.get(key).cloned().unwrap_or_default())
    }

    /// Drop every alias whose target has `hash`. Returns how many went.
    pub fn remove_target(&self, hash: &ContentHash) -> usize {
        let mut table = self.table.write().expect("alias index lock poisoned");
        let mut removed = 0;
        table.by_key.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|a| a.target.hash != *hash);
            removed += before - entries.len();
            !entries.is_empty()
        });
        table.total -= removed;
        if removed > 0 {
            debug!(target_hash = %hash.short_hex(), removed, "aliases dropped");
        }
        removed
    }

    /// Total number of aliases across all keys.
    pub fn len(&self) -> usize {
        self.table.read().expect("alias index lock poisoned").total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of keys that currently have at least one alias.
    pub fn keys(&self) -> Vec<String> {
        let table = self.table.read().expect("alias index lock poisoned");
        let mut keys: Vec<String> = table.by_key.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_types::{Locator, NamespaceId};

    fn target(seed: &[u8]) -> HashedBlobRef {
        let ns = NamespaceId::new("default").unwrap();
        let hash = ContentHash::of(seed);
        HashedBlobRef::new(hash, Locator::for_blob(&ns, &hash))
    }

    fn pending(key: &str, rank: i32) -> PendingAlias {
        PendingAlias::new(key, rank).unwrap()
    }

    #[test]
    fn find_orders_by_rank() {
        let index = AliasIndex::new();
        let (a, b) = (target(b"a"), target(b"b"));
        index.insert_all(&a, &[pending("foo", 2)]);
        index.insert_all(&b, &[pending("foo", 1)]);

        let found = index.find("foo").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target, b);
        assert_eq!(found[0].rank, 1);
        assert_eq!(found[1].target, a);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = AliasIndex::new();
        let targets: Vec<_> = (0u8..5).map(|i| target(&[i])).collect();
        for t in &targets {
            index.insert_all(t, &[pending("same", 0)]);
        }
        index.insert_all(&target(b"low"), &[pending("same", -1)]);

        let found = index.find("same").unwrap();
        assert_eq!(found[0].target, target(b"low"));
        let rest: Vec<_> = found[1..].iter().map(|a| a.target.clone()).collect();
        assert_eq!(rest, targets);
    }

    #[test]
    fn same_target_may_appear_twice() {
        let index = AliasIndex::new();
        let t = target(b"dup");
        index.insert_all(&t, &[pending("foo", 2)]);
        index.insert_all(&t, &[pending("foo", 1)]);
        let found = index.find("foo").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].rank, 1);
        assert_eq!(found[1].rank, 2);
    }

    #[test]
    fn unknown_key_is_empty() {
        let index = AliasIndex::new();
        assert!(index.find("nothing").unwrap().is_empty());
        assert!(index.find("").is_err());
    }

    #[test]
    fn remove_target_drops_all_its_aliases() {
        let index = AliasIndex::new();
        let (a, b) = (target(b"a"), target(b"b"));
        index.insert_all(&a, &[pending("foo", 0), pending("bar", 0)]);
        index.insert_all(&b, &[pending("foo", 1)]);
        assert_eq!(index.len(), 3);

        assert_eq!(index.remove_target(&a.hash), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.keys(), vec!["foo".to_string()]);
        assert_eq!(index.find("foo").unwrap()[0].target, b);
        assert_eq!(index.remove_target(&a.hash), 0);
    }

    #[test]
    fn restored_aliases_keep_their_order() {
        let original = AliasIndex::new();
        let (a, b, c) = (target(b"a"), target(b"b"), target(b"c"));
        let mut saved = original.assign(&a, &[pending("k", 0)]);
        saved.extend(original.assign(&b, &[pending("k", 0)]));
        saved.extend(original.assign(&c, &[pending("k", -1)]));
        assert!(original.is_empty());

        let reloaded = AliasIndex::new();
        saved.reverse();
        assert_eq!(reloaded.restore(saved), 3);
        let order: Vec<_> = reloaded
            .find("k")
            .unwrap()
            .into_iter()
            .map(|alias| alias.target)
            .collect();
        assert_eq!(order, vec![c, a, b.clone()]);

        // New aliases sort after everything restored.
        reloaded.insert_all(&target(b"d"), &[pending("k", 0)]);
        assert_eq!(reloaded.find("k").unwrap()[3].target, target(b"d"));
    }

    #[test]
    fn insert_validates_key() {
        let index = AliasIndex::new();
        assert!(index.insert("", 0, &target(b"x")).is_err());
        assert!(index.is_empty());
        index.insert("ok", 0, &target(b"x")).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn alias_serializes() {
        let index = AliasIndex::new();
        index.insert("k", 3, &target(b"s")).unwrap();
        let alias = &index.find("k").unwrap()[0];
        let json = serde_json::to_string(alias).unwrap();
        let back: Alias = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, alias);
    }
}
