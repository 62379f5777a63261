// src/cache/string_cache.rs

//! Deduplicating, bidirectional string <-> dense id cache.
//!
//! Strings are kept in a vector sorted by a [`StringOrdering`], which gives
//! `O(log n)` lookup by string. A second vector, `indices`, maps an id to the
//! current position of its string in the sorted vector. Ids are handed out in
//! insertion order and never change; inserting a string only shifts the
//! *positions* stored in `indices`.
//!
//! Invariants (hold after every public operation):
//! - `strings.len() == indices.len()`
//! - `strings[indices[id]].id == id` for every issued id
//! - `strings` is sorted and holds no duplicates under the ordering

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::cache::lock::{CacheLock, LockKind, Shared};
use crate::errors::{PathWatchError, Result};
use crate::types::CacheId;

/// Comparison used to keep the string vector sorted.
pub trait StringOrdering {
    fn compare(a: &str, b: &str) -> Ordering;
}

/// Plain byte-wise ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexicographic;

/// Compares strings starting from their last byte.
///
/// Paths in one cache tend to share long prefixes, so comparing from the end
/// usually decides after a few bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOrder;

impl StringOrdering for Lexicographic {
    fn compare(a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

impl StringOrdering for ReverseOrder {
    fn compare(a: &str, b: &str) -> Ordering {
        a.bytes().rev().cmp(b.bytes().rev())
    }
}

/// One `(string, id)` row, as stored and as exchanged with `populate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCacheEntry<Id> {
    pub string: String,
    pub id: Id,
}

impl<Id> StringCacheEntry<Id> {
    pub fn new(string: impl Into<String>, id: Id) -> Self {
        Self {
            string: string.into(),
            id,
        }
    }
}

const UNASSIGNED: usize = usize::MAX;

/// The unlocked table behind a [`StringCache`].
pub struct StringTable<Id, O> {
    strings: Vec<StringCacheEntry<Id>>,
    indices: Vec<usize>,
    _ordering: PhantomData<O>,
}

impl<Id: CacheId, O: StringOrdering> StringTable<Id, O> {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            indices: Vec::new(),
            _ordering: PhantomData,
        }
    }

    fn find(&self, string: &str) -> std::result::Result<usize, usize> {
        self.strings
            .binary_search_by(|entry| O::compare(&entry.string, string))
    }

    fn string_id(&mut self, string: &str) -> Result<Id> {
        match self.find(string) {
            Ok(position) => Ok(self.strings[position].id),
            Err(position) => self.insert(position, string),
        }
    }

    fn insert(&mut self, position: usize, string: &str) -> Result<Id> {
        let id = Id::from_index(self.indices.len())?;

        self.strings
            .insert(position, StringCacheEntry::new(string, id));

        for index in self.indices.iter_mut() {
            if *index >= position {
                *index += 1;
            }
        }
        self.indices.push(position);

        Ok(id)
    }

    fn string(&self, id: Id) -> Result<&str> {
        self.indices
            .get(id.index())
            .and_then(|&position| self.strings.get(position))
            .map(|entry| entry.string.as_str())
            .ok_or(PathWatchError::UnknownId {
                kind: Id::KIND,
                id: id.index(),
            })
    }

    fn add_strings(&mut self, mut incoming: Vec<&str>) -> Result<usize> {
        incoming.sort_by(|a, b| O::compare(a, b));
        incoming.dedup_by(|a, b| O::compare(a, b) == Ordering::Equal);
        incoming.retain(|string| self.find(string).is_err());

        if incoming.is_empty() {
            return Ok(0);
        }

        let first_new = self.indices.len();
        // Fail before touching the table if the last id would not fit.
        Id::from_index(first_new + incoming.len() - 1)?;

        let old = std::mem::take(&mut self.strings);
        let mut merged = Vec::with_capacity(old.len() + incoming.len());
        let mut next_index = first_new;
        let mut old = old.into_iter().peekable();

        for string in incoming.iter() {
            while let Some(entry) = old.next_if(|entry| {
                O::compare(&entry.string, string) == Ordering::Less
            }) {
                merged.push(entry);
            }
            merged.push(StringCacheEntry::new(*string, Id::from_index(next_index)?));
            next_index += 1;
        }
        merged.extend(old);

        self.strings = merged;
        self.rebuild_indices();

        Ok(incoming.len())
    }

    fn rebuild_indices(&mut self) {
        self.indices.clear();
        self.indices.resize(self.strings.len(), UNASSIGNED);
        for (position, entry) in self.strings.iter().enumerate() {
            if let Some(slot) = self.indices.get_mut(entry.id.index()) {
                *slot = position;
            }
        }
    }

    fn unchecked_populate(&mut self, mut entries: Vec<StringCacheEntry<Id>>) -> Result<()> {
        entries.sort_by(|a, b| O::compare(&a.string, &b.string));

        let len = entries.len();
        if let Some(entry) = entries.iter().find(|entry| entry.id.index() >= len) {
            return Err(PathWatchError::CacheCorrupt(format!(
                "{} id {} is out of range for a table of {} strings",
                Id::KIND,
                entry.id.index(),
                len
            )));
        }

        self.strings = entries;
        self.rebuild_indices();

        // In range but repeated ids leave some id without a string.
        if let Some(missing) = self.indices.iter().position(|&slot| slot == UNASSIGNED) {
            return Err(PathWatchError::CacheCorrupt(format!(
                "{} id {} has no string (duplicate ids in table)",
                Id::KIND,
                missing
            )));
        }
        Ok(())
    }

    fn check_entries(&self) -> Result<()> {
        for entry in self.strings.iter() {
            let by_id = self.string(entry.id).ok();
            let by_string = self.find(&entry.string).ok().map(|pos| self.strings[pos].id);

            if by_id != Some(entry.string.as_str()) || by_string != Some(entry.id) {
                return Err(PathWatchError::CacheCorrupt(format!(
                    "{} entry {:?} -> {:?} does not round-trip",
                    Id::KIND,
                    entry.string,
                    entry.id
                )));
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.strings.clear();
        self.indices.clear();
    }
}

/// Thread-safety is chosen with `K` (see [`crate::cache::lock`]), the sort
/// order of the backing vector with `O`.
pub struct StringCache<Id, K: LockKind = Shared, O = Lexicographic> {
    table: K::Lock<StringTable<Id, O>>,
}

impl<Id, K, O> StringCache<Id, K, O>
where
    Id: CacheId,
    K: LockKind,
    O: StringOrdering,
{
    pub fn new() -> Self {
        Self {
            table: <K::Lock<StringTable<Id, O>> as CacheLock<_>>::new(StringTable::new()),
        }
    }

    /// Return the id for `string`, inserting it if it is not cached yet.
    pub fn string_id(&self, string: &str) -> Result<Id> {
        self.table.with(|table| table.string_id(string))
    }

    /// `string_id` over a collection, in input order. Equal strings map to
    /// equal ids, so the result may contain duplicates.
    pub fn string_ids<I, S>(&self, strings: I) -> Result<Vec<Id>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.table.with(|table| {
            strings
                .into_iter()
                .map(|string| table.string_id(string.as_ref()))
                .collect()
        })
    }

    /// Look up the string for an id issued by this cache.
    pub fn string(&self, id: Id) -> Result<String> {
        self.table.with(|table| table.string(id).map(str::to_owned))
    }

    pub fn strings(&self, ids: &[Id]) -> Result<Vec<String>> {
        self.table.with(|table| {
            ids.iter()
                .map(|&id| table.string(id).map(str::to_owned))
                .collect()
        })
    }

    /// Insert every string that is not cached yet in a single merge pass.
    ///
    /// New ids are assigned in the cache's sort order. Returns how many
    /// strings were added.
    pub fn add_strings<I, S>(&self, strings: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owned: Vec<S> = strings.into_iter().collect();
        let added = self
            .table
            .with(|table| table.add_strings(owned.iter().map(|s| s.as_ref()).collect()))?;
        debug!(kind = Id::KIND, added, "bulk-added strings to cache");
        Ok(added)
    }

    /// Replace the cache contents with a previously exported table and
    /// verify that every entry round-trips.
    ///
    /// Fails with [`PathWatchError::CacheCorrupt`] on any mismatch; the
    /// cache is left empty in that case.
    pub fn populate(&self, entries: Vec<StringCacheEntry<Id>>) -> Result<()> {
        self.table.with(|table| {
            let checked = table
                .unchecked_populate(entries)
                .and_then(|()| table.check_entries());
            if checked.is_err() {
                table.clear();
            }
            checked
        })
    }

    /// Like [`populate`](Self::populate) but trusts the table's strings.
    /// Ids must still cover `0..len` exactly once.
    pub fn unchecked_populate(&self, entries: Vec<StringCacheEntry<Id>>) -> Result<()> {
        self.table.with(|table| {
            let result = table.unchecked_populate(entries);
            if result.is_err() {
                table.clear();
            }
            result
        })
    }

    /// Snapshot of all `(string, id)` rows, ordered by id.
    pub fn entries(&self) -> Vec<StringCacheEntry<Id>> {
        self.table.with(|table| {
            let mut entries = table.strings.clone();
            entries.sort_by_key(|entry| entry.id);
            entries
        })
    }

    pub fn len(&self) -> usize {
        self.table.with(|table| table.indices.len())
    }

    pub fn is_empty(&self) -> bool {
        self.table.with(|table| table.strings.is_empty())
    }
}

impl<Id, K, O> Default for StringCache<Id, K, O>
where
    Id: CacheId,
    K: LockKind,
    O: StringOrdering,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, K, O> fmt::Debug for StringCache<Id, K, O>
where
    Id: CacheId,
    K: LockKind,
    O: StringOrdering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringCache")
            .field("kind", &Id::KIND)
            .field("len", &self.len())
            .finish()
    }
}
