//! GraphemeHash: linear-hashing table keyed by grapheme strings.
//!
//! Entries live in a generational arena and chains link them by arena key,
//! so nothing in the table depends on an entry's address. Buckets live in
//! power-of-two segments; adding a bucket never moves existing heads.
//!
//! Growth splits one bucket per insert at most. With `low` buckets in the
//! current round and `split` of them already split, a hash `h` lives in
//! `h & (low - 1)`, or in `h & (2 * low - 1)` when that first position is
//! below `split`.

use crate::error::KeyTypeError;
use crate::exclusive::DebugExclusive;
use crate::gc::{Trace, Worklist};
use crate::grapheme::GraphemeString;
use core::hash::BuildHasher;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use std::rc::Rc;
use tracing::{debug, trace};

/// A managed reference that may be offered as a key.
///
/// Only concrete strings are keys; anything else answers `None` and is
/// rejected with [`KeyTypeError`].
pub trait KeyRef {
    fn as_grapheme_str(&self) -> Option<&GraphemeString>;
}

impl KeyRef for GraphemeString {
    fn as_grapheme_str(&self) -> Option<&GraphemeString> {
        Some(self)
    }
}

impl KeyRef for Rc<GraphemeString> {
    fn as_grapheme_str(&self) -> Option<&GraphemeString> {
        Some(self)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    /// log2 of the starting bucket count.
    pub initial_bits: u32,
    /// Average chain length that triggers a split.
    pub max_load: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_bits: 6,
            max_load: 1,
        }
    }
}

/// Snapshot of the table's shape.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableStats {
    pub count: usize,
    pub buckets: usize,
    pub low_buckets: usize,
    pub split: usize,
    /// Bucket splits performed since creation or the last `free`.
    pub splits: u64,
}

#[derive(Debug)]
struct Entry<R> {
    key: R,
    value: R,
    hash: u64,
    bucket: usize,
    next: Option<DefaultKey>,
}

/// Bucket segments, chains and the entry arena. Knows nothing of hashing.
#[derive(Debug)]
struct Buckets<R> {
    initial_bits: u32,
    max_load: usize,
    segments: Vec<Vec<Option<DefaultKey>>>,
    low_bits: u32,
    split: usize,
    slots: SlotMap<DefaultKey, Entry<R>>,
    splits: u64,
}

impl<R> Buckets<R> {
    fn new(config: TableConfig) -> Self {
        Self {
            initial_bits: config.initial_bits,
            max_load: config.max_load,
            segments: vec![vec![None; 1 << config.initial_bits]],
            low_bits: config.initial_bits,
            split: 0,
            slots: SlotMap::with_key(),
            splits: 0,
        }
    }

    #[inline]
    fn low_buckets(&self) -> usize {
        1 << self.low_bits
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.low_buckets() + self.split
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        let low = self.low_buckets();
        let h = hash as usize;
        let pos = h & (low - 1);
        if pos < self.split {
            h & (2 * low - 1)
        } else {
            pos
        }
    }

    // Segment 0 holds the initial buckets; segment k >= 1 holds positions
    // [2^(bits+k-1), 2^(bits+k)).
    #[inline]
    fn locate(&self, pos: usize) -> (usize, usize) {
        let bits = self.initial_bits;
        if pos < 1 << bits {
            (0, pos)
        } else {
            let top = usize::BITS - 1 - pos.leading_zeros();
            ((top - bits + 1) as usize, pos - (1 << top))
        }
    }

    #[inline]
    fn head(&self, pos: usize) -> Option<DefaultKey> {
        let (seg, idx) = self.locate(pos);
        self.segments[seg][idx]
    }

    #[inline]
    fn head_mut(&mut self, pos: usize) -> &mut Option<DefaultKey> {
        let (seg, idx) = self.locate(pos);
        &mut self.segments[seg][idx]
    }

    // Returns (predecessor, entry) for the first entry in bucket `pos`
    // accepted by `eq`.
    fn find_in<F>(&self, pos: usize, hash: u64, mut eq: F) -> Option<(Option<DefaultKey>, DefaultKey)>
    where
        F: FnMut(&R) -> bool,
    {
        let mut prev = None;
        let mut cur = self.head(pos);
        while let Some(k) = cur {
            let e = self.slots.get(k)?;
            if e.hash == hash && eq(&e.key) {
                return Some((prev, k));
            }
            prev = Some(k);
            cur = e.next;
        }
        None
    }

    fn link_tail(&mut self, pos: usize, k: DefaultKey) {
        let mut cur = self.head(pos);
        let Some(mut tail) = cur else {
            *self.head_mut(pos) = Some(k);
            return;
        };
        while let Some(t) = cur {
            tail = t;
            cur = self.slots[t].next;
        }
        self.slots[tail].next = Some(k);
    }

    // Allocates and links a fresh entry, then gives the split policy its step.
    fn insert_new(&mut self, hash: u64, key: R, value: R) {
        let bucket = self.bucket_of(hash);
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            bucket,
            next: None,
        });
        self.link_tail(bucket, k);
        if self.slots.len() > self.bucket_count().saturating_mul(self.max_load) {
            self.split_one();
        }
    }

    /// Redistributes bucket `split` between itself and `split + low`.
    fn split_one(&mut self) {
        let low = self.low_buckets();
        let from = self.split;
        let to = from + low;

        let (seg, idx) = self.locate(to);
        if seg == self.segments.len() {
            debug!(low_buckets = low, "grapheme hash: adding bucket segment");
            self.segments.push(Vec::with_capacity(low));
        }
        debug_assert_eq!(self.segments[seg].len(), idx);
        self.segments[seg].push(None);

        let mask = 2 * low - 1;
        let mut cur = self.head_mut(from).take();
        let mut tails: [Option<DefaultKey>; 2] = [None, None];
        let mut moved = 0usize;
        while let Some(k) = cur {
            let e = &mut self.slots[k];
            cur = e.next.take();
            let dest = (e.hash as usize) & mask;
            debug_assert!(dest == from || dest == to);
            e.bucket = dest;
            let side = usize::from(dest == to);
            moved += side;
            match tails[side] {
                Some(t) => self.slots[t].next = Some(k),
                None => *self.head_mut(dest) = Some(k),
            }
            tails[side] = Some(k);
        }

        self.split += 1;
        self.splits += 1;
        trace!(from, to, moved, "grapheme hash: split bucket");
        if self.split == low {
            self.low_bits += 1;
            self.split = 0;
        }
    }

    fn unlink(&mut self, pos: usize, prev: Option<DefaultKey>, k: DefaultKey) -> Option<Entry<R>> {
        let entry = self.slots.remove(k)?;
        match prev {
            Some(p) => self.slots[p].next = entry.next,
            None => *self.head_mut(pos) = entry.next,
        }
        Some(entry)
    }

    // Bucket-order walk over live entries.
    fn for_each_entry<'a>(&'a self, mut f: impl FnMut(&'a Entry<R>)) {
        for pos in 0..self.bucket_count() {
            let mut cur = self.head(pos);
            while let Some(k) = cur {
                let e = &self.slots[k];
                f(e);
                cur = e.next;
            }
        }
    }

    /// Removes every chained entry; returns how many were released.
    fn drain_chains(&mut self) -> usize {
        let mut freed = 0usize;
        for pos in 0..self.bucket_count() {
            let mut cur = self.head_mut(pos).take();
            while let Some(k) = cur {
                cur = self.slots.remove(k).and_then(|e| e.next);
                freed += 1;
            }
        }
        freed
    }
}

pub struct GraphemeHash<R, S = RandomState> {
    hasher: S,
    config: TableConfig,
    buckets: Buckets<R>,
    exclusive: DebugExclusive,
}

impl<R: KeyRef> GraphemeHash<R> {
    pub fn new() -> Self {
        Self::with_config_and_hasher(TableConfig::default(), RandomState::new())
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<R: KeyRef> Default for GraphemeHash<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket-order iterator over `(key, value)`.
pub struct Iter<'a, R> {
    buckets: &'a Buckets<R>,
    pos: usize,
    cur: Option<DefaultKey>,
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = (&'a R, &'a R);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let e = &self.buckets.slots[k];
                self.cur = e.next;
                return Some((&e.key, &e.value));
            }
            if self.pos >= self.buckets.bucket_count() {
                return None;
            }
            self.cur = self.buckets.head(self.pos);
            self.pos += 1;
        }
    }
}

impl<R, S> GraphemeHash<R, S>
where
    R: KeyRef,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        let config = TableConfig {
            initial_bits: config.initial_bits.clamp(1, usize::BITS - 2),
            max_load: config.max_load.max(1),
        };
        Self {
            hasher,
            config,
            buckets: Buckets::new(config),
            exclusive: DebugExclusive::new(),
        }
    }

    /// Live entries. Constant time.
    #[inline]
    pub fn count(&self) -> usize {
        self.buckets.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.slots.is_empty()
    }

    /// Buckets currently addressable: every low bucket plus the split ones.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    pub fn config(&self) -> TableConfig {
        self.config
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            count: self.count(),
            buckets: self.buckets.bucket_count(),
            low_buckets: self.buckets.low_buckets(),
            split: self.buckets.split,
            splits: self.buckets.splits,
        }
    }

    fn hash_str(&self, key: &GraphemeString) -> u64 {
        self.hasher.hash_one(key)
    }

    fn find_str(&self, key: &GraphemeString) -> Option<(usize, Option<DefaultKey>, DefaultKey)> {
        let hash = self.hash_str(key);
        let pos = self.buckets.bucket_of(hash);
        let (prev, k) = self
            .buckets
            .find_in(pos, hash, |r| r.as_grapheme_str() == Some(key))?;
        Some((pos, prev, k))
    }

    /// Binds `key` to `value`.
    ///
    /// An existing entry with an equal key gets both the new key and the
    /// new value, and the old value is returned. Otherwise a new entry is
    /// added and at most one bucket is split.
    pub fn insert_or_update(&mut self, key: R, value: R) -> Result<Option<R>, KeyTypeError> {
        let _g = self.exclusive.enter("insert_or_update");
        let s = key.as_grapheme_str().ok_or(KeyTypeError)?;
        let hash = self.hasher.hash_one(s);
        let pos = self.buckets.bucket_of(hash);
        match self.buckets.find_in(pos, hash, |r| r.as_grapheme_str() == Some(s)) {
            Some((_, k)) => {
                let e = &mut self.buckets.slots[k];
                e.key = key;
                Ok(Some(core::mem::replace(&mut e.value, value)))
            }
            None => {
                self.buckets.insert_new(hash, key, value);
                Ok(None)
            }
        }
    }

    /// Value bound to a key equal to `key`.
    pub fn lookup(&self, key: &R) -> Result<Option<&R>, KeyTypeError> {
        let s = key.as_grapheme_str().ok_or(KeyTypeError)?;
        Ok(self.lookup_str(s))
    }

    pub fn lookup_str(&self, key: &GraphemeString) -> Option<&R> {
        let _g = self.exclusive.enter("lookup");
        let (_, _, k) = self.find_str(key)?;
        self.buckets.slots.get(k).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &GraphemeString) -> Option<&mut R> {
        let _g = self.exclusive.enter("get_mut");
        let (_, _, k) = self.find_str(key)?;
        self.buckets.slots.get_mut(k).map(|e| &mut e.value)
    }

    pub fn contains(&self, key: &R) -> Result<bool, KeyTypeError> {
        let s = key.as_grapheme_str().ok_or(KeyTypeError)?;
        Ok(self.contains_str(s))
    }

    pub fn contains_str(&self, key: &GraphemeString) -> bool {
        let _g = self.exclusive.enter("contains");
        self.find_str(key).is_some()
    }

    /// Unlinks and frees the entry for `key`, returning its key and value.
    /// An absent key is not an error.
    pub fn delete(&mut self, key: &R) -> Result<Option<(R, R)>, KeyTypeError> {
        let s = key.as_grapheme_str().ok_or(KeyTypeError)?;
        Ok(self.delete_str(s))
    }

    pub fn delete_str(&mut self, key: &GraphemeString) -> Option<(R, R)> {
        let _g = self.exclusive.enter("delete");
        let (pos, prev, k) = self.find_str(key)?;
        let entry = self.buckets.unlink(pos, prev, k)?;
        Some((entry.key, entry.value))
    }

    /// Copies the table: fresh entries and chains, aliased keys and values.
    ///
    /// Entries are re-placed by the hash cached in the source; keys are
    /// immutable once hashed, so recomputing would give the same value.
    pub fn deep_copy(&self) -> Self
    where
        R: Clone,
        S: Clone,
    {
        let _g = self.exclusive.enter("deep_copy");
        let mut dest = Self::with_config_and_hasher(self.config, self.hasher.clone());
        self.buckets.for_each_entry(|e| {
            dest.buckets.insert_new(e.hash, e.key.clone(), e.value.clone());
        });
        debug!(count = dest.count(), "grapheme hash: deep copy");
        dest
    }

    /// Reports every live key and value, key first, to `worklist`.
    pub fn mark<'a>(&'a self, worklist: &mut Worklist<'a, R>) {
        let _g = self.exclusive.enter("mark");
        self.buckets.for_each_entry(|e| {
            worklist.add(&e.key);
            worklist.add(&e.value);
        });
    }

    /// Releases every entry and the bucket storage. The table is empty and
    /// back at its initial size afterwards.
    pub fn free(&mut self) {
        let _g = self.exclusive.enter("free");
        let buckets = self.buckets.bucket_count();
        let freed = self.buckets.drain_chains();
        debug_assert!(self.buckets.slots.is_empty(), "entries outside any valid bucket");
        debug!(freed, buckets, "grapheme hash: free");
        self.buckets = Buckets::new(self.config);
    }

    /// Reserved for key and value type constraints; currently accepts anything.
    pub fn compose(&mut self, _info: &R) {}

    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            buckets: &self.buckets,
            pos: 0,
            cur: None,
        }
    }

    /// Panics unless every entry sits in the bucket its hash maps to and
    /// the chains hold exactly `count()` entries.
    pub fn assert_invariants(&self) {
        let b = &self.buckets;
        assert_eq!(b.bucket_count(), b.segments.iter().map(Vec::len).sum::<usize>());
        let mut reachable = 0usize;
        for pos in 0..b.bucket_count() {
            let mut cur = b.head(pos);
            while let Some(k) = cur {
                let e = &b.slots[k];
                assert_eq!(e.bucket, pos, "stale bucket index");
                assert_eq!(b.bucket_of(e.hash), pos, "entry in wrong bucket");
                reachable += 1;
                cur = e.next;
            }
        }
        assert_eq!(reachable, self.count(), "unreachable or double-linked entries");
    }
}

impl<R, S> Trace<R> for GraphemeHash<R, S>
where
    R: KeyRef,
    S: BuildHasher,
{
    fn trace<'a>(&'a self, worklist: &mut Worklist<'a, R>) {
        self.mark(worklist);
    }
}

impl<R, S> Clone for GraphemeHash<R, S>
where
    R: KeyRef + Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    fn gs(s: &str) -> Rc<GraphemeString> {
        Rc::new(GraphemeString::from_codepoints(s.chars().map(u32::from)))
    }

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    // Every key lands in bucket 0.
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: binding an equal key replaces key and value; count is unchanged.
    #[test]
    fn rebinding_replaces_key_and_value() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::new();
        let k1 = gs("k");
        let k2 = gs("k");
        assert_eq!(m.insert_or_update(k1.clone(), gs("one")).unwrap(), None);
        let old = m.insert_or_update(k2.clone(), gs("two")).unwrap();
        assert_eq!(old.as_deref(), Some(&*gs("one")));
        assert_eq!(m.count(), 1);
        assert_eq!(m.lookup_str(&k1).map(|v| &**v), Some(&*gs("two")));

        // last writer wins for the key reference too
        let (stored_key, _) = m.iter().next().unwrap();
        assert!(Rc::ptr_eq(stored_key, &k2));
    }

    /// Invariant: keys compare by content, not identity.
    #[test]
    fn lookup_is_by_content() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::new();
        m.insert_or_update(gs("alpha"), gs("1")).unwrap();
        assert!(m.contains_str(&gs("alpha")));
        assert!(!m.contains_str(&gs("alph")));
        assert!(m.lookup(&gs("beta")).unwrap().is_none());
    }

    /// Invariant: delete unlinks from the middle of a collision chain without
    /// disturbing its neighbours; deleting an absent key is a no-op.
    #[test]
    fn delete_within_collision_chain() {
        let mut m: GraphemeHash<Rc<GraphemeString>, ConstBuildHasher> =
            GraphemeHash::with_hasher(ConstBuildHasher);
        for k in ["a", "b", "c"] {
            m.insert_or_update(gs(k), gs(k)).unwrap();
        }
        let (k, v) = m.delete_str(&gs("b")).expect("present");
        assert_eq!((&*k, &*v), (&*gs("b"), &*gs("b")));
        assert!(m.delete_str(&gs("b")).is_none());
        assert_eq!(m.count(), 2);
        assert!(m.contains_str(&gs("a")));
        assert!(m.contains_str(&gs("c")));
        m.assert_invariants();

        m.delete_str(&gs("a")).unwrap();
        m.delete_str(&gs("c")).unwrap();
        assert!(m.is_empty());
        m.assert_invariants();
    }

    /// Invariant: splitting keeps every entry findable and in its home bucket.
    #[test]
    fn growth_splits_buckets_incrementally() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::with_config(TableConfig {
            initial_bits: 2,
            max_load: 1,
        });
        for i in 0..1000 {
            let before = m.stats().splits;
            m.insert_or_update(gs(&format!("k{i}")), gs(&i.to_string())).unwrap();
            assert!(m.stats().splits - before <= 1);
        }
        let stats = m.stats();
        assert_eq!(stats.count, 1000);
        assert!(stats.buckets >= 1000);
        assert_eq!(stats.buckets, stats.low_buckets + stats.split);
        m.assert_invariants();
        for i in 0..1000 {
            assert_eq!(
                m.lookup_str(&gs(&format!("k{i}"))).map(|v| &**v),
                Some(&*gs(&i.to_string()))
            );
        }
    }

    /// Invariant: deletes never shrink the bucket array.
    #[test]
    fn deletes_do_not_shrink() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::new();
        for i in 0..500 {
            m.insert_or_update(gs(&format!("{i}")), gs("v")).unwrap();
        }
        let grown = m.bucket_count();
        for i in 0..500 {
            m.delete_str(&gs(&format!("{i}"))).unwrap();
        }
        assert_eq!(m.count(), 0);
        assert_eq!(m.bucket_count(), grown);
    }

    /// Invariant: the copy has its own entries; keys and values are aliased.
    #[test]
    fn deep_copy_aliases_refs_but_not_entries() {
        let mut m: GraphemeHash<Rc<GraphemeString>, ConstBuildHasher> =
            GraphemeHash::with_hasher(ConstBuildHasher);
        for k in ["x", "y", "z"] {
            m.insert_or_update(gs(k), gs(k)).unwrap();
        }
        let mut c = m.deep_copy();
        let order = |t: &GraphemeHash<Rc<GraphemeString>, ConstBuildHasher>| {
            t.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>()
        };
        let (src, dst) = (order(&m), order(&c));
        assert_eq!(src.len(), 3);
        for (a, b) in src.iter().zip(&dst) {
            assert!(Rc::ptr_eq(a, b), "chain order and aliasing preserved");
        }

        c.delete_str(&gs("x")).unwrap();
        c.insert_or_update(gs("w"), gs("w")).unwrap();
        assert!(m.contains_str(&gs("x")));
        assert!(!m.contains_str(&gs("w")));
        assert_eq!(m.count(), 3);
        c.assert_invariants();
    }

    /// Invariant: mark reports each live key and value exactly once.
    #[test]
    fn mark_reports_every_reference_once() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::with_config(TableConfig {
            initial_bits: 1,
            max_load: 1,
        });
        for i in 0..100 {
            m.insert_or_update(gs(&format!("k{i}")), gs(&format!("v{i}"))).unwrap();
        }
        for i in (0..100).step_by(3) {
            m.delete_str(&gs(&format!("k{i}")));
        }
        let mut wl = Worklist::new();
        m.trace(&mut wl);
        assert_eq!(wl.len(), 2 * m.count());
        let seen: BTreeSet<*const GraphemeString> = wl.iter().map(Rc::as_ptr).collect();
        assert_eq!(seen.len(), wl.len());
    }

    /// Invariant: free releases everything and leaves a usable empty table.
    #[test]
    fn free_resets_to_initial_shape() {
        let mut m: GraphemeHash<Rc<GraphemeString>> = GraphemeHash::new();
        let initial = m.stats();
        for i in 0..300 {
            m.insert_or_update(gs(&format!("{i}")), gs("v")).unwrap();
        }
        let v = gs("shared");
        m.insert_or_update(gs("held"), v.clone()).unwrap();
        assert_eq!(Rc::strong_count(&v), 2);

        m.free();
        assert_eq!(m.stats(), initial);
        assert_eq!(Rc::strong_count(&v), 1);
        m.insert_or_update(gs("again"), gs("v")).unwrap();
        assert_eq!(m.count(), 1);
        m.assert_invariants();
    }

    /// Invariant (debug-only): a hasher that calls back into its own table
    /// trips the exclusive-access guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_hasher_panics() {
        use std::cell::Cell;

        thread_local! {
            static TABLE: Cell<*const GraphemeHash<Rc<GraphemeString>, Reenter>> =
                const { Cell::new(core::ptr::null()) };
        }

        #[derive(Clone, Default)]
        struct Reenter;
        struct ReenterHasher;
        impl BuildHasher for Reenter {
            type Hasher = ReenterHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ReenterHasher
            }
        }
        impl Hasher for ReenterHasher {
            fn write(&mut self, _bytes: &[u8]) {
                let t = TABLE.with(|c| c.get());
                if !t.is_null() {
                    // Safety: the table outlives the call that is hashing with us.
                    unsafe {
                        let _ = (*t).count();
                        let _ = (*t).contains_str(&GraphemeString::new());
                    }
                }
            }
            fn finish(&self) -> u64 {
                0
            }
        }

        let mut m: GraphemeHash<Rc<GraphemeString>, Reenter> = GraphemeHash::with_hasher(Reenter);
        TABLE.with(|c| c.set(&m as *const _));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.insert_or_update(gs("a"), gs("b"));
        }));
        TABLE.with(|c| c.set(core::ptr::null()));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }
}
