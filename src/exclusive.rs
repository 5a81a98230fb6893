//! Debug-only exclusive-access guard for table operations.
//!
//! Every table entry point holds the guard for its duration. A hasher,
//! key accessor or collector callback that calls back into the same table
//! therefore panics in debug builds, naming the operation already in
//! progress. In release builds the guard compiles to nothing.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table holder record. Embed in a struct and open each public
/// operation with `let _g = self.exclusive.enter("op");`.
#[derive(Debug)]
pub struct DebugExclusive {
    #[cfg(debug_assertions)]
    holder: Cell<Option<&'static str>>,
    // !Send + !Sync in every profile, not only when the Cell is present.
    _nosend: PhantomData<*mut ()>,
}

impl DebugExclusive {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            holder: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Marks `op` as running. Panics in debug builds if another operation
    /// on the same table has not finished.
    #[inline]
    pub fn enter(&self, op: &'static str) -> ExclusiveGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.holder.get() {
                panic!("`{op}` entered while `{running}` is in progress on the same table");
            }
            self.holder.set(Some(op));
            ExclusiveGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            ExclusiveGuard { _z: PhantomData }
        }
    }

    /// Name of the operation currently holding the table (debug builds only).
    pub fn holder(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.holder.get()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for DebugExclusive {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`DebugExclusive::enter`].
pub struct ExclusiveGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugExclusive,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.holder.get().is_some());
            self.owner.holder.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebugExclusive;
    use crate::grapheme::GraphemeString;
    use crate::linear_hash::GraphemeHash;
    use core::marker::PhantomData;

    // Compile-time auto-trait query: the inherent const wins when `T: Sync`.
    trait NotSync {
        const SYNC: bool = false;
    }
    impl<T: ?Sized> NotSync for T {}
    struct SyncQuery<T: ?Sized>(PhantomData<T>);
    impl<T: ?Sized + Sync> SyncQuery<T> {
        const SYNC: bool = true;
    }

    trait NotSend {
        const SEND: bool = false;
    }
    impl<T: ?Sized> NotSend for T {}
    struct SendQuery<T: ?Sized>(PhantomData<T>);
    impl<T: ?Sized + Send> SendQuery<T> {
        const SEND: bool = true;
    }

    #[test]
    fn guard_and_table_are_single_threaded_in_every_profile() {
        assert!(SyncQuery::<u32>::SYNC, "query sanity");
        assert!(!SyncQuery::<DebugExclusive>::SYNC);
        assert!(!SendQuery::<DebugExclusive>::SEND);
        assert!(!SyncQuery::<GraphemeHash<GraphemeString>>::SYNC);
        assert!(!SendQuery::<GraphemeHash<GraphemeString>>::SEND);
    }

    #[test]
    fn sequential_operations_are_allowed() {
        let x = DebugExclusive::new();
        {
            let _g = x.enter("lookup");
        }
        let _g = x.enter("insert_or_update");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_naming_the_holder() {
        let x = DebugExclusive::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = x.enter("mark");
            assert_eq!(x.holder(), Some("mark"));
            let _inner = x.enter("delete");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err.downcast_ref::<String>().cloned().unwrap_or_default();
        assert!(msg.contains("`delete`") && msg.contains("`mark`"), "{msg}");
    }
}
