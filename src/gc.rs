//! Collector-facing glue: the mark worklist and the `Trace` capability.
//!
//! The worklist borrows the references it collects, so nothing that was
//! traced can be mutated until the worklist is dropped. That is how "mark
//! never interleaves with mutation" is enforced.

/// References discovered during a mark phase, in discovery order.
#[derive(Debug)]
pub struct Worklist<'a, R: ?Sized> {
    items: Vec<&'a R>,
}

impl<'a, R: ?Sized> Worklist<'a, R> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn add(&mut self, r: &'a R) {
        self.items.push(r);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pop(&mut self) -> Option<&'a R> {
        self.items.pop()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a R> + '_ {
        self.items.iter().copied()
    }
}

impl<R: ?Sized> Default for Worklist<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A managed object that can report the references it holds.
pub trait Trace<R: ?Sized> {
    fn trace<'a>(&'a self, worklist: &mut Worklist<'a, R>);
}

// Strings own their graphemes and hold no managed references.
impl<R: ?Sized> Trace<R> for crate::grapheme::GraphemeString {
    fn trace<'a>(&'a self, _worklist: &mut Worklist<'a, R>) {}
}
