//! Graphemes, the synthetic cluster table, and immutable grapheme strings.

use crate::error::CodepointOutOfRange;
use core::hash::{Hash, Hasher};
use core::ops::Range;
use hashbrown::HashMap;

/// Index of a multi-codepoint cluster in a [`SyntheticTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SyntheticId(u32);

impl SyntheticId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One user-perceived character.
///
/// Single-codepoint graphemes carry the codepoint itself. Clusters that
/// normalize to more than one codepoint are interned in a
/// [`SyntheticTable`] and carried by id. The canonical 32-bit code keeps
/// codepoints non-negative and maps synthetics to negative values, so two
/// strings are equal exactly when their code buffers are byte-identical.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Grapheme {
    Codepoint(u32),
    Synthetic(SyntheticId),
}

impl Grapheme {
    /// Largest codepoint with a grapheme code.
    pub const MAX_CODEPOINT: u32 = i32::MAX as u32;

    /// Canonical 32-bit code: the codepoint, or `-(id + 1)` for synthetics.
    #[inline]
    pub fn try_code(self) -> Result<i32, CodepointOutOfRange> {
        match self {
            Grapheme::Codepoint(cp) => {
                i32::try_from(cp).map_err(|_| CodepointOutOfRange { codepoint: cp })
            }
            // ids are bounded by `SyntheticTable::intern`
            Grapheme::Synthetic(id) => Ok(-(id.0 as i32) - 1),
        }
    }

    /// Like [`Grapheme::try_code`].
    ///
    /// # Panics
    ///
    /// If the codepoint is above [`Grapheme::MAX_CODEPOINT`].
    #[inline]
    pub fn code(self) -> i32 {
        match self.try_code() {
            Ok(code) => code,
            Err(e) => panic!("{e}"),
        }
    }

    #[inline]
    pub fn from_code(code: i32) -> Self {
        if code >= 0 {
            Grapheme::Codepoint(code as u32)
        } else {
            Grapheme::Synthetic(SyntheticId((-(code + 1)) as u32))
        }
    }

    #[inline]
    pub fn is_synthetic(self) -> bool {
        matches!(self, Grapheme::Synthetic(_))
    }
}

impl From<char> for Grapheme {
    #[inline]
    fn from(c: char) -> Self {
        Grapheme::Codepoint(c as u32)
    }
}

/// Interner for clusters that have no single-codepoint form.
///
/// Append-only: an id stays valid for the life of the table, and interning
/// the same cluster twice yields the same id.
#[derive(Debug, Default)]
pub struct SyntheticTable {
    clusters: Vec<Box<[char]>>,
    lookup: HashMap<Box<[char]>, SyntheticId>,
}

impl SyntheticTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns the id for `cluster`, allocating one on first sight.
    ///
    /// # Panics
    ///
    /// If the table already holds `2^31` clusters.
    pub fn intern(&mut self, cluster: &[char]) -> SyntheticId {
        debug_assert!(cluster.len() > 1, "single codepoints are not synthetic");
        if let Some(&id) = self.lookup.get(cluster) {
            return id;
        }
        let next = i32::try_from(self.clusters.len()).expect("synthetic table is full");
        let id = SyntheticId(next as u32);
        let owned: Box<[char]> = cluster.into();
        self.clusters.push(owned.clone());
        self.lookup.insert(owned, id);
        id
    }

    pub fn get(&self, cluster: &[char]) -> Option<SyntheticId> {
        self.lookup.get(cluster).copied()
    }

    /// Codepoints of a synthetic, in normalized order.
    pub fn cluster(&self, id: SyntheticId) -> Option<&[char]> {
        self.clusters.get(id.index()).map(|c| &**c)
    }
}

/// Immutable sequence of graphemes, stored as canonical codes.
///
/// Every constructor checks codepoints against [`Grapheme::MAX_CODEPOINT`],
/// so equality, hashing and [`GraphemeString::key_bytes`] all read the
/// same validated buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphemeString {
    codes: Box<[i32]>,
}

impl GraphemeString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_graphemes<I>(graphemes: I) -> Result<Self, CodepointOutOfRange>
    where
        I: IntoIterator<Item = Grapheme>,
    {
        let codes = graphemes
            .into_iter()
            .map(Grapheme::try_code)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            codes: codes.into_boxed_slice(),
        })
    }

    /// One grapheme per codepoint, without normalizing.
    pub fn try_from_codepoints<I>(codepoints: I) -> Result<Self, CodepointOutOfRange>
    where
        I: IntoIterator<Item = u32>,
    {
        Self::try_from_graphemes(codepoints.into_iter().map(Grapheme::Codepoint))
    }

    /// Like [`GraphemeString::try_from_codepoints`].
    ///
    /// # Panics
    ///
    /// If any codepoint is above [`Grapheme::MAX_CODEPOINT`].
    pub fn from_codepoints<I>(codepoints: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self::try_from_codepoints(codepoints).unwrap_or_else(|e| panic!("{e}"))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Grapheme> {
        self.codes.get(index).map(|&c| Grapheme::from_code(c))
    }

    #[inline]
    pub fn as_codes(&self) -> &[i32] {
        &self.codes
    }

    pub fn iter(&self) -> impl Iterator<Item = Grapheme> + '_ {
        self.codes.iter().map(|&c| Grapheme::from_code(c))
    }

    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.codes.iter().copied()
    }

    // The one definition of the key span: every code in native byte order.
    fn write_key(&self, mut sink: impl FnMut(&[u8])) {
        for code in self.codes.iter() {
            sink(&code.to_ne_bytes());
        }
    }

    /// The byte span hashing and key equality are defined over.
    pub fn key_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.codes.len() * 4);
        self.write_key(|b| out.extend_from_slice(b));
        out
    }

    /// Codepoints of `range`, expanding synthetics through `synthetics`.
    ///
    /// With `translate_newlines`, each `\n` grapheme comes out as `\r\n`.
    pub fn codepoints<'a>(
        &'a self,
        range: Range<usize>,
        synthetics: &'a SyntheticTable,
        translate_newlines: bool,
    ) -> Codepoints<'a> {
        Codepoints {
            codes: self.codes[range].iter(),
            synthetics,
            expansion: &[],
            pending_lf: false,
            translate_newlines,
        }
    }
}

impl Hash for GraphemeString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.write_key(|b| state.write(b));
    }
}

/// # Panics
///
/// If a codepoint is above [`Grapheme::MAX_CODEPOINT`].
impl From<Vec<Grapheme>> for GraphemeString {
    fn from(graphemes: Vec<Grapheme>) -> Self {
        Self::try_from_graphemes(graphemes).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl FromIterator<Grapheme> for GraphemeString {
    fn from_iter<I: IntoIterator<Item = Grapheme>>(iter: I) -> Self {
        Self::try_from_graphemes(iter).unwrap_or_else(|e| panic!("{e}"))
    }
}

/// Lazy codepoint view over a grapheme range.
pub struct Codepoints<'a> {
    codes: core::slice::Iter<'a, i32>,
    synthetics: &'a SyntheticTable,
    expansion: &'a [char],
    pending_lf: bool,
    translate_newlines: bool,
}

impl Iterator for Codepoints<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.pending_lf {
            self.pending_lf = false;
            return Some(0x0A);
        }
        if let Some((&first, rest)) = self.expansion.split_first() {
            self.expansion = rest;
            return Some(first as u32);
        }
        match Grapheme::from_code(*self.codes.next()?) {
            Grapheme::Codepoint(0x0A) if self.translate_newlines => {
                self.pending_lf = true;
                Some(0x0D)
            }
            Grapheme::Codepoint(cp) => Some(cp),
            Grapheme::Synthetic(id) => {
                let cluster = self
                    .synthetics
                    .cluster(id)
                    .expect("synthetic grapheme must come from this table");
                let (&first, rest) = cluster.split_first()?;
                self.expansion = rest;
                Some(first as u32)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let queued = self.expansion.len() + usize::from(self.pending_lf);
        (queued + self.codes.len(), None)
    }
}
