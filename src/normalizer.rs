//! Incremental normalizer contract and the default NFG implementation.
//!
//! The codec only talks to [`Normalizer`]. `NfgNormalizer` delegates the
//! Unicode algorithms to `unicode-segmentation` (cluster boundaries) and
//! `unicode-normalization` (canonical and compatibility forms).

use crate::grapheme::{Grapheme, SyntheticTable};
use std::collections::VecDeque;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::GraphemeCursor;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
    /// NFC plus one grapheme per extended cluster; multi-codepoint clusters
    /// become synthetics.
    #[default]
    Nfg,
}

/// Push-based normalizer driven one codepoint at a time.
///
/// Contract: `process` buffers its input and reports how many graphemes are
/// ready. After `eof`, `get_one_grapheme` drains exactly `available()`
/// graphemes. `cleanup` releases any buffered state and must be safe to
/// call after an aborted run; an instance is reusable after it.
pub trait Normalizer {
    /// Feeds one codepoint and returns the number of graphemes now ready.
    fn process(&mut self, cp: char) -> usize;

    /// Takes the oldest ready grapheme.
    fn get_one_grapheme(&mut self) -> Option<Grapheme>;

    /// Signals end of input; pending combining state becomes ready.
    fn eof(&mut self);

    fn available(&self) -> usize;

    fn cleanup(&mut self);
}

/// Default normalizer. Buffers the cluster under construction until the
/// next codepoint starts a new one, then normalizes and emits it.
pub struct NfgNormalizer<'t> {
    form: NormalizationForm,
    synthetics: &'t mut SyntheticTable,
    // Codepoints of the unfinished cluster; always starts on a boundary.
    cluster: String,
    ready: VecDeque<Grapheme>,
    scratch: Vec<char>,
}

impl<'t> NfgNormalizer<'t> {
    pub fn new(synthetics: &'t mut SyntheticTable, form: NormalizationForm) -> Self {
        Self {
            form,
            synthetics,
            cluster: String::new(),
            ready: VecDeque::new(),
            scratch: Vec::new(),
        }
    }

    pub fn form(&self) -> NormalizationForm {
        self.form
    }

    fn starts_new_cluster(&mut self, cp: char) -> bool {
        let offset = self.cluster.len();
        self.cluster.push(cp);
        let mut cursor = GraphemeCursor::new(offset, self.cluster.len(), true);
        // The chunk begins at a cluster boundary, so no pre-context is needed.
        let boundary = cursor.is_boundary(&self.cluster, 0).unwrap_or(true);
        self.cluster.truncate(offset);
        boundary
    }

    fn finish_cluster(&mut self) {
        if self.cluster.is_empty() {
            return;
        }
        self.scratch.clear();
        match self.form {
            NormalizationForm::Nfc | NormalizationForm::Nfg => {
                self.scratch.extend(self.cluster.nfc())
            }
            NormalizationForm::Nfd => self.scratch.extend(self.cluster.nfd()),
            NormalizationForm::Nfkc => self.scratch.extend(self.cluster.nfkc()),
            NormalizationForm::Nfkd => self.scratch.extend(self.cluster.nfkd()),
        }
        self.cluster.clear();

        if self.form == NormalizationForm::Nfg && self.scratch.len() > 1 {
            let id = self.synthetics.intern(&self.scratch);
            self.ready.push_back(Grapheme::Synthetic(id));
        } else {
            self.ready.extend(self.scratch.iter().map(|&c| Grapheme::from(c)));
        }
    }
}

impl Normalizer for NfgNormalizer<'_> {
    fn process(&mut self, cp: char) -> usize {
        if !self.cluster.is_empty() && self.starts_new_cluster(cp) {
            self.finish_cluster();
        }
        self.cluster.push(cp);
        self.ready.len()
    }

    fn get_one_grapheme(&mut self) -> Option<Grapheme> {
        self.ready.pop_front()
    }

    fn eof(&mut self) {
        self.finish_cluster();
    }

    fn available(&self) -> usize {
        self.ready.len()
    }

    fn cleanup(&mut self) {
        self.cluster.clear();
        self.ready.clear();
        self.scratch.clear();
    }
}
