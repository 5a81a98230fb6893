//! nfg-hash: UTF-16 transcoding into normalized grapheme strings, and a
//! linear-hashing table keyed by those strings.
//!
//! Internal Design:
//!
//! Summary
//! - Strings are sequences of graphemes. A grapheme is either a single
//!   codepoint or a synthetic: an interned multi-codepoint cluster that the
//!   normalizer decided must behave as one unit (NFG).
//! - Layers:
//!   - `grapheme`: the string model and the synthetic table.
//!   - `normalizer`: the incremental normalizer contract plus the default
//!     implementation. Codepoints go in, whole graphemes come out.
//!   - `utf16`: decode raw UTF-16 bytes through a normalizer; encode a
//!     grapheme range back to NUL-terminated UTF-16 with optional
//!     replacement and newline translation.
//!   - `linear_hash`: `GraphemeHash<R, S>`, an incremental linear-hashing
//!     table whose keys and values are managed references.
//!   - `gc`: the worklist the table reports references to when marked.
//!
//! Constraints
//! - Single-threaded; no internal locking.
//! - Table growth splits at most one bucket per insert; no operation
//!   rehashes the whole table.
//! - Each entry caches its key's hash. Splits and copies reuse it; the
//!   hasher only runs on keys supplied by the caller.
//! - Only concrete strings may be keys. Anything else yields
//!   `KeyTypeError` and leaves the table untouched.
//!
//! Exclusive access
//! - Every table entry point holds a debug-only guard for its duration. A
//!   hasher or key accessor that reaches back into the same table panics
//!   in debug builds naming both operations.
//! - `mark` borrows the table for as long as the worklist lives, so the
//!   borrow checker keeps mutation out of a mark phase.
//!
//! Notes and non-goals
//! - No text processing beyond UTF-16 transcoding.
//! - Tables never shrink. `free` is the only way back to the initial size.
//! - Logging goes through `tracing`; the crate installs no subscriber.

pub mod error;
pub mod exclusive;
pub mod gc;
pub mod grapheme;
pub mod linear_hash;
mod linear_hash_proptest;
pub mod normalizer;
pub mod utf16;

// Public surface
pub use error::{CodepointOutOfRange, EncodeError, KeyTypeError, Malformed};
pub use exclusive::DebugExclusive;
pub use gc::{Trace, Worklist};
pub use grapheme::{Grapheme, GraphemeString, SyntheticId, SyntheticTable};
pub use linear_hash::{GraphemeHash, KeyRef, TableConfig, TableStats};
pub use normalizer::{NfgNormalizer, NormalizationForm, Normalizer};
pub use utf16::{decode, decode_with, encode_all, encode_substr, ByteOrder, EncodeOptions, Encoder, Utf16Bytes};
