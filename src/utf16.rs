//! UTF-16 codec: bytes to normalized grapheme strings and back.

use crate::error::{EncodeError, Malformed};
use crate::grapheme::{Grapheme, GraphemeString, SyntheticTable};
use crate::normalizer::{NfgNormalizer, NormalizationForm, Normalizer};
use core::ops::Range;
use tracing::debug;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    #[inline]
    fn read(self, pair: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(pair),
            ByteOrder::Big => u16::from_be_bytes(pair),
        }
    }

    #[inline]
    fn write(self, unit: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => unit.to_le_bytes(),
            ByteOrder::Big => unit.to_be_bytes(),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// Decodes UTF-16 into an NFG string, interning new clusters in `synthetics`.
pub fn decode(synthetics: &mut SyntheticTable, bytes: &[u8]) -> Result<GraphemeString, Malformed> {
    let mut norm = NfgNormalizer::new(synthetics, NormalizationForm::Nfg);
    decode_with(&mut norm, bytes)
}

/// Decodes UTF-16 through an arbitrary normalizer.
///
/// A leading `FF FE` or `FE FF` fixes the byte order and is dropped;
/// otherwise native order is assumed. The normalizer is cleaned up before
/// returning, on success and on error.
pub fn decode_with<N>(norm: &mut N, bytes: &[u8]) -> Result<GraphemeString, Malformed>
where
    N: Normalizer + ?Sized,
{
    let mut out = Vec::with_capacity(bytes.len() / 2);
    let res = decode_into(norm, bytes, &mut out);
    norm.cleanup();
    if let Err(e) = &res {
        debug!(error = %e, len = bytes.len(), "utf16 decode failed");
    }
    res.map(|()| GraphemeString::from(out))
}

fn decode_into<N>(norm: &mut N, bytes: &[u8], out: &mut Vec<Grapheme>) -> Result<(), Malformed>
where
    N: Normalizer + ?Sized,
{
    if bytes.len() % 2 != 0 {
        return Err(Malformed::OddLength { len: bytes.len() });
    }
    let (order, body, base) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (ByteOrder::Little, rest, BOM_LE.len()),
        [0xFE, 0xFF, rest @ ..] => (ByteOrder::Big, rest, BOM_BE.len()),
        _ => (ByteOrder::native(), bytes, 0),
    };

    let units = body.chunks_exact(2).map(|p| order.read([p[0], p[1]]));
    let mut offset = base;
    for decoded in char::decode_utf16(units) {
        let c = decoded.map_err(|e| match e.unpaired_surrogate() {
            unit @ 0xDC00..=0xDFFF => Malformed::UnexpectedLowSurrogate { offset, unit },
            _ => Malformed::IncompleteSurrogatePair { offset },
        })?;
        offset += 2 * c.len_utf16();

        let ready = norm.process(c);
        out.extend((0..ready).map_while(|_| norm.get_one_grapheme()));
    }

    norm.eof();
    let ready = norm.available();
    out.extend((0..ready).map_while(|_| norm.get_one_grapheme()));
    Ok(())
}

/// Encoded UTF-16 with a trailing two-byte NUL that `len()` excludes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf16Bytes {
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl Utf16Bytes {
    /// Byte count without the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn units(&self) -> impl Iterator<Item = u16> + '_ {
        let order = self.order;
        self.as_bytes()
            .chunks_exact(2)
            .map(move |p| order.read([p[0], p[1]]))
    }

    /// The encoded bytes, terminator removed.
    pub fn into_vec(mut self) -> Vec<u8> {
        let len = self.len();
        self.bytes.truncate(len);
        self.bytes
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EncodeOptions {
    pub byte_order: ByteOrder,
}

/// Configured UTF-16 encoder.
#[derive(Copy, Clone, Debug)]
pub struct Encoder<'a> {
    synthetics: &'a SyntheticTable,
    replacement: Option<&'a GraphemeString>,
    translate_newlines: bool,
    options: EncodeOptions,
}

impl<'a> Encoder<'a> {
    pub fn new(synthetics: &'a SyntheticTable) -> Self {
        Self {
            synthetics,
            replacement: None,
            translate_newlines: false,
            options: EncodeOptions::default(),
        }
    }

    /// String spliced in for codepoints UTF-16 cannot carry.
    pub fn replacement(mut self, replacement: Option<&'a GraphemeString>) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn translate_newlines(mut self, translate: bool) -> Self {
        self.translate_newlines = translate;
        self
    }

    pub fn options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn encode_all(&self, s: &GraphemeString) -> Result<Utf16Bytes, EncodeError> {
        self.encode_substr(s, 0, -1)
    }

    /// Encodes `length` graphemes from `start`; `length == -1` runs to the end.
    pub fn encode_substr(
        &self,
        s: &GraphemeString,
        start: i64,
        length: i64,
    ) -> Result<Utf16Bytes, EncodeError> {
        let range = select(s.len(), start, length)?;
        let res = self.encode_range(s, range);
        if let Err(e) = &res {
            debug!(error = %e, "utf16 encode failed");
        }
        res
    }

    fn encode_range(&self, s: &GraphemeString, range: Range<usize>) -> Result<Utf16Bytes, EncodeError> {
        let replacement = match self.replacement {
            Some(r) => Some(self.replacement(None).encode_range(r, 0..r.len())?),
            None => None,
        };

        let mut buf = GrowBuf::with_units(range.len(), self.options.byte_order);
        for cp in s.codepoints(range, self.synthetics, self.translate_newlines) {
            if cp < 0x1_0000 {
                buf.push_units(&[cp as u16]);
            } else if cp <= 0x1F_FFFF {
                let v = cp - 0x1_0000;
                buf.push_units(&[(0xD800 + (v >> 10)) as u16, (0xDC00 + (v & 0x3FF)) as u16]);
            } else if let Some(r) = &replacement {
                buf.push_bytes(r.as_bytes());
            } else {
                return Err(EncodeError::Unencodable { codepoint: cp });
            }
        }
        Ok(buf.finish())
    }
}

/// Whole string, no replacement, native order.
pub fn encode_all(synthetics: &SyntheticTable, s: &GraphemeString) -> Result<Utf16Bytes, EncodeError> {
    Encoder::new(synthetics).encode_all(s)
}

pub fn encode_substr(
    synthetics: &SyntheticTable,
    s: &GraphemeString,
    start: i64,
    length: i64,
    replacement: Option<&GraphemeString>,
    translate_newlines: bool,
) -> Result<Utf16Bytes, EncodeError> {
    Encoder::new(synthetics)
        .replacement(replacement)
        .translate_newlines(translate_newlines)
        .encode_substr(s, start, length)
}

fn select(len: usize, start: i64, length: i64) -> Result<Range<usize>, EncodeError> {
    let graphs = len as i64;
    // start is checked first; the length check depends on it
    if start < 0 || start > graphs {
        return Err(EncodeError::StartOutOfRange { start, len });
    }
    let length = if length == -1 { graphs - start } else { length };
    match start.checked_add(length) {
        Some(end) if length >= 0 && end <= graphs => Ok(start as usize..end as usize),
        _ => Err(EncodeError::LengthOutOfRange { start, length, len }),
    }
}

// Output buffer that at least doubles whenever the next write would not fit.
struct GrowBuf {
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl GrowBuf {
    fn with_units(units: usize, order: ByteOrder) -> Self {
        // room for the terminator up front
        Self {
            bytes: Vec::with_capacity(units * 2 + 2),
            order,
        }
    }

    fn reserve(&mut self, needed: usize) {
        let len = self.bytes.len();
        let mut cap = self.bytes.capacity().max(2);
        if cap - len >= needed + 2 {
            return;
        }
        while cap - len < needed + 2 {
            cap *= 2;
        }
        self.bytes.reserve_exact(cap - len);
    }

    fn push_units(&mut self, units: &[u16]) {
        self.reserve(units.len() * 2);
        for &u in units {
            self.bytes.extend_from_slice(&self.order.write(u));
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    fn finish(mut self) -> Utf16Bytes {
        self.bytes.extend_from_slice(&[0, 0]);
        self.bytes.shrink_to_fit();
        Utf16Bytes {
            bytes: self.bytes,
            order: self.order,
        }
    }
}
