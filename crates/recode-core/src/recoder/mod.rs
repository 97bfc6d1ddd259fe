//! Symbol recoder: a reversible many-to-one mapping from symbol ids to short
//! code sequences.
//!
//! Large syllabaries (Hangul, Han) are decomposed into a few small code
//! values so the network output layer stays compact. Everything else is a
//! direct mapping over the symbol's characters.

mod encoding;
mod io;
mod radical;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io as stdio;

use crate::code::Code;
use crate::symbols::{SymbolId, SymbolSet};

pub use radical::{parse_radical_table, RadicalTable};

/// Errors raised while building or loading a recoder table.
#[derive(Debug, thiserror::Error)]
pub enum RecodeError {
    #[error("IO error: {0}")]
    Io(#[from] stdio::Error),

    #[error("symbol {id} ({text:?}) is too long to encode")]
    CodeTooLong { id: SymbolId, text: String },

    #[error("symbol {id} ({text:?}) has no encodable content")]
    Undecomposable { id: SymbolId, text: String },

    #[error("code space expanded beyond the symbol set ({units} units for {symbols} symbols)")]
    CodeSpaceExpanded { units: usize, symbols: usize },

    #[error("invalid radical table line {line}: {reason}")]
    RadicalTable { line: usize, reason: String },

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected RCDR)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch")]
    Checksum,

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),
}

/// Bidirectional symbol ↔ code table with prefix continuation lookups.
#[derive(Debug, Clone)]
pub struct Recoder {
    /// encoder[symbol_id] = code
    encoder: Vec<Code>,
    /// Symbol whose code is the null (blank) class, if any.
    null_id: Option<SymbolId>,
    code_range: u32,
    decoder: HashMap<Code, SymbolId>,
    is_valid_start: Vec<bool>,
    /// prefix → code values that extend it without completing a symbol
    next_codes: HashMap<Code, Vec<u32>>,
    /// prefix → code values that complete a symbol
    final_codes: HashMap<Code, Vec<u32>>,
}

impl Recoder {
    /// Build a recoder from caller-supplied codes, one per symbol id.
    pub fn direct(codes: Vec<Code>, null_id: Option<SymbolId>) -> Self {
        let mut recoder = Self {
            encoder: codes,
            null_id,
            code_range: 0,
            decoder: HashMap::new(),
            is_valid_start: Vec::new(),
            next_codes: HashMap::new(),
            final_codes: HashMap::new(),
        };
        recoder.compute_code_range();
        recoder.setup_decoder();
        recoder
    }

    /// One code of length 1 per symbol, plus a trailing null code
    /// (symbol id `symbols.len()`).
    pub fn pass_through(symbols: &SymbolSet) -> Self {
        let n = symbols.len() as u32;
        let codes: Vec<Code> = (0..=n)
            .map(|u| {
                let mut code = Code::new();
                code.set(0, u);
                code.set_self_normalized(true);
                code
            })
            .collect();
        Self::direct(codes, Some(n))
    }

    /// One more than the largest code value in use.
    pub fn code_range(&self) -> u32 {
        self.code_range
    }

    /// Number of encoded symbols (including the null entry, if any).
    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }

    pub fn null_id(&self) -> Option<SymbolId> {
        self.null_id
    }

    /// The code value of the null class.
    pub fn null_code(&self) -> Option<u32> {
        self.null_id
            .and_then(|id| self.encoder.get(id as usize))
            .and_then(|code| code.get(0))
    }

    pub fn encode(&self, id: SymbolId) -> Option<Code> {
        self.encoder.get(id as usize).copied()
    }

    /// Exact-match lookup. Intermediate codes and never-assigned codes
    /// return `None`.
    pub fn decode(&self, code: &Code) -> Option<SymbolId> {
        self.decoder.get(code).copied()
    }

    pub fn is_valid_first_code(&self, value: u32) -> bool {
        self.is_valid_start
            .get(value as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Values that extend `prefix` without completing a symbol.
    pub fn next_codes(&self, prefix: &Code) -> &[u32] {
        self.next_codes
            .get(prefix)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Values that complete a symbol starting with `prefix`.
    pub fn final_codes(&self, prefix: &Code) -> &[u32] {
        self.final_codes
            .get(prefix)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn codes(&self) -> &[Code] {
        &self.encoder
    }

    /// Human-readable dump: one `id<TAB>text<TAB>code` line per symbol.
    pub fn encoding_as_string(&self, symbols: &SymbolSet) -> String {
        let mut out = String::new();
        for (id, code) in self.encoder.iter().enumerate() {
            let id = id as SymbolId;
            let text = if Some(id) == self.null_id {
                "<nul>"
            } else {
                match symbols.text(id) {
                    Some(" ") => "<sp>",
                    Some(t) => t,
                    None => "<?>",
                }
            };
            let marker = if code.self_normalized() { "" } else { " *" };
            let _ = writeln!(out, "{id}\t{text}\t{code}{marker}");
        }
        out
    }

    fn compute_code_range(&mut self) {
        self.code_range = self
            .encoder
            .iter()
            .flat_map(|c| c.as_slice().iter().copied())
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
    }

    /// Derive the reverse map, the valid-start table and the prefix
    /// continuation maps from `encoder`.
    fn setup_decoder(&mut self) {
        self.decoder.clear();
        self.next_codes.clear();
        self.final_codes.clear();
        self.is_valid_start = vec![false; self.code_range as usize];

        for (id, code) in self.encoder.iter().enumerate() {
            let Some(first) = code.get(0) else {
                continue;
            };
            let id = id as SymbolId;
            match self.decoder.entry(*code) {
                Entry::Vacant(e) => {
                    e.insert(id);
                }
                Entry::Occupied(mut e) => {
                    // A self-normalized symbol is the canonical owner of a shared code.
                    let current = self.encoder[*e.get() as usize];
                    if code.self_normalized() && !current.self_normalized() {
                        e.insert(id);
                    }
                }
            }
            self.is_valid_start[first as usize] = true;

            let len = code.len();
            let finals = self.final_codes.entry(code.prefix(len - 1)).or_default();
            let last = code.as_slice()[len - 1];
            if !finals.contains(&last) {
                finals.push(last);
            }
            for k in 0..len - 1 {
                let value = code.as_slice()[k];
                let nexts = self.next_codes.entry(code.prefix(k)).or_default();
                if !nexts.contains(&value) {
                    nexts.push(value);
                }
            }
        }
    }
}
