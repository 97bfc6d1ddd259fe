use std::collections::HashMap;

use tracing::{debug, debug_span};

use crate::code::{Code, MAX_CODE_LEN};
use crate::symbols::{SymbolId, SymbolSet};
use crate::unicode::{decompose_hangul, HANGUL_L_COUNT, HANGUL_T_COUNT, HANGUL_V_COUNT};

use super::radical::{radical_pre_hash, RadicalTable, RADICAL_RADIX};
use super::{RecodeError, Recoder};

/// Direct code units, in first-seen order. Space is always unit 0 and the
/// null marker unit 1.
struct DirectUnits {
    ids: HashMap<String, u32>,
}

impl DirectUnits {
    const SPACE: u32 = 0;
    const NULL: u32 = 1;

    fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert(" ".to_string(), Self::SPACE);
        ids.insert("\0null".to_string(), Self::NULL);
        Self { ids }
    }

    fn get_or_insert(&mut self, unit: char) -> u32 {
        let next = self.ids.len() as u32;
        *self.ids.entry(unit.to_string()).or_insert(next)
    }

    /// Units allocated for characters, excluding space and null.
    fn char_units(&self) -> usize {
        self.ids.len() - 2
    }
}

impl Recoder {
    /// Compute a compressed encoding for every symbol in `symbols`.
    ///
    /// - Han characters found in `radicals` are encoded by their radical list,
    ///   plus a disambiguation element when the list was already taken.
    /// - Precomposed Hangul syllables become (leading, vowel, trailing).
    /// - Everything else is the sequence of its characters' direct units, with
    ///   a null element between two equal adjacent characters so that CTC
    ///   folding cannot merge them.
    ///
    /// `null_id` may equal `symbols.len()`, in which case an extra entry is
    /// appended for it. The encoded null ends up at `code_range() - 1`.
    pub fn compute_encoding(
        symbols: &SymbolSet,
        null_id: Option<SymbolId>,
        radicals: Option<&RadicalTable>,
    ) -> Result<Self, RecodeError> {
        let _span = debug_span!("compute_encoding", symbols = symbols.len()).entered();
        let num_symbols = symbols.len() as u32;
        let mut units = DirectUnits::new();
        let mut radical_counts: HashMap<u64, u32> = HashMap::new();

        // Raw code space: [0, n) direct units, then Hangul jamo, then Han.
        let hangul_offset = num_symbols;
        let han_offset = hangul_offset + HANGUL_L_COUNT + HANGUL_V_COUNT + HANGUL_T_COUNT;

        let mut encoder: Vec<Code> = Vec::with_capacity(symbols.len() + 1);
        for u in 0..=num_symbols {
            if u == num_symbols && null_id != Some(u) {
                break;
            }
            let mut code = Code::new();
            let normalized = symbols.normalized(u).unwrap_or("");
            let chars: Vec<char> = normalized.chars().collect();

            if null_id == Some(u) {
                code.set(0, DirectUnits::NULL);
            } else if symbols.is_space(u) {
                code.set(0, DirectUnits::SPACE);
            } else if chars.len() == 1 {
                let c = chars[0];
                if let Some(rs) = radicals.and_then(|t| t.get(&(c as u32))) {
                    if rs.len() >= MAX_CODE_LEN {
                        return Err(too_long(symbols, u));
                    }
                    for (i, &r) in rs.iter().enumerate() {
                        code.set(i, han_offset + r);
                    }
                    let seen = radical_counts.entry(radical_pre_hash(rs)).or_insert(0);
                    if *seen > 0 {
                        code.set(rs.len(), han_offset + *seen + RADICAL_RADIX);
                    }
                    *seen += 1;
                } else if let Some((l, v, t)) = decompose_hangul(c) {
                    code.set(0, hangul_offset + l);
                    code.set(1, hangul_offset + HANGUL_L_COUNT + v);
                    code.set(2, hangul_offset + HANGUL_L_COUNT + HANGUL_V_COUNT + t);
                }
            }

            if code.is_empty() {
                if chars.is_empty() {
                    return Err(RecodeError::Undecomposable {
                        id: u,
                        text: symbols.text(u).unwrap_or("").to_string(),
                    });
                }
                let mut prev: Option<char> = None;
                for &c in &chars {
                    if prev == Some(c) && null_id.is_some() && !code.push(DirectUnits::NULL) {
                        return Err(too_long(symbols, u));
                    }
                    if !code.push(units.get_or_insert(c)) {
                        return Err(too_long(symbols, u));
                    }
                    prev = Some(c);
                }
                if units.char_units() > symbols.len() {
                    return Err(RecodeError::CodeSpaceExpanded {
                        units: units.char_units(),
                        symbols: symbols.len(),
                    });
                }
            }
            let text = symbols.text(u).unwrap_or("");
            code.set_self_normalized(u >= num_symbols || text == normalized);
            encoder.push(code);
        }

        separate_han_positions(&mut encoder, han_offset);

        let mut recoder = Self::direct(encoder, null_id);
        let encoded_null = null_id.map(|_| DirectUnits::NULL);
        recoder.defragment_code_values(encoded_null);
        debug!(code_range = recoder.code_range, codes = recoder.encoder.len());
        Ok(recoder)
    }

    /// Renumber so every used value is in `[0, code_range)` with no gaps.
    /// `encoded_null` is moved to the end of the range.
    fn defragment_code_values(&mut self, encoded_null: Option<u32>) {
        let range = self.code_range as usize;
        let mut used = vec![false; range];
        for code in &self.encoder {
            for &v in code.as_slice() {
                used[v as usize] = true;
            }
        }
        let mut remap = vec![0u32; range];
        let mut next = 0u32;
        for (v, &is_used) in used.iter().enumerate() {
            if is_used && Some(v as u32) != encoded_null {
                remap[v] = next;
                next += 1;
            }
        }
        if let Some(null) = encoded_null {
            if (null as usize) < range && used[null as usize] {
                remap[null as usize] = next;
            }
        }
        for code in &mut self.encoder {
            for i in 0..code.len() {
                let v = code.as_slice()[i];
                code.set(i, remap[v as usize]);
            }
        }
        self.compute_code_range();
        self.setup_decoder();
    }
}

/// Give each Han code position its own block of values. Only values at or
/// above `han_offset` move.
fn separate_han_positions(encoder: &mut [Code], han_offset: u32) {
    let mut shift = 0u32;
    for i in 0..MAX_CODE_LEN {
        let mut max_offset: Option<u32> = None;
        for code in encoder.iter_mut() {
            let Some(v) = code.get(i) else {
                continue;
            };
            if v < han_offset {
                continue;
            }
            max_offset = Some(max_offset.map_or(v - han_offset, |m| m.max(v - han_offset)));
            code.set(i, v + shift);
        }
        match max_offset {
            Some(m) => shift += m + 1,
            None => break,
        }
    }
}

fn too_long(symbols: &SymbolSet, id: SymbolId) -> RecodeError {
    RecodeError::CodeTooLong {
        id,
        text: symbols.text(id).unwrap_or("").to_string(),
    }
}
