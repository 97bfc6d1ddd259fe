//! Per-node extension rules for one timestep.

use crate::code::Code;
use crate::dict::{DictState, Permuter};
use crate::symbols::SymbolId;

use super::beam::{Beam, RecodeBeam};
use super::node::{
    beam_index, continuation_from_index, is_dawg_from_index, length_from_index, NodeContinuation,
    NodeId, RecodeNode, TopNState,
};
use super::RecodeBeamSearch;

/// A candidate code for the current timestep.
#[derive(Debug, Clone, Copy)]
struct Extension {
    code: u32,
    symbol: Option<SymbolId>,
    certainty: f32,
    cont: NodeContinuation,
    duplicate: bool,
    code_element: bool,
}

impl Extension {
    fn new(code: u32, symbol: Option<SymbolId>, certainty: f32, cont: NodeContinuation) -> Self {
        Self {
            code,
            symbol,
            certainty,
            cont,
            duplicate: false,
            code_element: false,
        }
    }

    fn with_certainty(self, certainty: f32) -> Self {
        Self { certainty, ..self }
    }
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    permuter: Permuter,
    start_of_dawg: bool,
    start_of_word: bool,
    end_of_word: bool,
}

impl Flags {
    fn plain(permuter: Permuter) -> Self {
        Self {
            permuter,
            start_of_dawg: false,
            start_of_word: false,
            end_of_word: false,
        }
    }
}

fn prob(outputs: &[f32], code: u32) -> f32 {
    outputs.get(code as usize).copied().unwrap_or(0.0)
}

impl RecodeBeamSearch<'_> {
    /// Log-probability clamped at the certainty floor.
    pub(crate) fn prob_to_certainty(&self, prob: f32) -> f32 {
        let floor = self.settings.min_certainty;
        if prob > floor.exp() {
            prob.ln()
        } else {
            floor
        }
    }

    /// Extend `prev` (a node of bucket `index` at the previous timestep, or
    /// the start of the line) with every class in tier `tier`.
    pub(super) fn continue_context(
        &self,
        prev: Option<NodeId>,
        index: usize,
        outputs: &[f32],
        tier: TopNState,
        step: &mut RecodeBeam,
    ) {
        let length = length_from_index(index);
        let use_dawgs = is_dawg_from_index(index);
        let prev_cont = continuation_from_index(index);
        let prefix = self.code_prefix(prev, length);
        let prev_node = prev.map(|id| self.node(id));
        let simple_text = self.settings.simple_text;
        let cert_offset = self.settings.cert_offset;
        let null_prob = self.null.map_or(0.0, |n| prob(outputs, n));

        if let Some(p) = prev_node.filter(|_| !simple_text) {
            if self.top.flag(p.code) == tier {
                if prev_cont != NodeContinuation::NoDup {
                    let cert = self.prob_to_certainty(prob(outputs, p.code)) + cert_offset;
                    let ext = Extension {
                        duplicate: true,
                        ..Extension::new(p.code, p.symbol, cert, NodeContinuation::Anything)
                    };
                    self.push_dup_or_no_dawg(ext, length, use_dawgs, prev, step);
                }
                if prev_cont == NodeContinuation::Anything
                    && tier == TopNState::Top2
                    && !self.is_null(p.code)
                {
                    // Symbol and null share the mass of a boundary timestep.
                    let cert =
                        self.prob_to_certainty(prob(outputs, p.code) + null_prob) + cert_offset;
                    let ext = Extension {
                        duplicate: true,
                        ..Extension::new(p.code, p.symbol, cert, NodeContinuation::NoDup)
                    };
                    self.push_dup_or_no_dawg(ext, length, use_dawgs, prev, step);
                }
            }
            if prev_cont == NodeContinuation::OnlyDup {
                return;
            }
            if let Some(null) = self.null {
                if !self.is_null(p.code) && length > 0 && self.top.flag(null) == tier {
                    // Blank padding between the elements of a multi-element code.
                    let cert = self.prob_to_certainty(null_prob) + cert_offset;
                    let ext = Extension::new(null, None, cert, NodeContinuation::Anything);
                    self.push_dup_or_no_dawg(ext, length, use_dawgs, prev, step);
                }
            }
        }

        let mut full_code = prefix;
        for &code in self.recoder.final_codes(&prefix) {
            if self.top.flag(code) != tier {
                continue;
            }
            if !simple_text && prev_node.is_some_and(|p| p.code == code) {
                continue;
            }
            let is_null = self.is_null(code);
            let cert = self.prob_to_certainty(prob(outputs, code)) + cert_offset;
            if cert < self.settings.min_certainty && !is_null {
                continue;
            }
            full_code.set(length, code);
            let symbol = if length == 0 && is_null {
                None
            } else {
                self.recoder.decode(&full_code)
            };
            if symbol.is_some_and(|s| !self.symbols.is_enabled(s)) {
                continue;
            }
            let ext = Extension::new(code, symbol, cert, NodeContinuation::Anything);
            self.continue_unichar(ext, use_dawgs, prev, step);
            if tier == TopNState::Top2 && !is_null {
                let merged = self.merged_probability(outputs, code, prev_node, prev_cont, null_prob);
                let ext = Extension {
                    certainty: self.prob_to_certainty(merged) + cert_offset,
                    cont: NodeContinuation::OnlyDup,
                    ..ext
                };
                self.continue_unichar(ext, use_dawgs, prev, step);
            }
        }

        for &code in self.recoder.next_codes(&prefix) {
            if self.top.flag(code) != tier {
                continue;
            }
            if !simple_text && prev_node.is_some_and(|p| p.code == code) {
                continue;
            }
            let is_null = self.is_null(code);
            let cert = self.prob_to_certainty(prob(outputs, code)) + cert_offset;
            let ext = Extension {
                code_element: is_null,
                ..Extension::new(code, None, cert, NodeContinuation::Anything)
            };
            self.push_dup_or_no_dawg(ext, length + 1, use_dawgs, prev, step);
            if tier == TopNState::Top2 && !is_null {
                let merged = self.merged_probability(outputs, code, prev_node, prev_cont, null_prob);
                let ext = Extension {
                    certainty: self.prob_to_certainty(merged) + cert_offset,
                    cont: NodeContinuation::OnlyDup,
                    ..ext
                };
                self.push_dup_or_no_dawg(ext, length + 1, use_dawgs, prev, step);
            }
        }
    }

    /// Probability of `code` plus the null class, plus the previous code's
    /// when the two are exactly this timestep's top pair.
    fn merged_probability(
        &self,
        outputs: &[f32],
        code: u32,
        prev_node: Option<&RecodeNode>,
        prev_cont: NodeContinuation,
        null_prob: f32,
    ) -> f32 {
        let mut merged = prob(outputs, code) + null_prob;
        if let Some(p) = prev_node {
            let top_pair = (Some(p.code) == self.top.top_code && Some(code) == self.top.second_code)
                || (Some(code) == self.top.top_code && Some(p.code) == self.top.second_code);
            if prev_cont == NodeContinuation::Anything && !self.is_null(p.code) && top_pair {
                merged += prob(outputs, p.code);
            }
        }
        merged
    }

    /// The code elements of the symbol in progress, read back from `prev`.
    fn code_prefix(&self, prev: Option<NodeId>, length: usize) -> Code {
        let mut prefix = Code::new();
        let mut cursor = prev;
        for p in (0..length).rev() {
            while let Some(id) = cursor {
                let node = self.node(id);
                if node.duplicate || (self.is_null(node.code) && !node.code_element) {
                    cursor = node.prev;
                } else {
                    break;
                }
            }
            if let Some(id) = cursor {
                let node = self.node(id);
                prefix.set(p, node.code);
                cursor = node.prev;
            }
        }
        prefix
    }

    /// Push a duplicate, a padding null or a partial code into the bucket
    /// for `length`.
    fn push_dup_or_no_dawg(
        &self,
        ext: Extension,
        length: usize,
        use_dawgs: bool,
        prev: Option<NodeId>,
        step: &mut RecodeBeam,
    ) {
        let index = beam_index(use_dawgs, ext.cont, length);
        let width = self.settings.beam_widths[length];
        let prev_permuter = prev.map(|id| self.node(id).permuter);
        if use_dawgs {
            if ext.certainty > self.settings.worst_dict_cert {
                let flags = Flags::plain(prev_permuter.unwrap_or(Permuter::None));
                self.push_heap_if_better(width, &ext, flags, prev, None, &mut step.beams[index]);
            }
        } else {
            let ext = ext.with_certainty(ext.certainty * self.settings.dict_ratio);
            if ext.certainty >= self.settings.min_certainty || self.is_null(ext.code) {
                let flags = Flags::plain(prev_permuter.unwrap_or(Permuter::TopChoice));
                self.push_heap_if_better(width, &ext, flags, prev, None, &mut step.beams[index]);
            }
        }
    }

    /// Push a completed symbol (or a null at a symbol boundary).
    fn continue_unichar(
        &self,
        ext: Extension,
        use_dawgs: bool,
        prev: Option<NodeId>,
        step: &mut RecodeBeam,
    ) {
        let worst_dict_cert = self.settings.worst_dict_cert;
        if use_dawgs {
            if ext.certainty > worst_dict_cert {
                self.continue_dawg(ext, prev, step);
            }
            return;
        }
        let width = self.settings.beam_widths[0];
        let scaled = ext.with_certainty(ext.certainty * self.settings.dict_ratio);
        let nodawg = &mut step.beams[beam_index(false, ext.cont, 0)];
        self.push_heap_if_better(
            width,
            &scaled,
            Flags::plain(Permuter::TopChoice),
            prev,
            None,
            nodawg,
        );

        if self.dict.is_none() {
            return;
        }
        let is_space = self.is_space(ext.symbol);
        let delimited = ext
            .symbol
            .map_or(true, |s| self.symbols.is_space_delimited(s));
        if is_space && ext.certainty > worst_dict_cert {
            // The space keeps its unscaled certainty and no permuter, so the
            // extractor does not charge the preceding nulls to it twice.
            self.push_initial_dawg(&ext, Permuter::None, false, false, prev, step);
        } else if !is_space && !delimited {
            self.push_initial_dawg(&scaled, Permuter::TopChoice, false, false, prev, step);
        }
    }

    /// Follow a dictionary word with a completed symbol.
    fn continue_dawg(&self, ext: Extension, prev: Option<NodeId>, step: &mut RecodeBeam) {
        let Some(dict) = self.dict else {
            return;
        };
        let width = self.settings.beam_widths[0];
        let dawg_index = beam_index(true, ext.cont, 0);
        let nodawg_index = beam_index(false, ext.cont, 0);

        let Some(symbol) = ext.symbol else {
            let flags = Flags::plain(Permuter::None);
            self.push_heap_if_better(width, &ext, flags, prev, None, &mut step.beams[dawg_index]);
            return;
        };

        let score = ext.certainty + prev.map_or(0.0, |id| self.node(id).score);
        if !step.beams[dawg_index].accepts(width, score)
            && !step.beams[nodawg_index].accepts(width, score)
        {
            return;
        }

        let uni_prev = self.last_symbol_node(prev);
        if self.is_space(Some(symbol)) {
            if let Some(up) = uni_prev.filter(|up| up.end_of_word) {
                let flags = Flags::plain(up.permuter);
                self.push_initial_dawg(&ext, up.permuter, false, false, prev, step);
                self.push_heap_if_better(width, &ext, flags, prev, None, &mut step.beams[nodawg_index]);
            }
            return;
        }
        if let Some(up) = uni_prev {
            let up_delimited = up.symbol.map_or(true, |s| self.symbols.is_space_delimited(s));
            if up.start_of_dawg
                && !self.is_space(up.symbol)
                && up_delimited
                && self.symbols.is_space_delimited(symbol)
            {
                // Words of space-delimited text only break at spaces.
                return;
            }
        }

        let (accepted, word_start) = match uni_prev {
            None => (
                dict.letter_is_okay(&dict.default_positions(), symbol),
                true,
            ),
            Some(up) => match &up.dawgs {
                Some(state) => (dict.letter_is_okay(state, symbol), up.start_of_dawg),
                None => return,
            },
        };
        let Some(accepted) = accepted else {
            return;
        };
        let permuter = accepted.permuter;
        let valid_end = accepted.valid_end;
        let flags = Flags {
            permuter,
            start_of_dawg: false,
            start_of_word: word_start,
            end_of_word: valid_end,
        };
        self.push_heap_if_better(
            width,
            &ext,
            flags,
            prev,
            Some(accepted.state),
            &mut step.beams[dawg_index],
        );
        if valid_end && !self.space_delimited {
            // Without spaces a new word may start right after this one.
            self.push_initial_dawg(&ext, permuter, word_start, true, prev, step);
            let flags = Flags {
                end_of_word: true,
                ..flags
            };
            self.push_heap_if_better(width, &ext, flags, prev, None, &mut step.beams[nodawg_index]);
        }
    }

    /// Keep `ext` as this timestep's best word-start candidate for its
    /// continuation if it beats the current one.
    fn push_initial_dawg(
        &self,
        ext: &Extension,
        permuter: Permuter,
        start: bool,
        end: bool,
        prev: Option<NodeId>,
        step: &mut RecodeBeam,
    ) {
        let Some(dict) = self.dict else {
            return;
        };
        let score = ext.certainty + prev.map_or(0.0, |id| self.node(id).score);
        let slot = &mut step.best_initial_dawgs[ext.cont.index()];
        if slot.as_ref().map_or(true, |best| score > best.score) {
            let flags = Flags {
                permuter,
                start_of_dawg: true,
                start_of_word: start,
                end_of_word: end,
            };
            *slot = Some(self.make_node(ext, flags, prev, Some(dict.default_positions())));
        }
    }

    fn push_heap_if_better(
        &self,
        width: usize,
        ext: &Extension,
        flags: Flags,
        prev: Option<NodeId>,
        dawgs: Option<DictState>,
        beam: &mut Beam,
    ) {
        let score = ext.certainty + prev.map_or(0.0, |id| self.node(id).score);
        if beam.accepts(width, score) {
            beam.push_if_better(width, self.make_node(ext, flags, prev, dawgs));
        }
    }

    fn make_node(
        &self,
        ext: &Extension,
        flags: Flags,
        prev: Option<NodeId>,
        dawgs: Option<DictState>,
    ) -> RecodeNode {
        let score = ext.certainty + prev.map_or(0.0, |id| self.node(id).score);
        RecodeNode {
            code: ext.code,
            symbol: ext.symbol,
            permuter: flags.permuter,
            start_of_dawg: flags.start_of_dawg,
            start_of_word: flags.start_of_word,
            end_of_word: flags.end_of_word,
            duplicate: ext.duplicate,
            code_element: ext.code_element,
            certainty: ext.certainty,
            score,
            prev,
            dawgs,
            code_hash: self.code_hash(ext.code, ext.duplicate, prev),
        }
    }

    /// Fold `code` into the path hash unless it is a duplicate or null.
    fn code_hash(&self, code: u32, duplicate: bool, prev: Option<NodeId>) -> u64 {
        let mut hash = prev.map_or(0, |id| self.node(id).code_hash);
        if !duplicate && !self.is_null(code) {
            let range = self.recoder.code_range() as u64;
            let carry = (hash >> 32).wrapping_mul(range) >> 32;
            hash = hash
                .wrapping_mul(range)
                .wrapping_add(carry)
                .wrapping_add(code as u64);
        }
        hash
    }

    /// Nearest node at or before `id` that completed a symbol and is not a
    /// duplicate.
    pub(crate) fn last_symbol_node(&self, mut cursor: Option<NodeId>) -> Option<&RecodeNode> {
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.symbol.is_some() && !node.duplicate {
                return Some(node);
            }
            cursor = node.prev;
        }
        None
    }
}
