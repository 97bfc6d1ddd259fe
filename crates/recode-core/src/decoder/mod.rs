//! Beam-search decoding of per-timestep class probabilities into symbols.
//!
//! Every timestep keeps a fixed set of bounded beams, one per
//! (uses-dictionary, continuation, in-progress code length) bucket. Each
//! live node of timestep `t - 1` is extended by the classes that rank well
//! at `t`, folding repeated codes CTC-style and, when a [`Dictionary`] is
//! attached, following dictionary words in parallel with the freeform path.
//! After the last timestep the best eligible node is traced back to produce
//! the output (see `extract`).

mod beam;
mod explain;
mod extract;
mod node;
mod search;
#[cfg(test)]
mod tests;
mod topn;

pub use explain::{
    format_text, ExplainBucket, ExplainClass, ExplainNode, ExplainResult, ExplainStep,
};
pub use extract::{BoundingBox, DecodedPath, DecodedWord};
pub use node::{beam_index, NodeContinuation, TopNState, NUM_BEAMS};

use tracing::{debug, debug_span, trace};

use crate::dict::Dictionary;
use crate::recoder::Recoder;
use crate::settings::{DecoderSettings, MAX_BEAM_WIDTH};
use crate::symbols::{SymbolId, SymbolSet};

use beam::RecodeBeam;
use node::{NodeId, RecodeNode};
use topn::TopN;

/// Decoder state for one line. Reusable: [`decode`](Self::decode) starts over.
pub struct RecodeBeamSearch<'a> {
    recoder: &'a Recoder,
    symbols: &'a SymbolSet,
    dict: Option<&'a dyn Dictionary>,
    settings: DecoderSettings,
    /// Class index of the null (blank) output.
    null: Option<u32>,
    space: Option<SymbolId>,
    space_delimited: bool,
    top: TopN,
    /// Finished timesteps; never modified once pushed.
    steps: Vec<RecodeBeam>,
}

impl<'a> RecodeBeamSearch<'a> {
    /// Beam widths above `MAX_BEAM_WIDTH` are capped.
    pub fn new(
        recoder: &'a Recoder,
        symbols: &'a SymbolSet,
        dict: Option<&'a dyn Dictionary>,
        mut settings: DecoderSettings,
    ) -> Self {
        for width in &mut settings.beam_widths {
            *width = (*width).min(MAX_BEAM_WIDTH);
        }
        Self {
            recoder,
            symbols,
            dict,
            settings,
            null: recoder.null_code(),
            space: symbols.space(),
            space_delimited: symbols.is_space_delimited_lang(),
            top: TopN::default(),
            steps: Vec::new(),
        }
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    pub fn has_dictionary(&self) -> bool {
        self.dict.is_some()
    }

    /// Number of timesteps decoded so far.
    pub fn num_timesteps(&self) -> usize {
        self.steps.len()
    }

    /// Drop all decoded timesteps.
    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// Decode a whole line: one probability vector per timestep.
    pub fn decode<T: AsRef<[f32]>>(&mut self, outputs: &[T]) {
        let _span = debug_span!("decode", timesteps = outputs.len()).entered();
        self.reset();
        for row in outputs {
            self.decode_step(row.as_ref());
        }
        debug!(
            timesteps = self.steps.len(),
            best_score = self.best_path().score
        );
    }

    /// Extend the lattice by one timestep.
    ///
    /// `outputs[c]` is the probability of class `c`; classes missing from a
    /// short vector count as probability 0.
    pub fn decode_step(&mut self, outputs: &[f32]) {
        let t = self.steps.len();
        let _span = debug_span!("decode_step", t).entered();
        self.top.compute(
            outputs,
            self.recoder.code_range() as usize,
            self.settings.top_n,
            self.null,
        );
        let mut step = RecodeBeam::new();
        step.top_n = self.top.ranked.clone();

        for tier in TopNState::TIERS {
            if tier == TopNState::AlsoRan && anything_count(&step) > 0 {
                break;
            }
            match self.steps.last() {
                None => {
                    let start = beam_index(false, NodeContinuation::Anything, 0);
                    self.continue_context(None, start, outputs, tier, &mut step);
                    if self.dict.is_some() {
                        let start = beam_index(true, NodeContinuation::Anything, 0);
                        self.continue_context(None, start, outputs, tier, &mut step);
                    }
                }
                Some(prev) => {
                    for (index, beam) in prev.beams.iter().enumerate() {
                        for slot in (0..beam.len()).rev() {
                            let id = NodeId {
                                step: (t - 1) as u32,
                                beam: index as u16,
                                slot: slot as u16,
                            };
                            self.continue_context(Some(id), index, outputs, tier, &mut step);
                        }
                    }
                }
            }
        }

        // One initial-dictionary candidate per continuation.
        for cont in NodeContinuation::ALL {
            if let Some(node) = step.best_initial_dawgs[cont.index()].take() {
                step.beams[beam_index(true, cont, 0)]
                    .push_if_better(self.settings.beam_widths[0], node);
            }
        }

        for (index, beam) in step.beams.iter().enumerate() {
            if !beam.is_empty() {
                trace!(
                    index,
                    size = beam.len(),
                    best = beam.get(0).map(|n| n.score)
                );
            }
        }
        debug!(t, live = anything_count(&step));
        self.steps.push(step);
    }

    /// Size of one bucket at timestep `t`; 0 for unknown timesteps.
    pub fn bucket_len(
        &self,
        t: usize,
        is_dawg: bool,
        cont: NodeContinuation,
        length: usize,
    ) -> usize {
        self.steps
            .get(t)
            .and_then(|s| s.beams.get(beam_index(is_dawg, cont, length)))
            .map_or(0, |b| b.len())
    }

    pub(crate) fn node(&self, id: NodeId) -> &RecodeNode {
        &self.steps[id.step as usize].beams[id.beam as usize].nodes()[id.slot as usize]
    }

    pub(crate) fn is_null(&self, code: u32) -> bool {
        self.null == Some(code)
    }

    pub(crate) fn is_space(&self, symbol: Option<SymbolId>) -> bool {
        symbol.is_some() && symbol == self.space
    }
}

/// Live hypotheses in buckets that allow any continuation.
fn anything_count(step: &RecodeBeam) -> usize {
    step.beams
        .iter()
        .enumerate()
        .filter(|(index, _)| node::continuation_from_index(*index) == NodeContinuation::Anything)
        .map(|(_, b)| b.len())
        .sum()
}
