//! Backtracking from the final timestep into symbols and words.

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::dict::Permuter;
use crate::symbols::{SymbolId, SymbolSet};

use super::node::{beam_index, NodeContinuation, NodeId, RecodeNode};
use super::RecodeBeamSearch;

/// One decoded path as symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedPath {
    pub symbols: Vec<SymbolId>,
    /// Minimum certainty over each symbol's timesteps and the nulls before it.
    pub certainties: Vec<f32>,
    /// Negative summed certainty over the same timesteps.
    pub ratings: Vec<f32>,
    /// Timestep at which each symbol is emitted.
    pub timesteps: Vec<usize>,
    /// Symbol boundaries in timesteps: `symbols.len() + 1` entries running
    /// from 0 to `width`, each halfway between neighbouring symbols.
    pub char_boundaries: Vec<usize>,
    /// Score of the terminal node, `None` when nothing was decoded.
    pub score: Option<f32>,
    /// Number of timesteps on the path.
    pub width: usize,
}

impl DecodedPath {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn text(&self, symbols: &SymbolSet) -> String {
        symbols.render(&self.symbols)
    }
}

/// Axis-aligned box in the caller's line coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedWord {
    pub text: String,
    pub symbols: Vec<SymbolId>,
    pub certainties: Vec<f32>,
    pub ratings: Vec<f32>,
    /// Minimum certainty of the member symbols.
    pub certainty: f32,
    /// min(certainty of the following space, certainty of the preceding space)
    pub space_certainty: f32,
    pub leading_space: bool,
    /// Permuter of the word's last symbol.
    pub permuter: Permuter,
    pub bounding_box: BoundingBox,
}

impl RecodeBeamSearch<'_> {
    /// Best and second-best eligible terminal nodes.
    ///
    /// Only symbol-boundary buckets that allow further codes are considered.
    /// A dictionary node qualifies only if its last symbol ended a word or
    /// was a space.
    fn best_terminals(&self) -> (Option<NodeId>, Option<NodeId>) {
        let Some(last) = self.steps.len().checked_sub(1) else {
            return (None, None);
        };
        let mut best: Option<(NodeId, f32)> = None;
        let mut second: Option<(NodeId, f32)> = None;
        for cont in [NodeContinuation::Anything, NodeContinuation::NoDup] {
            for is_dawg in [false, true] {
                let index = beam_index(is_dawg, cont, 0);
                for (slot, node) in self.steps[last].beams[index].nodes().iter().enumerate() {
                    if is_dawg && !self.is_complete_word(node) {
                        continue;
                    }
                    let id = NodeId {
                        step: last as u32,
                        beam: index as u16,
                        slot: slot as u16,
                    };
                    if best.map_or(true, |(_, s)| node.score > s) {
                        second = best;
                        best = Some((id, node.score));
                    } else if second.map_or(true, |(_, s)| node.score > s) {
                        second = Some((id, node.score));
                    }
                }
            }
        }
        (best.map(|b| b.0), second.map(|s| s.0))
    }

    fn is_complete_word(&self, node: &RecodeNode) -> bool {
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            if n.symbol.is_some() && !n.duplicate {
                return n.end_of_word || self.is_space(n.symbol);
            }
            cursor = n.prev.map(|id| self.node(id));
        }
        false
    }

    /// Chronological node chain ending at `terminal`.
    fn path_to(&self, terminal: Option<NodeId>) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = terminal;
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.node(id).prev;
        }
        path.reverse();
        path
    }

    pub fn best_path(&self) -> DecodedPath {
        let _span = debug_span!("extract_best_paths").entered();
        let (best, _) = self.best_terminals();
        let path = self.path_as_symbols(&self.path_to(best));
        debug!(symbols = path.len(), score = path.score);
        path
    }

    /// The runner-up terminal node's path, if there is one.
    pub fn second_path(&self) -> Option<DecodedPath> {
        let (_, second) = self.best_terminals();
        second.map(|id| self.path_as_symbols(&self.path_to(Some(id))))
    }

    /// Raw class labels of the best path, CTC-folded with nulls removed,
    /// each with its first timestep.
    pub fn best_labels(&self) -> Vec<(u32, usize)> {
        let (best, _) = self.best_terminals();
        let nodes: Vec<&RecodeNode> = self
            .path_to(best)
            .into_iter()
            .map(|id| self.node(id))
            .collect();
        let mut labels = Vec::new();
        let mut t = 0;
        while t < nodes.len() {
            let label = nodes[t].code;
            if !self.is_null(label) {
                labels.push((label, t));
            }
            t += 1;
            while !self.settings.simple_text && t < nodes.len() && nodes[t].code == label {
                t += 1;
            }
        }
        labels
    }

    fn path_as_symbols(&self, ids: &[NodeId]) -> DecodedPath {
        let nodes: Vec<&RecodeNode> = ids.iter().map(|&id| self.node(id)).collect();
        let width = nodes.len();
        let mut out = DecodedPath {
            score: nodes.last().map(|n| n.score),
            width,
            ..DecodedPath::default()
        };
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut t = 0;
        while t < width {
            let mut certainty = 0.0f32;
            let mut rating = 0.0f32;
            while t < width && nodes[t].symbol.is_none() {
                certainty = certainty.min(nodes[t].certainty);
                rating -= nodes[t].certainty;
                t += 1;
            }
            starts.push(t);
            let Some(symbol) = nodes.get(t).and_then(|n| n.symbol) else {
                // Trailing nulls belong to the last symbol.
                if let (Some(c), Some(r)) = (out.certainties.last_mut(), out.ratings.last_mut()) {
                    *c = c.min(certainty);
                    *r += rating;
                }
                continue;
            };
            let is_space = self.is_space(Some(symbol));
            if is_space && !out.certainties.is_empty() && nodes[t].permuter != Permuter::None {
                // The space hands its leading nulls to the previous symbol.
                if let (Some(c), Some(r)) = (out.certainties.last_mut(), out.ratings.last_mut()) {
                    *c = c.min(certainty);
                    *r += rating;
                }
                certainty = 0.0;
                rating = 0.0;
            }
            out.symbols.push(symbol);
            out.timesteps.push(t);
            loop {
                let node = nodes[t];
                t += 1;
                if node.certainty < certainty || (is_space && node.permuter == Permuter::None) {
                    certainty = node.certainty;
                }
                rating -= node.certainty;
                if t >= width || !nodes[t].duplicate {
                    break;
                }
            }
            ends.push(t);
            out.certainties.push(certainty);
            out.ratings.push(rating);
        }
        out.char_boundaries = char_boundaries(&starts, &ends, width);
        out
    }

    /// Split the best path into words placed inside `line_box`.
    ///
    /// `scale` converts timesteps into line-box units.
    pub fn extract_words(&self, line_box: BoundingBox, scale: f32) -> Vec<DecodedWord> {
        let (best, _) = self.best_terminals();
        let ids = self.path_to(best);
        let path = self.path_as_symbols(&ids);
        let node_at = |i: usize| self.node(ids[path.timesteps[i]]);
        let num = path.len();

        let mut words = Vec::new();
        let mut prev_space_cert = 0.0f32;
        let mut word_start = 0;
        while word_start < num {
            if self.is_space(Some(path.symbols[word_start])) {
                word_start += 1;
                continue;
            }
            let mut word_end = word_start + 1;
            while word_end < num {
                let symbol = path.symbols[word_end];
                let node = node_at(word_end);
                if self.is_space(Some(symbol)) || node.start_of_word {
                    break;
                }
                if node.permuter == Permuter::TopChoice
                    && (!self.symbols.is_space_delimited(symbol)
                        || !self.symbols.is_space_delimited(path.symbols[word_end - 1]))
                {
                    break;
                }
                word_end += 1;
            }
            let space_cert = if word_end < num && self.is_space(Some(path.symbols[word_end])) {
                path.certainties[word_end]
            } else {
                0.0
            };
            let leading_space = word_start > 0 && self.is_space(Some(path.symbols[word_start - 1]));
            let range = word_start..word_end;
            let bounds = &path.char_boundaries;
            let left = (bounds[word_start] as f32 * scale).floor() as i32 + line_box.left;
            let right = (bounds[word_end] as f32 * scale).ceil() as i32 + line_box.left;
            words.push(DecodedWord {
                text: self.symbols.render(&path.symbols[range.clone()]),
                symbols: path.symbols[range.clone()].to_vec(),
                certainties: path.certainties[range.clone()].to_vec(),
                ratings: path.ratings[range.clone()].to_vec(),
                certainty: path.certainties[range]
                    .iter()
                    .copied()
                    .fold(0.0f32, f32::min),
                space_certainty: space_cert.min(prev_space_cert),
                leading_space,
                permuter: node_at(word_end - 1).permuter,
                bounding_box: BoundingBox {
                    left,
                    top: line_box.top,
                    right,
                    bottom: line_box.bottom,
                },
            });
            prev_space_cert = space_cert;
            word_start = word_end;
        }
        words
    }
}

/// Boundary halfway between each symbol's end and the next symbol's start,
/// with the first pinned to 0 and the last to `width`.
fn char_boundaries(starts: &[usize], ends: &[usize], width: usize) -> Vec<usize> {
    if ends.is_empty() {
        return vec![width];
    }
    let mut bounds = Vec::with_capacity(ends.len() + 1);
    bounds.push(0);
    for i in 1..ends.len() {
        bounds.push(ends[i - 1] + (starts[i] - ends[i - 1]) / 2);
    }
    bounds.push(width);
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_boundaries() {
        // Symbols at [0,1) and [3,4) in a 6-step line.
        assert_eq!(char_boundaries(&[0, 3, 6], &[1, 4], 6), vec![0, 2, 6]);
        assert_eq!(char_boundaries(&[0, 6], &[2], 6), vec![0, 6]);
        assert_eq!(char_boundaries(&[], &[], 0), vec![0]);
    }
}
