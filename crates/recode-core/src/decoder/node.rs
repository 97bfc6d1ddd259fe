use serde::Serialize;

use crate::dict::{DictState, Permuter};
use crate::settings::NUM_LENGTHS;
use crate::symbols::SymbolId;

/// What may follow a node at the next timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeContinuation {
    /// Duplicates, nulls and new codes are all allowed.
    Anything,
    /// Only a duplicate of this code may follow.
    OnlyDup,
    /// A duplicate of this code may not follow.
    NoDup,
}

impl NodeContinuation {
    pub const ALL: [NodeContinuation; NC_COUNT] = [
        NodeContinuation::Anything,
        NodeContinuation::OnlyDup,
        NodeContinuation::NoDup,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeContinuation::Anything => "anything",
            NodeContinuation::OnlyDup => "only_dup",
            NodeContinuation::NoDup => "no_dup",
        }
    }
}

pub(crate) const NC_COUNT: usize = 3;

/// Number of buckets per timestep: dictionary × continuation × code length.
pub const NUM_BEAMS: usize = 2 * NC_COUNT * NUM_LENGTHS;

/// Bucket index for (uses-dictionary, continuation, in-progress code length).
pub fn beam_index(is_dawg: bool, cont: NodeContinuation, length: usize) -> usize {
    (is_dawg as usize * NC_COUNT + cont.index()) * NUM_LENGTHS + length
}

pub(crate) fn length_from_index(index: usize) -> usize {
    index % NUM_LENGTHS
}

pub(crate) fn continuation_from_index(index: usize) -> NodeContinuation {
    NodeContinuation::ALL[(index / NUM_LENGTHS) % NC_COUNT]
}

pub(crate) fn is_dawg_from_index(index: usize) -> bool {
    index / NUM_LENGTHS >= NC_COUNT
}

/// Probability tier of a class at one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopNState {
    /// The two best classes, plus the null class.
    Top2,
    /// The rest of the top-n.
    TopN,
    AlsoRan,
}

impl TopNState {
    pub(crate) const TIERS: [TopNState; 3] = [TopNState::Top2, TopNState::TopN, TopNState::AlsoRan];
}

/// Stable reference to a node in a finished timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    pub step: u32,
    pub beam: u16,
    pub slot: u16,
}

/// One hypothesis at one timestep.
#[derive(Debug)]
pub(crate) struct RecodeNode {
    /// Class emitted at this timestep (may be the null class).
    pub code: u32,
    /// Set once a code sequence completes a symbol.
    pub symbol: Option<SymbolId>,
    pub permuter: Permuter,
    /// A dictionary word may begin after this node.
    pub start_of_dawg: bool,
    pub start_of_word: bool,
    pub end_of_word: bool,
    /// Repeats the previous node's code and folds into it.
    pub duplicate: bool,
    /// A null that belongs to a multi-element code rather than padding.
    pub code_element: bool,
    pub certainty: f32,
    /// certainty + previous score
    pub score: f32,
    pub prev: Option<NodeId>,
    pub dawgs: Option<DictState>,
    /// Rolling hash of the non-null, non-duplicate codes on the path.
    pub code_hash: u64,
}

impl RecodeNode {
    /// Two nodes describing the same recent history; only the better is kept.
    pub fn same_hypothesis(&self, other: &RecodeNode) -> bool {
        self.code == other.code
            && self.code_hash == other.code_hash
            && self.permuter == other.permuter
            && self.start_of_dawg == other.start_of_dawg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beam_index_roundtrip() {
        let mut seen = [false; NUM_BEAMS];
        for is_dawg in [false, true] {
            for cont in NodeContinuation::ALL {
                for length in 0..NUM_LENGTHS {
                    let index = beam_index(is_dawg, cont, length);
                    assert!(!seen[index]);
                    seen[index] = true;
                    assert_eq!(is_dawg_from_index(index), is_dawg);
                    assert_eq!(continuation_from_index(index), cont);
                    assert_eq!(length_from_index(index), length);
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
