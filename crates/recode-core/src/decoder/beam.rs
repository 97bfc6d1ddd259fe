use super::node::{RecodeNode, TopNState, NC_COUNT, NUM_BEAMS};

/// Bounded list of the best nodes in one bucket, sorted by descending score.
///
/// A sorted `Vec` keeps slot indices stable once the timestep is frozen,
/// which is what `NodeId` relies on.
#[derive(Debug, Default)]
pub(crate) struct Beam {
    nodes: Vec<RecodeNode>,
}

impl Beam {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[RecodeNode] {
        &self.nodes
    }

    pub fn get(&self, slot: usize) -> Option<&RecodeNode> {
        self.nodes.get(slot)
    }

    /// Whether a node scoring `score` would be kept.
    pub fn accepts(&self, width: usize, score: f32) -> bool {
        self.nodes.len() < width || self.nodes.last().is_some_and(|worst| score > worst.score)
    }

    /// Insert `node` if there is room or it beats the worst entry.
    ///
    /// An existing node describing the same hypothesis is replaced in place
    /// when `node` scores higher, and left alone otherwise. A rejected node
    /// is dropped along with its dictionary state.
    pub fn push_if_better(&mut self, width: usize, node: RecodeNode) {
        if !self.accepts(width, node.score) {
            return;
        }
        if let Some(i) = self.nodes.iter().position(|n| n.same_hypothesis(&node)) {
            if node.score > self.nodes[i].score {
                self.nodes.remove(i);
                self.insert_sorted(node);
            }
            return;
        }
        self.insert_sorted(node);
        self.nodes.truncate(width);
    }

    fn insert_sorted(&mut self, node: RecodeNode) {
        let pos = self.nodes.partition_point(|n| n.score >= node.score);
        self.nodes.insert(pos, node);
    }
}

/// All buckets of one timestep.
#[derive(Debug)]
pub(crate) struct RecodeBeam {
    pub beams: Vec<Beam>,
    /// Best "start a new word here" candidate per continuation, merged into
    /// the dictionary buckets once the timestep is complete.
    pub best_initial_dawgs: [Option<RecodeNode>; NC_COUNT],
    /// (code, probability, tier) for the classes in the top-n, best first.
    pub top_n: Vec<(u32, f32, TopNState)>,
}

impl RecodeBeam {
    pub fn new() -> Self {
        Self {
            beams: (0..NUM_BEAMS).map(|_| Beam::default()).collect(),
            best_initial_dawgs: [None, None, None],
            top_n: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Permuter;

    fn node(code: u32, hash: u64, score: f32) -> RecodeNode {
        RecodeNode {
            code,
            symbol: Some(code),
            permuter: Permuter::TopChoice,
            start_of_dawg: false,
            start_of_word: false,
            end_of_word: false,
            duplicate: false,
            code_element: false,
            certainty: score,
            score,
            prev: None,
            dawgs: None,
            code_hash: hash,
        }
    }

    fn scores(beam: &Beam) -> Vec<f32> {
        beam.nodes().iter().map(|n| n.score).collect()
    }

    #[test]
    fn test_keeps_best_within_width() {
        let mut beam = Beam::default();
        for (i, s) in [-3.0, -1.0, -5.0, -2.0].into_iter().enumerate() {
            beam.push_if_better(3, node(i as u32, i as u64, s));
        }
        assert_eq!(scores(&beam), vec![-1.0, -2.0, -3.0]);
        // Not better than the worst entry.
        beam.push_if_better(3, node(9, 9, -3.0));
        assert_eq!(beam.len(), 3);
        assert_eq!(beam.nodes()[2].code, 0);
    }

    #[test]
    fn test_matched_hypothesis_updates_in_place() {
        let mut beam = Beam::default();
        beam.push_if_better(4, node(1, 7, -4.0));
        beam.push_if_better(4, node(2, 8, -2.0));
        beam.push_if_better(4, node(1, 7, -1.0));
        assert_eq!(beam.len(), 2);
        assert_eq!(scores(&beam), vec![-1.0, -2.0]);

        // Worse duplicate is ignored, not inserted.
        beam.push_if_better(4, node(1, 7, -3.0));
        assert_eq!(scores(&beam), vec![-1.0, -2.0]);
    }

    #[test]
    fn test_distinct_permuters_do_not_match() {
        let mut beam = Beam::default();
        beam.push_if_better(4, node(1, 7, -1.0));
        let mut other = node(1, 7, -2.0);
        other.permuter = Permuter::SystemWord;
        beam.push_if_better(4, other);
        assert_eq!(beam.len(), 2);
    }
}
