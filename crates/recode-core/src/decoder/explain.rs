use serde::Serialize;

use crate::dict::Permuter;

use super::node::{
    continuation_from_index, is_dawg_from_index, length_from_index, NodeContinuation, RecodeNode,
    TopNState,
};
use super::RecodeBeamSearch;

/// Full diagnostic dump of a finished decode.
#[derive(Debug, Serialize)]
pub struct ExplainResult {
    pub timesteps: Vec<ExplainStep>,
    pub best_text: String,
    pub best_score: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ExplainStep {
    pub t: usize,
    /// Best classes at this timestep, most probable first.
    pub top_n: Vec<ExplainClass>,
    /// Non-empty buckets only.
    pub buckets: Vec<ExplainBucket>,
}

#[derive(Debug, Serialize)]
pub struct ExplainClass {
    pub code: u32,
    pub probability: f32,
    pub tier: TopNState,
}

#[derive(Debug, Serialize)]
pub struct ExplainBucket {
    pub dictionary: bool,
    pub continuation: NodeContinuation,
    pub length: usize,
    pub nodes: Vec<ExplainNode>,
}

#[derive(Debug, Serialize)]
pub struct ExplainNode {
    pub code: u32,
    /// Text of the completed symbol, if this node completes one.
    pub symbol: Option<String>,
    pub certainty: f32,
    pub score: f32,
    pub permuter: Permuter,
    pub duplicate: bool,
    pub start_of_dawg: bool,
    pub start_of_word: bool,
    pub end_of_word: bool,
}

impl RecodeBeamSearch<'_> {
    fn explain_node(&self, node: &RecodeNode) -> ExplainNode {
        ExplainNode {
            code: node.code,
            symbol: node
                .symbol
                .and_then(|id| self.symbols.text(id))
                .map(str::to_string),
            certainty: node.certainty,
            score: node.score,
            permuter: node.permuter,
            duplicate: node.duplicate,
            start_of_dawg: node.start_of_dawg,
            start_of_word: node.start_of_word,
            end_of_word: node.end_of_word,
        }
    }

    /// Snapshot every timestep's top classes and bucket contents.
    pub fn explain(&self) -> ExplainResult {
        let timesteps = self
            .steps
            .iter()
            .enumerate()
            .map(|(t, step)| ExplainStep {
                t,
                top_n: step
                    .top_n
                    .iter()
                    .map(|&(code, probability, tier)| ExplainClass {
                        code,
                        probability,
                        tier,
                    })
                    .collect(),
                buckets: step
                    .beams
                    .iter()
                    .enumerate()
                    .filter(|(_, beam)| !beam.is_empty())
                    .map(|(index, beam)| ExplainBucket {
                        dictionary: is_dawg_from_index(index),
                        continuation: continuation_from_index(index),
                        length: length_from_index(index),
                        nodes: beam.nodes().iter().map(|n| self.explain_node(n)).collect(),
                    })
                    .collect(),
            })
            .collect();

        let best = self.best_path();
        ExplainResult {
            timesteps,
            best_text: best.text(self.symbols),
            best_score: best.score,
        }
    }
}

/// Format an ExplainResult as human-readable text.
pub fn format_text(result: &ExplainResult) -> String {
    use unicode_width::UnicodeWidthStr;
    let mut out = String::new();

    out.push_str(&format!(
        "=== Decode ({} timesteps) ===\n",
        result.timesteps.len()
    ));

    for step in &result.timesteps {
        out.push_str(&format!("\n  t={}\n", step.t));
        let classes: Vec<String> = step
            .top_n
            .iter()
            .map(|c| {
                let tier = match c.tier {
                    TopNState::Top2 => "*",
                    TopNState::TopN => "+",
                    TopNState::AlsoRan => "",
                };
                format!("{}{}={:.3}", c.code, tier, c.probability)
            })
            .collect();
        out.push_str(&format!("    top: {}\n", classes.join(" ")));

        for bucket in &step.buckets {
            out.push_str(&format!(
                "    [{} {} len={}] {} node(s)\n",
                if bucket.dictionary { "dict" } else { "free" },
                bucket.continuation.as_str(),
                bucket.length,
                bucket.nodes.len(),
            ));
            for n in &bucket.nodes {
                let label = match &n.symbol {
                    Some(s) => format!("{} '{}'", n.code, s),
                    None => n.code.to_string(),
                };
                let pad_width = 12;
                let display_width = UnicodeWidthStr::width(label.as_str());
                let padded = if display_width < pad_width {
                    format!("{}{}", label, " ".repeat(pad_width - display_width))
                } else {
                    label
                };
                let mut flags = String::new();
                if n.duplicate {
                    flags.push_str(" dup");
                }
                if n.start_of_word {
                    flags.push_str(" sow");
                }
                if n.end_of_word {
                    flags.push_str(" eow");
                }
                if n.start_of_dawg {
                    flags.push_str(" sod");
                }
                out.push_str(&format!(
                    "      {} cert={:<9.4} score={:<9.4} {}{}\n",
                    padded,
                    n.certainty,
                    n.score,
                    n.permuter.as_str(),
                    flags,
                ));
            }
        }
    }

    match result.best_score {
        Some(score) => out.push_str(&format!(
            "\n=== Best: \"{}\" (score={:.4}) ===\n",
            result.best_text, score
        )),
        None => out.push_str("\nNo path found.\n"),
    }
    out
}
