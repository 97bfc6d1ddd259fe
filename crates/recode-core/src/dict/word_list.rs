use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::symbols::{SymbolId, SymbolSet};

use super::{DawgPosition, DawgStep, DictError, DictState, Dictionary, Permuter};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct TrieNode {
    /// (symbol, child node) sorted by symbol
    pub(super) children: Vec<(SymbolId, u32)>,
    pub(super) word_end: bool,
}

/// One word source: a trie over symbol ids. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct WordTrie {
    pub(super) permuter: Permuter,
    pub(super) words: u32,
    pub(super) nodes: Vec<TrieNode>,
}

impl WordTrie {
    fn new(permuter: Permuter) -> Self {
        Self {
            permuter,
            words: 0,
            nodes: vec![TrieNode::default()],
        }
    }

    fn child(&self, node: u32, symbol: SymbolId) -> Option<u32> {
        let children = &self.nodes.get(node as usize)?.children;
        children
            .binary_search_by_key(&symbol, |&(s, _)| s)
            .ok()
            .map(|i| children[i].1)
    }

    fn insert(&mut self, word: &[SymbolId]) {
        let mut node = 0usize;
        for &symbol in word {
            let next_id = self.nodes.len() as u32;
            let children = &mut self.nodes[node].children;
            node = match children.binary_search_by_key(&symbol, |&(s, _)| s) {
                Ok(i) => children[i].1 as usize,
                Err(i) => {
                    children.insert(i, (symbol, next_id));
                    self.nodes.push(TrieNode::default());
                    next_id as usize
                }
            };
        }
        if !self.nodes[node].word_end {
            self.nodes[node].word_end = true;
            self.words += 1;
        }
    }
}

/// Dictionary built from plain word lists.
///
/// Each call to [`add_words`](Self::add_words) adds one trie tagged with
/// its own permuter, so system and user vocabularies can be told apart
/// in the decoded output.
#[derive(Debug, Clone, Default)]
pub struct WordListDictionary {
    pub(super) dawgs: Vec<WordTrie>,
}

impl WordListDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<'a>(
        symbols: &SymbolSet,
        words: impl IntoIterator<Item = &'a str>,
        permuter: Permuter,
    ) -> Result<Self, DictError> {
        let mut dict = Self::new();
        dict.add_words(symbols, words, permuter)?;
        Ok(dict)
    }

    /// Add a word source. Words are split into symbols by longest match;
    /// blank entries are ignored. Returns the number of distinct words added.
    pub fn add_words<'a>(
        &mut self,
        symbols: &SymbolSet,
        words: impl IntoIterator<Item = &'a str>,
        permuter: Permuter,
    ) -> Result<u32, DictError> {
        let mut trie = WordTrie::new(permuter);
        for word in words {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            let ids = symbols
                .tokenize(word)
                .filter(|ids| !ids.iter().any(|&id| symbols.is_space(id)))
                .ok_or_else(|| DictError::UnknownSymbol {
                    word: word.to_string(),
                })?;
            trie.insert(&ids);
        }
        debug!(
            permuter = permuter.as_str(),
            words = trie.words,
            nodes = trie.nodes.len()
        );
        let added = trie.words;
        self.dawgs.push(trie);
        Ok(added)
    }

    /// Whether `word` is a complete word in any source.
    pub fn contains_word(&self, word: &[SymbolId]) -> bool {
        self.dawgs.iter().any(|trie| {
            let mut node = 0u32;
            for &symbol in word {
                match trie.child(node, symbol) {
                    Some(next) => node = next,
                    None => return false,
                }
            }
            trie.nodes[node as usize].word_end
        })
    }

    pub fn dawg_count(&self) -> usize {
        self.dawgs.len()
    }

    /// Returns (word_count, node_count) over all sources.
    pub fn stats(&self) -> (usize, usize) {
        let words = self.dawgs.iter().map(|t| t.words as usize).sum();
        let nodes = self.dawgs.iter().map(|t| t.nodes.len()).sum();
        (words, nodes)
    }
}

impl Dictionary for WordListDictionary {
    fn default_positions(&self) -> DictState {
        DictState::new(
            (0..self.dawgs.len())
                .map(|d| DawgPosition {
                    dawg: d as u16,
                    node: 0,
                })
                .collect(),
        )
    }

    fn letter_is_okay(&self, state: &DictState, symbol: SymbolId) -> Option<DawgStep> {
        let mut positions = Vec::new();
        let mut best: Option<Permuter> = None;
        let mut best_end: Option<Permuter> = None;
        for pos in state.positions() {
            let Some(trie) = self.dawgs.get(pos.dawg as usize) else {
                continue;
            };
            let Some(child) = trie.child(pos.node, symbol) else {
                continue;
            };
            positions.push(DawgPosition {
                dawg: pos.dawg,
                node: child,
            });
            best = best.max(Some(trie.permuter));
            if trie.nodes[child as usize].word_end {
                best_end = best_end.max(Some(trie.permuter));
            }
        }
        let permuter = best_end.or(best)?;
        Some(DawgStep {
            permuter,
            valid_end: best_end.is_some(),
            state: DictState::new(positions),
        })
    }
}
