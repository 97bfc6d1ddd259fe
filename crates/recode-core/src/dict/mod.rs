//! Dictionary oracle used to bias the beam search toward known words.
//!
//! The decoder only talks to the [`Dictionary`] trait: it starts words from
//! [`Dictionary::default_positions`] and advances them one symbol at a time
//! with [`Dictionary::letter_is_okay`]. `WordListDictionary` is the bundled
//! implementation, a set of symbol-id tries (one per word source).

mod word_list;
mod word_list_io;

pub use word_list::WordListDictionary;

use std::io;

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Errors raised while building or loading a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected RCWD)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("word {word:?} contains text outside the symbol set")]
    UnknownSymbol { word: String },
}

/// Which scoring regime produced an accepted symbol.
///
/// Ordered by strength: when several word sources accept the same letter
/// the greatest permuter wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permuter {
    /// No regime; also marks a space that merely separates words.
    None,
    /// Freeform path: the network's top choice without dictionary help.
    TopChoice,
    SystemWord,
    UserWord,
}

impl Permuter {
    pub fn as_str(self) -> &'static str {
        match self {
            Permuter::None => "none",
            Permuter::TopChoice => "top_choice",
            Permuter::SystemWord => "system_word",
            Permuter::UserWord => "user_word",
        }
    }
}

/// A position inside one of the dictionary's automata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DawgPosition {
    pub dawg: u16,
    pub node: u32,
}

/// The set of automaton positions a partial word is in.
///
/// Owned by exactly one lattice node; it is moved, never cloned, as the
/// hypothesis that carries it advances.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DictState {
    positions: Vec<DawgPosition>,
}

impl DictState {
    pub fn new(positions: Vec<DawgPosition>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[DawgPosition] {
        &self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Result of an accepted letter.
#[derive(Debug)]
pub struct DawgStep {
    pub permuter: Permuter,
    /// The letters so far form a complete word.
    pub valid_end: bool,
    /// Positions after consuming the letter.
    pub state: DictState,
}

pub trait Dictionary {
    /// Positions at which every new word starts.
    fn default_positions(&self) -> DictState;

    /// Advance `state` by `symbol`. `None` rejects the letter.
    fn letter_is_okay(&self, state: &DictState, symbol: SymbolId) -> Option<DawgStep>;
}
