//! Ordered registry of recognizable symbols.

use std::collections::HashMap;

use crate::unicode::{is_space_delimited_script, normalize_symbol, script_of_str, Script};

/// Index of a symbol in a `SymbolSet`.
pub type SymbolId = u32;

#[derive(Debug, Clone)]
struct SymbolInfo {
    text: String,
    normalized: String,
    script: Script,
    enabled: bool,
}

/// Id ↔ text registry plus the per-symbol properties the decoder consults.
///
/// The space symbol is whichever entry has the text `" "`, if any.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    symbols: Vec<SymbolInfo>,
    ids: HashMap<String, SymbolId>,
    space: Option<SymbolId>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from symbol texts in id order. Duplicate texts keep the first id.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for t in texts {
            set.insert(t);
        }
        set
    }

    /// Insert a symbol, returning its id. Existing text returns the existing id.
    pub fn insert(&mut self, text: impl Into<String>) -> SymbolId {
        let text = text.into();
        if let Some(&id) = self.ids.get(&text) {
            return id;
        }
        let id = self.symbols.len() as SymbolId;
        if text == " " {
            self.space = Some(id);
        }
        self.symbols.push(SymbolInfo {
            normalized: normalize_symbol(&text),
            script: script_of_str(&text),
            text: text.clone(),
            enabled: true,
        });
        self.ids.insert(text, id);
        id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        (id as usize) < self.symbols.len()
    }

    pub fn id_of(&self, text: &str) -> Option<SymbolId> {
        self.ids.get(text).copied()
    }

    pub fn text(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id as usize).map(|s| s.text.as_str())
    }

    /// Normalized text, see [`normalize_symbol`].
    pub fn normalized(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id as usize).map(|s| s.normalized.as_str())
    }

    pub fn script(&self, id: SymbolId) -> Script {
        self.symbols
            .get(id as usize)
            .map(|s| s.script)
            .unwrap_or(Script::Other)
    }

    pub fn space(&self) -> Option<SymbolId> {
        self.space
    }

    pub fn is_space(&self, id: SymbolId) -> bool {
        self.space == Some(id)
    }

    /// Whether this symbol is normally separated from its neighbours by spaces.
    /// Unknown ids count as space-delimited.
    pub fn is_space_delimited(&self, id: SymbolId) -> bool {
        is_space_delimited_script(self.script(id))
    }

    /// Whether the language as a whole separates words with spaces.
    ///
    /// Any Han, Katakana or Thai symbol makes the whole set non-space-delimited.
    pub fn is_space_delimited_lang(&self) -> bool {
        !self
            .symbols
            .iter()
            .any(|s| matches!(s.script, Script::Han | Script::Katakana | Script::Thai))
    }

    pub fn is_enabled(&self, id: SymbolId) -> bool {
        self.symbols
            .get(id as usize)
            .map(|s| s.enabled)
            .unwrap_or(false)
    }

    pub fn set_enabled(&mut self, id: SymbolId, enabled: bool) {
        if let Some(s) = self.symbols.get_mut(id as usize) {
            s.enabled = enabled;
        }
    }

    /// Enable only the symbols whose text consists of characters in `whitelist`
    /// (plus the space). An empty whitelist re-enables everything.
    pub fn restrict_to(&mut self, whitelist: &str) {
        for s in &mut self.symbols {
            s.enabled = whitelist.is_empty()
                || s.text == " "
                || s.text.chars().all(|c| whitelist.contains(c));
        }
    }

    /// Disable every symbol containing a character in `blacklist`.
    pub fn disable_chars(&mut self, blacklist: &str) {
        for s in &mut self.symbols {
            if s.text.chars().any(|c| blacklist.contains(c)) {
                s.enabled = false;
            }
        }
    }

    /// Concatenate the text of a symbol-id sequence. Unknown ids are skipped.
    pub fn render(&self, ids: &[SymbolId]) -> String {
        ids.iter().filter_map(|&id| self.text(id)).collect()
    }

    /// Split `text` into symbol ids, preferring the longest symbol at each
    /// position. Returns `None` if some part of `text` matches no symbol.
    pub fn tokenize(&self, text: &str) -> Option<Vec<SymbolId>> {
        let max_chars = self
            .symbols
            .iter()
            .map(|s| s.text.chars().count())
            .max()
            .unwrap_or(0);
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut ids = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let start = chars[i].0;
            let found = (1..=max_chars.min(chars.len() - i)).rev().find_map(|n| {
                let end = chars.get(i + n).map_or(text.len(), |&(b, _)| b);
                self.id_of(&text[start..end]).map(|id| (id, n))
            });
            let (id, n) = found?;
            ids.push(id);
            i += n;
        }
        Some(ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &str)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (i as SymbolId, s.text.as_str()))
    }

    /// One symbol per line, in id order. A line holding a single space is the
    /// space symbol; blank lines are skipped.
    pub fn parse_lines(content: &str) -> Self {
        let mut set = Self::new();
        for line in content.lines() {
            if line == " " {
                set.insert(" ");
                continue;
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                set.insert(trimmed);
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let set = SymbolSet::from_texts([" ", "a", "b", "a"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.space(), Some(0));
        assert_eq!(set.id_of("b"), Some(2));
        assert_eq!(set.text(1), Some("a"));
        assert_eq!(set.text(9), None);
        assert_eq!(set.render(&[1, 0, 2]), "a b");
    }

    #[test]
    fn test_no_space() {
        let set = SymbolSet::from_texts(["a", "b"]);
        assert_eq!(set.space(), None);
        assert!(!set.is_space(0));
    }

    #[test]
    fn test_space_delimited() {
        let set = SymbolSet::from_texts(["a", "漢", "한"]);
        assert!(set.is_space_delimited(0));
        assert!(!set.is_space_delimited(1));
        assert!(!set.is_space_delimited(2));
        assert!(set.is_space_delimited(42));
        assert!(!set.is_space_delimited_lang());

        let korean = SymbolSet::from_texts([" ", "한", "국"]);
        assert!(korean.is_space_delimited_lang());
    }

    #[test]
    fn test_whitelist_and_blacklist() {
        let mut set = SymbolSet::from_texts([" ", "a", "b", "1"]);
        set.restrict_to("ab");
        assert!(set.is_enabled(0));
        assert!(set.is_enabled(1));
        assert!(!set.is_enabled(3));

        set.restrict_to("");
        assert!(set.is_enabled(3));
        set.disable_chars("b");
        assert!(!set.is_enabled(2));
        assert!(set.is_enabled(1));
    }

    #[test]
    fn test_tokenize_longest_match() {
        let set = SymbolSet::from_texts([" ", "f", "i", "fi", "x"]);
        assert_eq!(set.tokenize("fix"), Some(vec![3, 4]));
        assert_eq!(set.tokenize("if i"), Some(vec![2, 1, 0, 2]));
        assert_eq!(set.tokenize(""), Some(vec![]));
        assert_eq!(set.tokenize("fz"), None);
    }

    #[test]
    fn test_parse_lines() {
        let set = SymbolSet::parse_lines(" \na\n\nb\r\n");
        assert_eq!(set.len(), 3);
        assert_eq!(set.space(), Some(0));
        assert_eq!(set.id_of("b"), Some(2));
    }

    #[test]
    fn test_normalized() {
        let set = SymbolSet::from_texts(["'", "\u{2019}"]);
        assert_eq!(set.normalized(1), Some("'"));
        assert_eq!(set.normalized(0), Some("'"));
    }
}
