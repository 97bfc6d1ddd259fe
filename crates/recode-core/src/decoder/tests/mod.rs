mod dictionary;
mod properties;

use crate::recoder::Recoder;
use crate::symbols::SymbolSet;

/// Symbols plus a pass-through recoder whose null class is `symbols.len()`.
fn pass_through(texts: &[&str]) -> (SymbolSet, Recoder) {
    let symbols = SymbolSet::from_texts(texts.iter().copied());
    let recoder = Recoder::pass_through(&symbols);
    (symbols, recoder)
}

/// Probability row putting `p` on `class` and spreading the rest evenly.
fn peaked(num_classes: usize, class: u32, p: f32) -> Vec<f32> {
    let rest = (1.0 - p) / (num_classes - 1) as f32;
    (0..num_classes)
        .map(|c| if c == class as usize { p } else { rest })
        .collect()
}

/// One row per class, each peaked at 0.9.
fn rows(num_classes: usize, classes: &[u32]) -> Vec<Vec<f32>> {
    classes.iter().map(|&c| peaked(num_classes, c, 0.9)).collect()
}

/// Class sequence spelling `text` with a pass-through recoder.
fn spell(symbols: &SymbolSet, text: &str) -> Vec<u32> {
    symbols.tokenize(text).unwrap()
}
