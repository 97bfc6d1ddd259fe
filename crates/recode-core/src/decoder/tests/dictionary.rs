use super::*;
use crate::decoder::{BoundingBox, NodeContinuation, RecodeBeamSearch};
use crate::dict::{Permuter, WordListDictionary};
use crate::settings::DecoderSettings;

const TEXTS: [&str; 5] = [" ", "c", "a", "t", "o"];
const CLASSES: usize = TEXTS.len() + 1;

fn dict(symbols: &SymbolSet, words: &[&str]) -> WordListDictionary {
    WordListDictionary::from_words(symbols, words.iter().copied(), Permuter::SystemWord).unwrap()
}

/// "ca" followed by a timestep where `t` and `o` compete.
fn ambiguous_tail(symbols: &SymbolSet, p_t: f32, p_o: f32) -> Vec<Vec<f32>> {
    let mut outputs = rows(CLASSES, &spell(symbols, "ca"));
    let t = symbols.id_of("t").unwrap() as usize;
    let o = symbols.id_of("o").unwrap() as usize;
    let rest = (1.0 - p_t - p_o) / (CLASSES - 2) as f32;
    let mut last = vec![rest; CLASSES];
    last[t] = p_t;
    last[o] = p_o;
    outputs.push(last);
    outputs
}

#[test]
fn test_dictionary_word_beats_freeform() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let words = dict(&symbols, &["cat"]);
    let outputs = ambiguous_tail(&symbols, 0.40, 0.45);

    let mut plain = RecodeBeamSearch::new(&recoder, &symbols, None, DecoderSettings::default());
    plain.decode(&outputs);
    assert_eq!(plain.best_path().text(&symbols), "cao");

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    assert!(search.has_dictionary());
    search.decode(&outputs);
    assert_eq!(search.best_path().text(&symbols), "cat");

    let found = search.extract_words(BoundingBox::default(), 1.0);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "cat");
    assert_eq!(found[0].permuter, Permuter::SystemWord);
}

#[test]
fn test_rejected_letter_falls_back_to_freeform() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let words = dict(&symbols, &["cat"]);
    let outputs = rows(CLASSES, &spell(&symbols, "cao"));

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    search.decode(&outputs);
    assert_eq!(search.best_path().text(&symbols), "cao");
    let found = search.extract_words(BoundingBox::default(), 1.0);
    assert_eq!(found[0].permuter, Permuter::TopChoice);
}

#[test]
fn test_unfinished_word_is_not_a_terminal() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let words = dict(&symbols, &["cato"]);
    let outputs = rows(CLASSES, &spell(&symbols, "cat"));

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    search.decode(&outputs);
    // The dictionary path is alive but ends mid-word.
    assert!(search.bucket_len(2, true, NodeContinuation::Anything, 0) > 0);
    assert_eq!(search.best_path().text(&symbols), "cat");
    let found = search.extract_words(BoundingBox::default(), 1.0);
    assert_eq!(found[0].permuter, Permuter::TopChoice);
}

#[test]
fn test_words_restart_after_space() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let words = dict(&symbols, &["cat", "to"]);
    let outputs = rows(CLASSES, &spell(&symbols, "cat to"));

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    search.decode(&outputs);
    assert_eq!(search.best_path().text(&symbols), "cat to");

    let found = search.extract_words(BoundingBox::default(), 1.0);
    let texts: Vec<&str> = found.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["cat", "to"]);
    assert!(found.iter().all(|w| w.permuter == Permuter::SystemWord));
    assert!(found[1].leading_space);
}

#[test]
fn test_user_words_outrank_system_words() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let mut words = dict(&symbols, &["cat"]);
    words
        .add_words(&symbols, ["cat"], Permuter::UserWord)
        .unwrap();
    let outputs = rows(CLASSES, &spell(&symbols, "cat"));

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    search.decode(&outputs);
    let found = search.extract_words(BoundingBox::default(), 1.0);
    assert_eq!(found[0].permuter, Permuter::UserWord);
}

#[test]
fn test_dictionary_improves_score() {
    let (symbols, recoder) = pass_through(&TEXTS);
    let words = dict(&symbols, &["cat"]);
    let outputs = rows(CLASSES, &spell(&symbols, "cat"));

    let mut plain = RecodeBeamSearch::new(&recoder, &symbols, None, DecoderSettings::default());
    plain.decode(&outputs);
    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&words), DecoderSettings::default());
    search.decode(&outputs);

    // Freeform certainties are scaled down by the dictionary ratio.
    assert!(search.best_path().score > plain.best_path().score);
}
