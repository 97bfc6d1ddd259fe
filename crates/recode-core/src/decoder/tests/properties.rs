use proptest::prelude::*;

use super::*;
use crate::decoder::{BoundingBox, NodeContinuation, RecodeBeamSearch};
use crate::dict::{Permuter, WordListDictionary};
use crate::settings::{DecoderSettings, NUM_LENGTHS};

const TEXTS: [&str; 6] = [" ", "a", "b", "l", "ll", "가"];

fn mixed() -> (SymbolSet, Recoder, WordListDictionary) {
    let symbols = SymbolSet::from_texts(TEXTS);
    let recoder = Recoder::compute_encoding(&symbols, Some(TEXTS.len() as u32), None).unwrap();
    let dict = WordListDictionary::from_words(
        &symbols,
        ["ab", "ba", "all", "가", "bll"],
        Permuter::SystemWord,
    )
    .unwrap();
    (symbols, recoder, dict)
}

fn arb_outputs() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(0.0f32..1.0, 12), 0..10)
}

proptest! {
    #[test]
    fn prop_buckets_stay_within_width(outputs in arb_outputs(), width in 1usize..4) {
        let (symbols, recoder, dict) = mixed();
        let settings = DecoderSettings::default().with_uniform_width(width);
        let mut search = RecodeBeamSearch::new(&recoder, &symbols, Some(&dict), settings);
        let range = recoder.code_range() as usize;
        for row in &outputs {
            search.decode_step(&row[..range]);
            let t = search.num_timesteps() - 1;
            for is_dawg in [false, true] {
                for cont in NodeContinuation::ALL {
                    for length in 0..NUM_LENGTHS {
                        prop_assert!(search.bucket_len(t, is_dawg, cont, length) <= width);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_extraction_is_idempotent(outputs in arb_outputs()) {
        let (symbols, recoder, dict) = mixed();
        let mut search =
            RecodeBeamSearch::new(&recoder, &symbols, Some(&dict), DecoderSettings::default());
        search.decode(&outputs);

        prop_assert_eq!(search.best_path(), search.best_path());
        prop_assert_eq!(search.second_path(), search.second_path());
        prop_assert_eq!(search.best_labels(), search.best_labels());
        let line = BoundingBox { left: 0, top: 0, right: 100, bottom: 10 };
        prop_assert_eq!(search.extract_words(line, 2.5), search.extract_words(line, 2.5));
    }

    #[test]
    fn prop_best_path_is_well_formed(outputs in arb_outputs()) {
        let (symbols, recoder, dict) = mixed();
        let mut search =
            RecodeBeamSearch::new(&recoder, &symbols, Some(&dict), DecoderSettings::default());
        search.decode(&outputs);
        let path = search.best_path();

        prop_assert_eq!(path.width, outputs.len());
        prop_assert_eq!(path.score.is_some(), !outputs.is_empty());
        prop_assert_eq!(path.certainties.len(), path.len());
        prop_assert_eq!(path.ratings.len(), path.len());
        prop_assert_eq!(path.timesteps.len(), path.len());
        prop_assert!(path.symbols.iter().all(|&s| symbols.contains(s)));
        prop_assert!(path.timesteps.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(path.timesteps.iter().all(|&t| t < path.width));

        let bounds = &path.char_boundaries;
        prop_assert_eq!(bounds.len(), path.len() + 1);
        prop_assert_eq!(bounds.last().copied(), Some(path.width));
        prop_assert!(bounds.windows(2).all(|w| w[0] <= w[1]));

        let labels = search.best_labels();
        prop_assert!(labels.iter().all(|&(code, _)| Some(code) != recoder.null_code()));
    }
}

#[test]
fn test_wider_beam_finds_dictionary_word() {
    let (symbols, recoder) = pass_through(&["a", "b"]);
    let dict = WordListDictionary::from_words(&symbols, ["ab", "ba"], Permuter::SystemWord)
        .unwrap();
    let outputs = vec![vec![0.5, 0.45, 0.05], vec![0.9, 0.05, 0.05]];

    let narrow = DecoderSettings::default().with_uniform_width(1);
    let mut search = RecodeBeamSearch::new(&recoder, &symbols, Some(&dict), narrow);
    search.decode(&outputs);
    let narrow_best = search.best_path();
    assert_eq!(narrow_best.text(&symbols), "a");

    let mut search =
        RecodeBeamSearch::new(&recoder, &symbols, Some(&dict), DecoderSettings::default());
    search.decode(&outputs);
    let wide_best = search.best_path();
    assert_eq!(wide_best.text(&symbols), "ba");
    assert!(wide_best.score > narrow_best.score);
}
