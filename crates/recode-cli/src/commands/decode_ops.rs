use std::fs;
use std::path::Path;

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use recode_core::decoder::{format_text, BoundingBox, DecodedPath, DecodedWord, RecodeBeamSearch};
use recode_core::dict::{Dictionary, WordListDictionary};
use recode_core::recoder::Recoder;
use recode_core::settings::{default_toml, parse_settings_toml};

use super::{die, load_symbols};

pub struct DecodeOptions<'a> {
    pub recoder: Option<&'a str>,
    pub dict: Option<&'a str>,
    pub settings: Option<&'a str>,
    pub json: bool,
    pub words: bool,
    pub explain: bool,
    /// Line-box units per timestep, for word boxes.
    pub scale: f32,
}

#[derive(Serialize)]
struct DecodeReport<'a> {
    text: String,
    path: &'a DecodedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    second: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    words: Vec<DecodedWord>,
}

/// Decode a JSON matrix (`[[p_class0, p_class1, ...], ...]`, one row per
/// timestep) and print the best path.
pub fn decode(symbols_file: &str, matrix_file: &str, opts: &DecodeOptions) {
    let mut symbols = load_symbols(symbols_file);
    let settings_toml = match opts.settings {
        Some(file) => die!(fs::read_to_string(file), "Error reading {file}: {}"),
        None => default_toml().to_string(),
    };
    let settings = die!(parse_settings_toml(&settings_toml), "Error in settings: {}");
    settings.symbols.apply(&mut symbols);

    let recoder = match opts.recoder {
        Some(file) => die!(Recoder::open(Path::new(file)), "Error opening recoder: {}"),
        None => Recoder::pass_through(&symbols),
    };
    let dict = opts.dict.map(|file| {
        die!(
            WordListDictionary::open(Path::new(file)),
            "Error opening dictionary: {}"
        )
    });

    let content = die!(fs::read_to_string(matrix_file), "Error reading {matrix_file}: {}");
    let outputs: Vec<Vec<f32>> = die!(serde_json::from_str(&content), "Error parsing matrix: {}");
    let range = recoder.code_range() as usize;
    if let Some(t) = outputs.iter().position(|row| row.len() < range) {
        eprintln!(
            "Warning: row {t} has fewer than {range} classes; missing classes count as 0"
        );
    }

    let mut search = RecodeBeamSearch::new(
        &recoder,
        &symbols,
        dict.as_ref().map(|d| d as &dyn Dictionary),
        settings.decoder(),
    );
    search.decode(&outputs);

    if opts.explain {
        let result = search.explain();
        if opts.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).expect("JSON serialization failed")
            );
        } else {
            print!("{}", format_text(&result));
        }
        return;
    }

    let best = search.best_path();
    let line = BoundingBox {
        left: 0,
        top: 0,
        right: (outputs.len() as f32 * opts.scale).ceil() as i32,
        bottom: 0,
    };
    let words = if opts.words {
        search.extract_words(line, opts.scale)
    } else {
        Vec::new()
    };

    if opts.json {
        let report = DecodeReport {
            text: best.text(&symbols),
            path: &best,
            second: search.second_path().map(|p| p.text(&symbols)),
            words,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("JSON serialization failed")
        );
        return;
    }

    match best.score {
        Some(score) => println!("{}  (score={score:.4})", best.text(&symbols)),
        None => println!("(empty)"),
    }
    for w in &words {
        let pad_width = 16;
        let display_width = UnicodeWidthStr::width(w.text.as_str());
        let padded = if display_width < pad_width {
            format!("{}{}", w.text, " ".repeat(pad_width - display_width))
        } else {
            w.text.clone()
        };
        println!(
            "  {} cert={:<9.4} space={:<9.4} x={}..{} {}",
            padded,
            w.certainty,
            w.space_certainty,
            w.bounding_box.left,
            w.bounding_box.right,
            w.permuter.as_str(),
        );
    }
}
