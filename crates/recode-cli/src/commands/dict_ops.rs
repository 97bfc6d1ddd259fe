use std::fs;
use std::path::Path;

use recode_core::dict::{Permuter, WordListDictionary};

use super::{die, load_symbols};

/// Compile word lists (one word per line) into a dictionary. Each list
/// becomes its own source.
pub fn compile(symbols_file: &str, system: &[String], user: &[String], output_file: &str) {
    let symbols = load_symbols(symbols_file);
    let mut dict = WordListDictionary::new();

    let sources = system
        .iter()
        .map(|f| (f, Permuter::SystemWord))
        .chain(user.iter().map(|f| (f, Permuter::UserWord)));
    for (file, permuter) in sources {
        let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
        let added = die!(
            dict.add_words(&symbols, content.lines(), permuter),
            "Error in {file}: {}"
        );
        eprintln!("{file}: {added} {} words", permuter.as_str());
    }

    die!(
        dict.save(Path::new(output_file)),
        "Error writing dictionary: {}"
    );
    let (words, nodes) = dict.stats();
    eprintln!("Wrote {output_file} ({words} words, {nodes} nodes)");
}
