use std::fs;
use std::path::Path;

use recode_core::dict::WordListDictionary;
use recode_core::recoder::{parse_radical_table, Recoder};
use recode_core::symbols::SymbolSet;

use super::{die, load_symbols};

pub fn encode(symbols_file: &str, output_file: &str, radicals: Option<&str>, no_null: bool) {
    let symbols = load_symbols(symbols_file);
    let table = radicals.map(|file| {
        let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
        die!(parse_radical_table(&content), "Error parsing radical table: {}")
    });
    let null = (!no_null).then_some(symbols.len() as u32);

    let recoder = die!(
        Recoder::compute_encoding(&symbols, null, table.as_ref()),
        "Error computing encoding: {}"
    );
    die!(
        recoder.save(Path::new(output_file)),
        "Error writing recoder: {}"
    );

    let longest = recoder.codes().iter().map(|c| c.len()).max().unwrap_or(0);
    eprintln!(
        "Wrote {output_file}: {} symbols, code range {}, longest code {longest}",
        recoder.len(),
        recoder.code_range(),
    );
}

/// Describe a recoder (`RCDR`) or dictionary (`RCWD`) file, picked by magic.
pub fn info(file: &str, symbols_file: Option<&str>) {
    let data = die!(fs::read(file), "Error reading {file}: {}");
    match data.get(..4) {
        Some(b"RCDR") => {
            let recoder = die!(Recoder::from_bytes(&data), "Error: {}");
            println!("Recoder: {file}");
            println!("  symbols:    {}", recoder.len());
            println!("  code range: {}", recoder.code_range());
            match recoder.null_code() {
                Some(null) => println!("  null code:  {null}"),
                None => println!("  null code:  (none)"),
            }
            let symbols = symbols_file.map(load_symbols).unwrap_or_else(SymbolSet::new);
            print!("{}", recoder.encoding_as_string(&symbols));
        }
        Some(b"RCWD") => {
            let dict = die!(WordListDictionary::from_bytes(&data), "Error: {}");
            let (words, nodes) = dict.stats();
            println!("Dictionary: {file}");
            println!("  sources: {}", dict.dawg_count());
            println!("  words:   {words}");
            println!("  nodes:   {nodes}");
        }
        _ => {
            eprintln!("Error: {file} is neither a recoder nor a dictionary file");
            std::process::exit(1);
        }
    }
}
